//! `SQLite` result codes.
//!
//! [`ErrorCondition`] mirrors the *primary* result codes and [`ErrorCode`]
//! the *extended* result codes (every primary code is also a valid extended
//! code). Each extended code rolls up to exactly one condition, so callers
//! can match either on the precise failure or on its coarse category. See
//! <https://sqlite.org/rescode.html> for the engine's own documentation.

use std::fmt;

use strum::{EnumIter, FromRepr, IntoStaticStr};

use crate::ffi;

/// Primary result codes: the coarse category of an engine outcome.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromRepr, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[repr(i32)]
#[allow(missing_docs)]
pub enum ErrorCondition {
    Ok = 0,
    Error = 1,
    Internal = 2,
    Perm = 3,
    Abort = 4,
    Busy = 5,
    Locked = 6,
    NoMemory = 7,
    ReadOnly = 8,
    Interrupt = 9,
    IoErr = 10,
    Corrupt = 11,
    NotFound = 12,
    Full = 13,
    CantOpen = 14,
    Protocol = 15,
    Empty = 16,
    Schema = 17,
    TooBig = 18,
    Constraint = 19,
    Mismatch = 20,
    Misuse = 21,
    NoLfs = 22,
    Auth = 23,
    Format = 24,
    Range = 25,
    NotADatabase = 26,
    Notice = 27,
    Warning = 28,
    Row = 100,
    Done = 101,
}

/// Extended result codes: the exact engine outcome.
///
/// Extended codes that this enumeration does not know about are folded into
/// their primary code by [`ErrorCode::from_raw`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromRepr, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[repr(i32)]
#[allow(missing_docs)]
pub enum ErrorCode {
    // The primary codes are also extended codes.
    Ok = 0,
    Error = 1,
    Internal = 2,
    Perm = 3,
    Abort = 4,
    Busy = 5,
    Locked = 6,
    NoMemory = 7,
    ReadOnly = 8,
    Interrupt = 9,
    IoErr = 10,
    Corrupt = 11,
    NotFound = 12,
    Full = 13,
    CantOpen = 14,
    Protocol = 15,
    Empty = 16,
    Schema = 17,
    TooBig = 18,
    Constraint = 19,
    Mismatch = 20,
    Misuse = 21,
    NoLfs = 22,
    Auth = 23,
    Format = 24,
    Range = 25,
    NotADatabase = 26,
    Notice = 27,
    Warning = 28,
    Row = 100,
    Done = 101,

    AbortRollback = 516,
    BusyRecovery = 261,
    BusySnapshot = 517,
    BusyTimeout = 773,
    CantOpenNoTempDirectory = 270,
    CantOpenIsDirectory = 526,
    CantOpenFullPath = 782,
    CantOpenConvertPath = 1038,
    ConstraintCheck = 275,
    ConstraintCommitHook = 531,
    ConstraintForeignKey = 787,
    ConstraintFunction = 1043,
    ConstraintNotNull = 1299,
    ConstraintPrimaryKey = 1555,
    ConstraintTrigger = 1811,
    ConstraintUnique = 2067,
    ConstraintVtab = 2323,
    ConstraintRowId = 2579,
    ConstraintDataType = 3091,
    CorruptVtab = 267,
    CorruptSequence = 523,
    CorruptIndex = 779,
    IoErrRead = 266,
    IoErrShortRead = 522,
    IoErrWrite = 778,
    IoErrFsync = 1034,
    IoErrDirFsync = 1290,
    IoErrTruncate = 1546,
    IoErrFstat = 1802,
    IoErrUnlock = 2058,
    IoErrRdLock = 2314,
    IoErrDelete = 2570,
    IoErrBlocked = 2826,
    IoErrNoMem = 3082,
    IoErrAccess = 3338,
    IoErrCheckReservedLock = 3594,
    IoErrLock = 3850,
    IoErrClose = 4106,
    IoErrDirClose = 4362,
    IoErrShmOpen = 4618,
    IoErrShmSize = 4874,
    IoErrShmLock = 5130,
    IoErrShmMap = 5386,
    IoErrSeek = 5642,
    IoErrDeleteNoEnt = 5898,
    IoErrMmap = 6154,
    IoErrGetTempPath = 6410,
    IoErrConvertPath = 6666,
    LockedSharedCache = 262,
    LockedVtab = 518,
    NoticeRecoverWal = 283,
    NoticeRecoverRollback = 539,
    ReadOnlyRecovery = 264,
    ReadOnlyCantLock = 520,
    ReadOnlyRollback = 776,
    ReadOnlyDbMoved = 1032,
    ReadOnlyCantInit = 1288,
    ReadOnlyDirectory = 1544,
    WarningAutoIndex = 284,
}

impl ErrorCondition {
    /// Returns the raw integer value of this condition.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self as i32
    }

    /// `false` only for `ok`, `row` and `done`.
    #[must_use]
    pub const fn is_error(self) -> bool {
        !matches!(self, Self::Ok | Self::Row | Self::Done)
    }
}

impl ErrorCode {
    /// Interprets a raw engine result code.
    ///
    /// Unknown extended codes degrade to their primary code rather than to an
    /// unrelated value.
    #[must_use]
    pub fn from_raw(raw: i32) -> Self {
        Self::from_repr(raw).unwrap_or_else(|| {
            ErrorCondition::from_repr(raw & 0xff).map_or(Self::Error, Self::from)
        })
    }

    /// Returns the raw integer value of this code.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self as i32
    }

    /// `false` only for `ok`, `row` and `done`.
    #[must_use]
    pub const fn is_error(self) -> bool {
        !matches!(self, Self::Ok | Self::Row | Self::Done)
    }

    /// The engine's static English description of this code.
    #[must_use]
    pub fn message(self) -> &'static str {
        ffi::errstr(self.raw())
    }

    /// The primary condition this code belongs to.
    #[must_use]
    pub const fn condition(self) -> ErrorCondition {
        use ErrorCondition as C;
        match self {
            Self::Ok => C::Ok,
            Self::Error => C::Error,
            Self::Internal => C::Internal,
            Self::Perm => C::Perm,
            Self::Abort | Self::AbortRollback => C::Abort,
            Self::Busy | Self::BusyRecovery | Self::BusySnapshot | Self::BusyTimeout => C::Busy,
            Self::Locked | Self::LockedSharedCache | Self::LockedVtab => C::Locked,
            Self::NoMemory => C::NoMemory,
            Self::ReadOnly
            | Self::ReadOnlyRecovery
            | Self::ReadOnlyCantLock
            | Self::ReadOnlyRollback
            | Self::ReadOnlyDbMoved
            | Self::ReadOnlyCantInit
            | Self::ReadOnlyDirectory => C::ReadOnly,
            Self::Interrupt => C::Interrupt,
            Self::IoErr
            | Self::IoErrRead
            | Self::IoErrShortRead
            | Self::IoErrWrite
            | Self::IoErrFsync
            | Self::IoErrDirFsync
            | Self::IoErrTruncate
            | Self::IoErrFstat
            | Self::IoErrUnlock
            | Self::IoErrRdLock
            | Self::IoErrDelete
            | Self::IoErrBlocked
            | Self::IoErrNoMem
            | Self::IoErrAccess
            | Self::IoErrCheckReservedLock
            | Self::IoErrLock
            | Self::IoErrClose
            | Self::IoErrDirClose
            | Self::IoErrShmOpen
            | Self::IoErrShmSize
            | Self::IoErrShmLock
            | Self::IoErrShmMap
            | Self::IoErrSeek
            | Self::IoErrDeleteNoEnt
            | Self::IoErrMmap
            | Self::IoErrGetTempPath
            | Self::IoErrConvertPath => C::IoErr,
            Self::Corrupt | Self::CorruptVtab | Self::CorruptSequence | Self::CorruptIndex => {
                C::Corrupt
            }
            Self::NotFound => C::NotFound,
            Self::Full => C::Full,
            Self::CantOpen
            | Self::CantOpenNoTempDirectory
            | Self::CantOpenIsDirectory
            | Self::CantOpenFullPath
            | Self::CantOpenConvertPath => C::CantOpen,
            Self::Protocol => C::Protocol,
            Self::Empty => C::Empty,
            Self::Schema => C::Schema,
            Self::TooBig => C::TooBig,
            Self::Constraint
            | Self::ConstraintCheck
            | Self::ConstraintCommitHook
            | Self::ConstraintForeignKey
            | Self::ConstraintFunction
            | Self::ConstraintNotNull
            | Self::ConstraintPrimaryKey
            | Self::ConstraintTrigger
            | Self::ConstraintUnique
            | Self::ConstraintVtab
            | Self::ConstraintRowId
            | Self::ConstraintDataType => C::Constraint,
            Self::Mismatch => C::Mismatch,
            Self::Misuse => C::Misuse,
            Self::NoLfs => C::NoLfs,
            Self::Auth => C::Auth,
            Self::Format => C::Format,
            Self::Range => C::Range,
            Self::NotADatabase => C::NotADatabase,
            Self::Notice | Self::NoticeRecoverWal | Self::NoticeRecoverRollback => C::Notice,
            Self::Warning | Self::WarningAutoIndex => C::Warning,
            Self::Row => C::Row,
            Self::Done => C::Done,
        }
    }
}

impl From<ErrorCondition> for ErrorCode {
    fn from(cond: ErrorCondition) -> Self {
        // Every primary value is also an extended value.
        Self::from_repr(cond.raw()).unwrap_or(Self::Error)
    }
}

impl PartialEq<ErrorCondition> for ErrorCode {
    fn eq(&self, other: &ErrorCondition) -> bool {
        self.condition() == *other
    }
}

impl PartialEq<ErrorCode> for ErrorCondition {
    fn eq(&self, other: &ErrorCode) -> bool {
        *self == other.condition()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.into();
        write!(f, "{name} ({})", self.raw())
    }
}

impl fmt::Display for ErrorCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = self.into();
        write!(f, "{name} ({})", self.raw())
    }
}
