//! Connection configuration.
//!
//! [`OpenMode`] mirrors the engine's `SQLITE_OPEN_*` flags. [`OpenOptions`]
//! is the serializable form used by [`Connection::open_with`]: open flags plus
//! the PRAGMAs applied right after the handle is opened.
//!
//! The open sequence is:
//!
//! 1. **Open** with the flags derived from the options; extended result codes
//!    are enabled immediately.
//! 2. **Busy timeout**, if configured.
//! 3. **Configure** with a single PRAGMA script (`foreign_keys`,
//!    `journal_mode`, `synchronous`).
//!
//! [`Connection::open_with`]: crate::Connection::open_with

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::os::raw::c_int;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::connection::ConnectionRef;
use crate::error::Result;
use crate::ffi;

/// Open flags for [`Connection::open_with_mode`](crate::Connection::open_with_mode).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpenMode(c_int);

impl OpenMode {
    /// Open for reading only.
    pub const READ_ONLY: Self = Self(ffi::SQLITE_OPEN_READONLY);
    /// Open for reading and writing.
    pub const READ_WRITE: Self = Self(ffi::SQLITE_OPEN_READWRITE);
    /// Create the database if it does not exist (requires `READ_WRITE`).
    pub const CREATE: Self = Self(ffi::SQLITE_OPEN_CREATE);
    /// Interpret the filename as a URI.
    pub const URI: Self = Self(ffi::SQLITE_OPEN_URI);
    /// Open as an in-memory database.
    pub const MEMORY: Self = Self(ffi::SQLITE_OPEN_MEMORY);
    /// Multi-thread mode for this connection.
    pub const NO_MUTEX: Self = Self(ffi::SQLITE_OPEN_NOMUTEX);
    /// Serialized mode for this connection.
    pub const FULL_MUTEX: Self = Self(ffi::SQLITE_OPEN_FULLMUTEX);
    /// Enable shared cache.
    pub const SHARED_CACHE: Self = Self(ffi::SQLITE_OPEN_SHAREDCACHE);
    /// Disable shared cache.
    pub const PRIVATE_CACHE: Self = Self(ffi::SQLITE_OPEN_PRIVATECACHE);
    /// Refuse to open a filename that is a symbolic link.
    pub const NO_FOLLOW: Self = Self(ffi::SQLITE_OPEN_NOFOLLOW);

    /// The raw flag bits.
    #[must_use]
    pub const fn bits(self) -> c_int {
        self.0
    }

    /// Builds a mode from raw flag bits.
    #[must_use]
    pub const fn from_bits(bits: c_int) -> Self {
        Self(bits)
    }

    /// `true` if every flag in `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl Default for OpenMode {
    fn default() -> Self {
        Self::READ_WRITE | Self::CREATE
    }
}

impl BitOr for OpenMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OpenMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for OpenMode {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpenMode({:#x})", self.0)
    }
}

/// `PRAGMA journal_mode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

/// `PRAGMA synchronous` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE")]
#[allow(missing_docs)]
pub enum Synchronous {
    Off,
    Normal,
    Full,
    Extra,
}

/// Serializable connection configuration.
///
/// Missing fields take their [`Default`] values, so a partial JSON/TOML
/// document is enough:
///
/// ```
/// # use neo_sqlite3::{JournalMode, OpenOptions};
/// let opts: OpenOptions = serde_json::from_str(r#"{"journal_mode": "wal"}"#).unwrap();
/// assert_eq!(opts.journal_mode, Some(JournalMode::Wal));
/// assert!(opts.create);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct OpenOptions {
    /// Open read-only. Overrides `create`.
    pub read_only: bool,
    /// Create the file if it is missing.
    pub create: bool,
    /// Interpret the path as a `file:` URI.
    pub uri: bool,
    /// Refuse to follow a symbolic link.
    pub no_follow: bool,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u32>,
    /// `PRAGMA foreign_keys`.
    pub foreign_keys: Option<bool>,
    /// `PRAGMA journal_mode`.
    pub journal_mode: Option<JournalMode>,
    /// `PRAGMA synchronous`.
    pub synchronous: Option<Synchronous>,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            create: true,
            uri: false,
            no_follow: false,
            busy_timeout_ms: None,
            foreign_keys: None,
            journal_mode: None,
            synchronous: None,
        }
    }
}

impl OpenOptions {
    /// The open flags these options translate to.
    #[must_use]
    pub fn mode(&self) -> OpenMode {
        let mut mode = if self.read_only {
            OpenMode::READ_ONLY
        } else if self.create {
            OpenMode::READ_WRITE | OpenMode::CREATE
        } else {
            OpenMode::READ_WRITE
        };
        if self.uri {
            mode |= OpenMode::URI;
        }
        if self.no_follow {
            mode |= OpenMode::NO_FOLLOW;
        }
        mode
    }

    /// The PRAGMA script applied after opening. Empty if nothing is set.
    #[must_use]
    pub fn pragma_script(&self) -> String {
        let mut script = String::new();
        if let Some(on) = self.foreign_keys {
            script.push_str(if on {
                "PRAGMA foreign_keys = ON;\n"
            } else {
                "PRAGMA foreign_keys = OFF;\n"
            });
        }
        if let Some(mode) = self.journal_mode {
            let mode: &'static str = mode.into();
            script.push_str(&format!("PRAGMA journal_mode = {mode};\n"));
        }
        if let Some(level) = self.synchronous {
            let level: &'static str = level.into();
            script.push_str(&format!("PRAGMA synchronous = {level};\n"));
        }
        script
    }

    pub(crate) fn apply(&self, db: &ConnectionRef) -> Result<()> {
        if let Some(ms) = self.busy_timeout_ms {
            db.set_busy_timeout(Duration::from_millis(u64::from(ms)))
                .throw_if_error()?;
        }
        let script = self.pragma_script();
        if !script.is_empty() {
            log::debug!("configuring connection: {}", script.trim_end());
            db.exec(&script).throw_if_error()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn default_mode_creates() {
        let mode = OpenMode::default();
        assert!(mode.contains(OpenMode::READ_WRITE));
        assert!(mode.contains(OpenMode::CREATE));
        assert!(!mode.contains(OpenMode::READ_ONLY));
        assert_eq!(OpenOptions::default().mode(), mode);
    }

    #[test_case(r#"{}"#, OpenMode::READ_WRITE | OpenMode::CREATE ; "defaults")]
    #[test_case(r#"{"read_only": true}"#, OpenMode::READ_ONLY ; "read only")]
    #[test_case(r#"{"create": false}"#, OpenMode::READ_WRITE ; "no create")]
    #[test_case(r#"{"uri": true}"#, OpenMode::READ_WRITE | OpenMode::CREATE | OpenMode::URI ; "uri")]
    fn mode_from_json(json: &str, expected: OpenMode) {
        let opts: OpenOptions = serde_json::from_str(json).expect("parse options");
        assert_eq!(opts.mode(), expected);
    }

    #[test]
    fn pragma_script() {
        let opts = OpenOptions {
            foreign_keys: Some(true),
            journal_mode: Some(JournalMode::Wal),
            synchronous: Some(Synchronous::Full),
            ..OpenOptions::default()
        };
        assert_eq!(
            opts.pragma_script(),
            "PRAGMA foreign_keys = ON;\nPRAGMA journal_mode = WAL;\nPRAGMA synchronous = FULL;\n"
        );
        assert!(OpenOptions::default().pragma_script().is_empty());
    }

    #[test]
    fn options_round_trip_through_json() {
        let opts = OpenOptions {
            busy_timeout_ms: Some(250),
            synchronous: Some(Synchronous::Normal),
            ..OpenOptions::default()
        };
        let json = serde_json::to_string(&opts).expect("serialize");
        assert!(json.contains(r#""synchronous":"normal""#), "{json}");
        let back: OpenOptions = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, opts);
    }
}
