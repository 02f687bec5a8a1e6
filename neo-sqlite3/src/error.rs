//! Error types for the safe `SQLite` wrapper.
//!
//! [`Error`] is the owned, "thrown" form of a failure: it records the exact
//! extended [`ErrorCode`], a short context string describing the operation,
//! and the connection diagnostic captured at the moment it was raised.
//! [`ErrorInfo`] is the lightweight form stored inside an
//! [`Errable`](crate::Errable): it only borrows the connection and fetches the
//! diagnostic when converted into an [`Error`].

use std::borrow::Cow;

use thiserror::Error;

use crate::connection::ConnectionRef;
use crate::errc::{ErrorCode, ErrorCondition};

const DEFAULT_CONTEXT: &str = "SQLite operation failed";

/// Result type for operations that raise an [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A failure reported by the engine or by this layer.
///
/// Compare against an [`ErrorCode`] to match the exact failure, or against an
/// [`ErrorCondition`] to match its category:
///
/// ```
/// # use neo_sqlite3::{Connection, ErrorCode, ErrorCondition};
/// let db = Connection::open_in_memory().throw_if_error().unwrap();
/// db.exec("CREATE TABLE t (x INTEGER NOT NULL)").throw_if_error().unwrap();
/// let err = db.exec("INSERT INTO t VALUES (NULL)").throw_if_error().unwrap_err();
/// assert_eq!(err, ErrorCode::ConstraintNotNull);
/// assert_eq!(err, ErrorCondition::Constraint);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{context}: {db_message} [{code}]")]
pub struct Error {
    code: ErrorCode,
    context: Cow<'static, str>,
    db_message: String,
}

impl Error {
    /// Creates an error whose diagnostic is the engine's static description
    /// of `code`.
    pub fn new(code: ErrorCode, context: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            context: context.into(),
            db_message: code.message().to_owned(),
        }
    }

    pub(crate) fn with_db_message(
        code: ErrorCode,
        context: impl Into<Cow<'static, str>>,
        db_message: String,
    ) -> Self {
        Self {
            code,
            context: context.into(),
            db_message,
        }
    }

    /// The exact extended result code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// The primary condition the code belongs to.
    #[must_use]
    pub const fn condition(&self) -> ErrorCondition {
        self.code.condition()
    }

    /// What this layer was doing when the failure occurred.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// The engine diagnostic captured when the error was raised.
    #[must_use]
    pub fn db_message(&self) -> &str {
        &self.db_message
    }
}

impl From<ErrorCode> for Error {
    fn from(code: ErrorCode) -> Self {
        Self::new(code, DEFAULT_CONTEXT)
    }
}

impl PartialEq<ErrorCode> for Error {
    fn eq(&self, other: &ErrorCode) -> bool {
        self.code == *other
    }
}

impl PartialEq<ErrorCondition> for Error {
    fn eq(&self, other: &ErrorCondition) -> bool {
        self.condition() == *other
    }
}

/// A not-yet-thrown error: code, optional context and an optional
/// back-reference to the connection that produced it.
///
/// The back-reference does not extend the connection's lifetime and is only
/// consulted by [`ErrorInfo::to_error`].
#[derive(Debug, Clone)]
pub struct ErrorInfo<'db> {
    code: ErrorCode,
    context: Option<Cow<'static, str>>,
    db: Option<&'db ConnectionRef>,
}

impl<'db> ErrorInfo<'db> {
    pub(crate) const fn new(
        code: ErrorCode,
        context: Option<Cow<'static, str>>,
        db: Option<&'db ConnectionRef>,
    ) -> Self {
        Self { code, context, db }
    }

    /// The result code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// The context text, if any was attached.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// The connection that produced the error, if known.
    #[must_use]
    pub const fn connection(&self) -> Option<&'db ConnectionRef> {
        self.db
    }

    /// Materializes an owned [`Error`], fetching the connection diagnostic
    /// now if a connection is attached.
    #[must_use]
    pub fn to_error(&self) -> Error {
        let context = self
            .context
            .clone()
            .unwrap_or(Cow::Borrowed(DEFAULT_CONTEXT));
        match self.db {
            Some(db) => Error::with_db_message(self.code, context, db.error_message()),
            None => Error::new(self.code, context),
        }
    }
}

impl From<ErrorInfo<'_>> for Error {
    fn from(info: ErrorInfo<'_>) -> Self {
        info.to_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context_message_and_code() {
        let err = Error::new(ErrorCode::Busy, "Failed to frob");
        let rendered = err.to_string();
        assert!(rendered.starts_with("Failed to frob: "), "{rendered}");
        assert!(rendered.ends_with("[busy (5)]"), "{rendered}");
    }

    #[test]
    fn compares_at_both_granularities() {
        let err = Error::from(ErrorCode::ConstraintUnique);
        assert_eq!(err, ErrorCode::ConstraintUnique);
        assert_ne!(err, ErrorCode::Constraint);
        assert_eq!(err, ErrorCondition::Constraint);
        assert_eq!(err.condition(), ErrorCondition::Constraint);
        assert_eq!(err.context(), DEFAULT_CONTEXT);
    }

    #[test]
    fn info_without_connection_uses_static_message() {
        let info = ErrorInfo::new(ErrorCode::Range, None, None);
        let err = info.to_error();
        assert_eq!(err.code(), ErrorCode::Range);
        assert_eq!(err.db_message(), ErrorCode::Range.message());
    }
}
