//! The non-throwing result type returned by engine-calling operations.

use std::borrow::Cow;
use std::os::raw::c_int;

use crate::connection::ConnectionRef;
use crate::errc::{ErrorCode, ErrorCondition};
use crate::error::{Error, ErrorInfo};

/// Either a value (with the non-error code that produced it) or an
/// [`ErrorInfo`].
///
/// The code of a successful `Errable` is one of `ok`, `row` or `done`, which
/// lets `step()`-like operations report progress without an extra type.
/// [`is_error`](Self::is_error) depends only on the code. An `Errable` may
/// also hold a non-error code with no value (a `done` step where a row was
/// wanted); asking it for its value panics with that code, just as asking an
/// error `Errable` panics with the error it holds.
///
/// Use [`throw_if_error`](Self::throw_if_error) to convert into a
/// [`Result`](crate::Result) and propagate with `?`.
#[must_use = "an Errable may hold an error that must be checked"]
#[derive(Debug, Clone)]
pub struct Errable<'db, T = ()> {
    code: ErrorCode,
    inner: Result<T, ErrorInfo<'db>>,
}

impl<T> Errable<'_, T> {
    /// A successful result with code `ok`.
    pub const fn new(value: T) -> Self {
        Self {
            code: ErrorCode::Ok,
            inner: Ok(value),
        }
    }
}

impl<'db> Errable<'db> {
    /// Interprets a raw engine return code from an operation that produces
    /// no value.
    pub(crate) fn from_rc(
        rc: c_int,
        context: Option<Cow<'static, str>>,
        db: Option<&'db ConnectionRef>,
    ) -> Self {
        let code = ErrorCode::from_raw(rc);
        if code.is_error() {
            Self::error(code, context, db)
        } else {
            Self::with_code(code, ())
        }
    }
}

impl<'db, T> Errable<'db, T> {
    pub(crate) fn with_code(code: ErrorCode, value: T) -> Self {
        debug_assert!(!code.is_error(), "success Errable built from {code}");
        Self {
            code,
            inner: Ok(value),
        }
    }

    pub(crate) const fn error(
        code: ErrorCode,
        context: Option<Cow<'static, str>>,
        db: Option<&'db ConnectionRef>,
    ) -> Self {
        Self::from_info(ErrorInfo::new(code, context, db))
    }

    /// A non-error code with no value attached.
    pub(crate) fn without_value(code: ErrorCode, context: Option<Cow<'static, str>>) -> Self {
        debug_assert!(!code.is_error(), "valueless Errable built from {code}");
        Self::from_info(ErrorInfo::new(code, context, None))
    }

    pub(crate) const fn from_info(info: ErrorInfo<'db>) -> Self {
        Self {
            code: info.code(),
            inner: Err(info),
        }
    }

    /// Splits into the success code and value, or the record explaining the
    /// missing value. Used by [`check!`].
    pub(crate) fn split(self) -> Result<(ErrorCode, T), ErrorInfo<'db>> {
        let code = self.code;
        self.inner.map(|value| (code, value))
    }

    /// The result code (`ok`, `row` or `done` on success).
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// `true` if the code is neither `ok`, `row` nor `done`.
    pub const fn is_error(&self) -> bool {
        self.code.is_error()
    }

    /// `true` if a value is present. Every error lacks a value, but a
    /// `done` result may lack one too.
    pub const fn has_value(&self) -> bool {
        self.inner.is_ok()
    }

    /// The record explaining why there is no value: the error, or the
    /// non-error code that ended the operation early.
    pub const fn error_info(&self) -> Option<&ErrorInfo<'db>> {
        match &self.inner {
            Ok(_) => None,
            Err(info) => Some(info),
        }
    }

    /// Borrows the value.
    ///
    /// # Panics
    /// If there is no value. The panic message is the rendered [`Error`].
    pub fn value(&self) -> &T {
        match &self.inner {
            Ok(value) => value,
            Err(info) => panic!("{}", info.to_error()),
        }
    }

    /// Mutably borrows the value.
    ///
    /// # Panics
    /// If there is no value.
    pub fn value_mut(&mut self) -> &mut T {
        match &mut self.inner {
            Ok(value) => value,
            Err(info) => panic!("{}", info.to_error()),
        }
    }

    /// Takes the value.
    ///
    /// # Panics
    /// If there is no value.
    pub fn into_value(self) -> T {
        match self.inner {
            Ok(value) => value,
            Err(info) => panic!("{}", info.to_error()),
        }
    }

    /// Takes the value, panicking with `msg` and the error otherwise.
    ///
    /// # Panics
    /// If there is no value.
    pub fn expect(self, msg: &str) -> T {
        match self.inner {
            Ok(value) => value,
            Err(info) => panic!("{msg}: {}", info.to_error()),
        }
    }

    /// The value, or `None` if there is none.
    pub fn ok(self) -> Option<T> {
        self.inner.ok()
    }

    /// Non-throwing conversion into a plain `Result`.
    ///
    /// # Errors
    /// The [`ErrorInfo`] if there is no value.
    pub fn into_result(self) -> Result<T, ErrorInfo<'db>> {
        self.inner
    }

    /// Converts into a [`Result`](crate::Result), materializing the error
    /// (and fetching the connection diagnostic) only on failure.
    ///
    /// # Errors
    /// The owned [`Error`] if there is no value. For a valueless `done` the
    /// error carries code `done`.
    pub fn throw_if_error(self) -> crate::Result<T> {
        self.inner.map_err(Error::from)
    }

    /// Materializes the current code as an [`Error`], whether or not it is
    /// an error code.
    pub fn throw_error(&self) -> Error {
        match &self.inner {
            Ok(_) => Error::from(self.code),
            Err(info) => info.to_error(),
        }
    }

    /// Maps the value, keeping the code.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Errable<'db, U> {
        Errable {
            code: self.code,
            inner: self.inner.map(f),
        }
    }

    /// Chains another errable-producing operation on success.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Errable<'db, U>) -> Errable<'db, U> {
        match self.inner {
            Ok(value) => f(value),
            Err(info) => Errable::from_info(info),
        }
    }
}

impl<T> PartialEq<ErrorCode> for Errable<'_, T> {
    fn eq(&self, other: &ErrorCode) -> bool {
        self.code == *other
    }
}

impl<T> PartialEq<ErrorCondition> for Errable<'_, T> {
    fn eq(&self, other: &ErrorCondition) -> bool {
        self.code.condition() == *other
    }
}

/// Unwraps an [`Errable`] into `(code, value)`, or returns its error from
/// the enclosing `Errable`-returning function.
macro_rules! check {
    ($e:expr) => {
        match $crate::errable::Errable::split($e) {
            Ok(ok) => ok,
            Err(info) => return $crate::errable::Errable::from_info(info),
        }
    };
}

pub(crate) use check;

#[cfg(test)]
mod tests {
    use super::*;

    fn fails() -> Errable<'static, i32> {
        Errable::error(ErrorCode::Busy, Some("busy test".into()), None)
    }

    fn chained() -> Errable<'static, String> {
        let (code, value) = check!(fails());
        Errable::with_code(code, value.to_string())
    }

    #[test]
    fn success_carries_value_and_code() {
        let e = Errable::with_code(ErrorCode::Row, 7);
        assert!(!e.is_error());
        assert!(e.has_value());
        assert_eq!(e, ErrorCode::Row);
        assert_eq!(*e.value(), 7);
        assert_eq!(e.throw_if_error().expect("value"), 7);
    }

    #[test]
    fn error_has_no_value() {
        let e = fails();
        assert!(e.is_error());
        assert!(!e.has_value());
        assert_eq!(e, ErrorCondition::Busy);
        assert_eq!(e.error_info().and_then(ErrorInfo::context), Some("busy test"));
        let err = e.throw_if_error().unwrap_err();
        assert_eq!(err.code(), ErrorCode::Busy);
        assert_eq!(err.context(), "busy test");
    }

    #[test]
    #[should_panic(expected = "busy test")]
    fn value_of_error_panics() {
        let _ = fails().into_value();
    }

    #[test]
    fn check_propagates_error() {
        let e = chained();
        assert!(e.is_error());
        assert_eq!(e.code(), ErrorCode::Busy);
    }

    #[test]
    fn map_and_then() {
        let e = Errable::new(2).map(|x| x * 3);
        assert_eq!(e.into_value(), 6);
        let e = Errable::new(2).and_then(|_| fails());
        assert!(e.is_error());
    }

    #[test]
    fn done_without_value_is_not_an_error() {
        let e: Errable<'_, i32> = Errable::without_value(ErrorCode::Done, Some("no row".into()));
        assert!(!e.is_error());
        assert_eq!(e.is_error(), e.code().is_error());
        assert!(!e.has_value());
        assert_eq!(e, ErrorCode::Done);
        let err = e.throw_if_error().expect_err("no value");
        assert_eq!(err, ErrorCode::Done);
        assert_eq!(err.context(), "no row");
    }

    #[test]
    #[should_panic(expected = "no row")]
    fn value_of_valueless_done_panics() {
        let e: Errable<'_, i32> = Errable::without_value(ErrorCode::Done, Some("no row".into()));
        let _ = e.value();
    }

    #[test]
    fn throw_error_on_success_uses_current_code() {
        let e = Errable::with_code(ErrorCode::Done, ());
        assert_eq!(e.throw_error(), ErrorCode::Done);
    }
}
