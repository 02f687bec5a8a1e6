//! Column values.
//!
//! [`ValueRef`] is a step-scoped view of one column of the current row;
//! [`FromValue`] converts it into Rust types using the engine's own numeric
//! and text coercions. [`Value`] is the owned counterpart, usable both as a
//! parameter and as an extraction target.

use std::borrow::Cow;
use std::fmt;
use std::os::raw::c_int;

use crate::ffi::{self, RawStmt};

/// The dynamic type of a single value, as reported by the engine.
///
/// Independent of the column's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 64-bit signed integer.
    Integer,
    /// IEEE double.
    Real,
    /// UTF-8 text.
    Text,
    /// Binary blob.
    Blob,
    /// SQL NULL.
    Null,
}

/// A value that can be bound to a prepared statement parameter or read from
/// a result column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit signed integer.
    Integer(i64),
    /// IEEE double.
    Real(f64),
    /// Binary blob.
    Blob(Vec<u8>),
    /// UTF-8 text.
    Text(String),
    /// SQL NULL.
    Null,
}

impl Value {
    /// The dynamic type of this value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Integer(_) => ValueType::Integer,
            Self::Real(_) => ValueType::Real,
            Self::Blob(_) => ValueType::Blob,
            Self::Text(_) => ValueType::Text,
            Self::Null => ValueType::Null,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Blob(v.to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Convenience macro for building parameter lists.
///
/// Usage: `params![1_i64, blob.as_slice(), "text"]`
#[macro_export]
macro_rules! params {
    ($($val:expr),* $(,)?) => {
        &[$($crate::Value::from($val)),*][..]
    };
}

/// A view of one column of the current row.
///
/// Valid only while the statement stays on the current step; the borrow on
/// the statement enforces this.
#[derive(Clone, Copy)]
pub struct ValueRef<'r> {
    raw: &'r RawStmt,
    col: c_int,
}

impl<'r> ValueRef<'r> {
    pub(crate) const fn new(raw: &'r RawStmt, col: c_int) -> Self {
        Self { raw, col }
    }

    /// The dynamic type of the value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self.raw.column_type(self.col) {
            ffi::SQLITE_INTEGER => ValueType::Integer,
            ffi::SQLITE_FLOAT => ValueType::Real,
            ffi::SQLITE_TEXT => ValueType::Text,
            ffi::SQLITE_BLOB => ValueType::Blob,
            _ => ValueType::Null,
        }
    }

    /// `true` if the value is an integer.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.value_type() == ValueType::Integer
    }

    /// `true` if the value is a double.
    #[must_use]
    pub fn is_real(&self) -> bool {
        self.value_type() == ValueType::Real
    }

    /// `true` if the value is text.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.value_type() == ValueType::Text
    }

    /// `true` if the value is a blob.
    #[must_use]
    pub fn is_blob(&self) -> bool {
        self.value_type() == ValueType::Blob
    }

    /// `true` if the value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.value_type() == ValueType::Null
    }

    /// The value as an integer, coerced by the engine.
    #[must_use]
    pub fn as_integer(&self) -> i64 {
        self.raw.column_int64(self.col)
    }

    /// The value as a double, coerced by the engine.
    #[must_use]
    pub fn as_real(&self) -> f64 {
        self.raw.column_double(self.col)
    }

    // The engine may reallocate a value's buffer when the other byte
    // accessor is called on it, so every byte view of a column goes through
    // the one accessor that matches its type. Blobs use the blob accessor;
    // text and numbers use the text accessor, which converts numbers once.
    fn bytes(&self) -> &'r [u8] {
        if self.is_blob() {
            self.raw.column_blob(self.col)
        } else {
            self.raw.column_text(self.col)
        }
    }

    /// The raw UTF-8 bytes of the value's text form. Blob values are
    /// returned as-is.
    #[must_use]
    pub fn as_text_bytes(&self) -> &'r [u8] {
        self.bytes()
    }

    /// The value as text. Invalid UTF-8 is replaced.
    #[must_use]
    pub fn as_text(&self) -> Cow<'r, str> {
        String::from_utf8_lossy(self.as_text_bytes())
    }

    /// The value as blob bytes. Text and numeric values yield their text
    /// form.
    ///
    /// Slices from this and [`as_text_bytes`](Self::as_text_bytes) stay valid
    /// together for the life of the row, in any call order.
    #[must_use]
    pub fn as_blob(&self) -> &'r [u8] {
        self.bytes()
    }

    /// Extracts the value as `T`.
    #[must_use]
    pub fn get<T: FromValue<'r>>(self) -> T {
        T::from_value(self)
    }

    /// Copies the value into an owned [`Value`].
    #[must_use]
    pub fn to_owned_value(&self) -> Value {
        match self.value_type() {
            ValueType::Integer => Value::Integer(self.as_integer()),
            ValueType::Real => Value::Real(self.as_real()),
            ValueType::Text => Value::Text(self.as_text().into_owned()),
            ValueType::Blob => Value::Blob(self.as_blob().to_vec()),
            ValueType::Null => Value::Null,
        }
    }
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value_type() {
            ValueType::Integer => write!(f, "{}", self.as_integer()),
            ValueType::Real => write!(f, "{:?}", self.as_real()),
            ValueType::Text => write!(f, "{:?}", self.as_text()),
            ValueType::Blob => write!(f, "x'{}'", hex::encode(self.as_blob())),
            ValueType::Null => f.write_str("null"),
        }
    }
}

/// A type that can be extracted from a [`ValueRef`].
///
/// Integer and floating targets go through the engine's numeric coercion,
/// text targets through its text conversion and blob targets through its blob
/// accessor. `Option<T>` is `None` exactly when the value is NULL.
pub trait FromValue<'r>: Sized {
    /// Converts the value.
    fn from_value(value: ValueRef<'r>) -> Self;
}

impl FromValue<'_> for i64 {
    fn from_value(value: ValueRef<'_>) -> Self {
        value.as_integer()
    }
}

// Narrower integers truncate like a C cast.
macro_rules! from_value_int {
    ($($t:ty),*) => {$(
        impl FromValue<'_> for $t {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_possible_wrap
            )]
            fn from_value(value: ValueRef<'_>) -> Self {
                value.as_integer() as $t
            }
        }
    )*};
}

from_value_int!(i8, i16, i32, isize, u8, u16, u32, u64, usize);

impl FromValue<'_> for bool {
    fn from_value(value: ValueRef<'_>) -> Self {
        value.as_integer() != 0
    }
}

impl FromValue<'_> for f64 {
    fn from_value(value: ValueRef<'_>) -> Self {
        value.as_real()
    }
}

impl FromValue<'_> for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: ValueRef<'_>) -> Self {
        value.as_real() as Self
    }
}

impl FromValue<'_> for String {
    fn from_value(value: ValueRef<'_>) -> Self {
        value.as_text().into_owned()
    }
}

impl<'r> FromValue<'r> for Cow<'r, str> {
    fn from_value(value: ValueRef<'r>) -> Self {
        value.as_text()
    }
}

impl<'r> FromValue<'r> for &'r [u8] {
    fn from_value(value: ValueRef<'r>) -> Self {
        value.as_blob()
    }
}

impl FromValue<'_> for Vec<u8> {
    fn from_value(value: ValueRef<'_>) -> Self {
        value.as_blob().to_vec()
    }
}

impl FromValue<'_> for Value {
    fn from_value(value: ValueRef<'_>) -> Self {
        value.to_owned_value()
    }
}

impl<'r> FromValue<'r> for ValueRef<'r> {
    fn from_value(value: ValueRef<'r>) -> Self {
        value
    }
}

impl<'r, T: FromValue<'r>> FromValue<'r> for Option<T> {
    fn from_value(value: ValueRef<'r>) -> Self {
        if value.is_null() {
            None
        } else {
            Some(T::from_value(value))
        }
    }
}
