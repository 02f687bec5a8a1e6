//! Parameter binding.
//!
//! Every bindable Rust type classifies itself into exactly one [`BindValue`]
//! shape through the [`Bindable`] trait, and [`Binding::bind_value`] turns
//! each shape into one engine call with a single exhaustive match. Types
//! without a `Bindable` impl are rejected at compile time.
//!
//! Parameter slots are 1-based. Binding to slot `0`, to a slot past the
//! parameter count, or to a name the statement does not declare fails with
//! `range`.

use std::borrow::Cow;
use std::os::raw::c_int;

use crate::errable::{check, Errable};
use crate::error::Result;
use crate::literal::SqlLiteral;
use crate::statement::Statement;
use crate::value::Value;

/// The closed set of shapes a parameter slot accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BindValue<'a> {
    /// 64-bit signed integer.
    Integer(i64),
    /// IEEE double.
    Real(f64),
    /// SQL NULL.
    Null,
    /// A zero-filled BLOB of the given size, allocated by the engine.
    ZeroBlob(u64),
    /// A BLOB, copied by the engine before the call returns.
    Blob(&'a [u8]),
    /// UTF-8 text, copied by the engine before the call returns.
    Text(&'a str),
    /// UTF-8 text bound by reference. Only `'static` text qualifies.
    StaticText(&'static str),
}

/// Marker that binds SQL NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Null;

/// Placeholder that binds a zero-filled BLOB of the given size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZeroBlob(pub u64);

/// An explicit view of BLOB bytes. Binds as a BLOB (copied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobView<'a>(pub &'a [u8]);

/// Text that is bound without copying because it lives forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticText(pub &'static str);

/// A value that can be bound to a statement parameter.
pub trait Bindable {
    /// Classifies `self` into one bindable shape.
    fn to_bind_value(&self) -> BindValue<'_>;
}

macro_rules! bindable_lossless_int {
    ($($t:ty),*) => {$(
        impl Bindable for $t {
            fn to_bind_value(&self) -> BindValue<'_> {
                BindValue::Integer(i64::from(*self))
            }
        }
    )*};
}

bindable_lossless_int!(i8, i16, i32, i64, u8, u16, u32, bool);

// Wider integers narrow into the engine's 64-bit integer like a C cast.
macro_rules! bindable_narrowing_int {
    ($($t:ty),*) => {$(
        impl Bindable for $t {
            #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
            fn to_bind_value(&self) -> BindValue<'_> {
                BindValue::Integer(*self as i64)
            }
        }
    )*};
}

bindable_narrowing_int!(u64, usize, isize, i128, u128);

impl Bindable for f64 {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::Real(*self)
    }
}

impl Bindable for f32 {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::Real(f64::from(*self))
    }
}

impl Bindable for str {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::Text(self)
    }
}

impl Bindable for String {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::Text(self)
    }
}

impl Bindable for Cow<'_, str> {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::Text(self)
    }
}

impl Bindable for [u8] {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::Blob(self)
    }
}

impl<const N: usize> Bindable for [u8; N] {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::Blob(self)
    }
}

impl Bindable for Vec<u8> {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::Blob(self)
    }
}

impl Bindable for BlobView<'_> {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::Blob(self.0)
    }
}

impl Bindable for Null {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::Null
    }
}

impl Bindable for ZeroBlob {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::ZeroBlob(self.0)
    }
}

impl Bindable for StaticText {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::StaticText(self.0)
    }
}

impl Bindable for SqlLiteral {
    fn to_bind_value(&self) -> BindValue<'_> {
        BindValue::StaticText(self.as_str())
    }
}

impl Bindable for Value {
    fn to_bind_value(&self) -> BindValue<'_> {
        match self {
            Self::Integer(v) => BindValue::Integer(*v),
            Self::Real(v) => BindValue::Real(*v),
            Self::Text(v) => BindValue::Text(v),
            Self::Blob(v) => BindValue::Blob(v),
            Self::Null => BindValue::Null,
        }
    }
}

impl<T: Bindable> Bindable for Option<T> {
    fn to_bind_value(&self) -> BindValue<'_> {
        self.as_ref().map_or(BindValue::Null, Bindable::to_bind_value)
    }
}

impl<T: Bindable + ?Sized> Bindable for &T {
    fn to_bind_value(&self) -> BindValue<'_> {
        (**self).to_bind_value()
    }
}

/// A single parameter slot of a statement.
pub struct Binding<'s, 'db> {
    stmt: &'s Statement<'db>,
    index: c_int,
}

impl<'db> Binding<'_, 'db> {
    /// The 1-based slot index (`0` if a named lookup failed).
    #[must_use]
    pub fn index(&self) -> usize {
        usize::try_from(self.index).unwrap_or(0)
    }

    fn finish(&self, rc: c_int, context: &'static str) -> Errable<'db> {
        Errable::from_rc(
            rc,
            Some(Cow::Borrowed(context)),
            Some(self.stmt.connection()),
        )
    }

    /// Binds one value of the closed shape set.
    pub fn bind_value(&self, value: BindValue<'_>) -> Errable<'db> {
        let raw = self.stmt.raw();
        let (rc, context) = match value {
            BindValue::Integer(v) => (raw.bind_int64(self.index, v), "sqlite3_bind_int64() failed"),
            BindValue::Real(v) => (raw.bind_double(self.index, v), "sqlite3_bind_double() failed"),
            BindValue::Null => (raw.bind_null(self.index), "sqlite3_bind_null() failed"),
            BindValue::ZeroBlob(size) => (
                raw.bind_zeroblob(self.index, size),
                "sqlite3_bind_zeroblob64() failed",
            ),
            BindValue::Blob(bytes) => {
                (raw.bind_blob(self.index, bytes), "sqlite3_bind_blob64() failed")
            }
            BindValue::Text(text) => {
                (raw.bind_text(self.index, text), "sqlite3_bind_text64() failed")
            }
            BindValue::StaticText(text) => (
                raw.bind_static_text(self.index, text),
                "sqlite3_bind_text64() failed",
            ),
        };
        self.finish(rc, context)
    }

    /// Binds any [`Bindable`] value.
    pub fn bind<T: Bindable + ?Sized>(&self, value: &T) -> Errable<'db> {
        self.bind_value(value.to_bind_value())
    }

    /// Throwing form of [`bind`](Self::bind).
    ///
    /// # Errors
    /// If the engine rejects the binding.
    pub fn set<T: Bindable + ?Sized>(&self, value: &T) -> Result<()> {
        self.bind(value).throw_if_error()
    }

    /// Binds a 64-bit integer.
    pub fn bind_integer(&self, value: i64) -> Errable<'db> {
        self.bind_value(BindValue::Integer(value))
    }

    /// Binds a double.
    pub fn bind_real(&self, value: f64) -> Errable<'db> {
        self.bind_value(BindValue::Real(value))
    }

    /// Binds SQL NULL.
    pub fn bind_null(&self) -> Errable<'db> {
        self.bind_value(BindValue::Null)
    }

    /// Binds a zero-filled BLOB of `size` bytes.
    pub fn bind_zeroblob(&self, size: u64) -> Errable<'db> {
        self.bind_value(BindValue::ZeroBlob(size))
    }

    /// Binds a copy of `bytes` as a BLOB.
    pub fn bind_blob(&self, bytes: &[u8]) -> Errable<'db> {
        self.bind_value(BindValue::Blob(bytes))
    }

    /// Binds a copy of `text`.
    pub fn bind_text(&self, text: &str) -> Errable<'db> {
        self.bind_value(BindValue::Text(text))
    }

    /// Binds `text` without copying.
    pub fn bind_static_text(&self, text: &'static str) -> Errable<'db> {
        self.bind_value(BindValue::StaticText(text))
    }
}

/// Access to the parameter bindings of a statement.
///
/// Obtained from [`Statement::bindings`], which borrows the statement
/// mutably, so bindings cannot change while a row is being read.
pub struct BindingAccess<'s, 'db> {
    stmt: &'s Statement<'db>,
}

impl<'s, 'db> BindingAccess<'s, 'db> {
    pub(crate) const fn new(stmt: &'s Statement<'db>) -> Self {
        Self { stmt }
    }

    /// The slot at 1-based `index`.
    #[must_use]
    pub fn at(&self, index: usize) -> Binding<'s, 'db> {
        Binding {
            stmt: self.stmt,
            index: c_int::try_from(index).unwrap_or(c_int::MAX),
        }
    }

    /// The slot for the named parameter `name` (including its `:`, `@` or
    /// `$` prefix). Binding to an unknown name fails with `range`.
    #[must_use]
    pub fn named(&self, name: &str) -> Binding<'s, 'db> {
        Binding {
            stmt: self.stmt,
            index: self.stmt.raw().bind_parameter_index(name),
        }
    }

    /// The 1-based index of the named parameter, if it exists.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        match self.stmt.raw().bind_parameter_index(name) {
            0 => None,
            idx => usize::try_from(idx).ok(),
        }
    }

    /// The name of the parameter at 1-based `index`, if it is named.
    #[must_use]
    pub fn name_of(&self, index: usize) -> Option<&'s str> {
        let index = c_int::try_from(index).ok()?;
        self.stmt.raw().bind_parameter_name(index)
    }

    /// The number of parameter slots (the largest index).
    #[must_use]
    pub fn count(&self) -> usize {
        usize::try_from(self.stmt.raw().bind_parameter_count()).unwrap_or(0)
    }

    /// Resets every slot to NULL.
    pub fn clear(&self) {
        self.stmt.raw().clear_bindings();
    }

    /// Binds `values` to slots `1..=n`, stopping at the first failure.
    pub fn bind_all<T: BindTuple + ?Sized>(&self, values: &T) -> Errable<'db> {
        values.bind_tuple(self)
    }

    /// Throwing form of [`bind_all`](Self::bind_all).
    ///
    /// # Errors
    /// The first binding failure.
    pub fn set_all<T: BindTuple + ?Sized>(&self, values: &T) -> Result<()> {
        self.bind_all(values).throw_if_error()
    }
}

/// A sequence of bindable values assigned to slots `1..=n` in order.
///
/// Implemented for tuples of up to twelve [`Bindable`] elements and for
/// slices, arrays and vectors of a single bindable type.
pub trait BindTuple {
    /// Binds each element, short-circuiting on the first failure.
    fn bind_tuple<'db>(&self, bindings: &BindingAccess<'_, 'db>) -> Errable<'db>;
}

macro_rules! bind_tuple_impl {
    ($($name:ident : $idx:tt),*) => {
        impl<$($name: Bindable),*> BindTuple for ($($name,)*) {
            #[allow(unused_variables)]
            fn bind_tuple<'db>(&self, bindings: &BindingAccess<'_, 'db>) -> Errable<'db> {
                $( check!(bindings.at($idx + 1).bind(&self.$idx)); )*
                Errable::new(())
            }
        }
    };
}

bind_tuple_impl!();
bind_tuple_impl!(A: 0);
bind_tuple_impl!(A: 0, B: 1);
bind_tuple_impl!(A: 0, B: 1, C: 2);
bind_tuple_impl!(A: 0, B: 1, C: 2, D: 3);
bind_tuple_impl!(A: 0, B: 1, C: 2, D: 3, E: 4);
bind_tuple_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
bind_tuple_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
bind_tuple_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
bind_tuple_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
bind_tuple_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
bind_tuple_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
bind_tuple_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);

impl<T: Bindable> BindTuple for [T] {
    fn bind_tuple<'db>(&self, bindings: &BindingAccess<'_, 'db>) -> Errable<'db> {
        for (i, value) in self.iter().enumerate() {
            check!(bindings.at(i + 1).bind(value));
        }
        Errable::new(())
    }
}

impl<T: Bindable, const N: usize> BindTuple for [T; N] {
    fn bind_tuple<'db>(&self, bindings: &BindingAccess<'_, 'db>) -> Errable<'db> {
        self.as_slice().bind_tuple(bindings)
    }
}

impl<T: Bindable> BindTuple for Vec<T> {
    fn bind_tuple<'db>(&self, bindings: &BindingAccess<'_, 'db>) -> Errable<'db> {
        self.as_slice().bind_tuple(bindings)
    }
}

impl<T: BindTuple + ?Sized> BindTuple for &T {
    fn bind_tuple<'db>(&self, bindings: &BindingAccess<'_, 'db>) -> Errable<'db> {
        (**self).bind_tuple(bindings)
    }
}
