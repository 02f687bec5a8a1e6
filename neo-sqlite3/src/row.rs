//! Row views.

use std::fmt;
use std::marker::PhantomData;
use std::os::raw::c_int;

use crate::column::ColumnAccess;
use crate::statement::Statement;
use crate::value::{FromValue, ValueRef};

/// A view of all columns of a statement's current row.
///
/// Columns are zero-based. Reading a column while the statement has no
/// current row, or past the column count, is a precondition violation and
/// panics.
#[derive(Clone, Copy)]
pub struct Row<'r> {
    stmt: &'r Statement<'r>,
}

impl<'r> Row<'r> {
    pub(crate) const fn new(stmt: &'r Statement<'r>) -> Self {
        Self { stmt }
    }

    /// The number of result columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        usize::try_from(self.stmt.raw().column_count()).unwrap_or(0)
    }

    /// The value in column `index`.
    ///
    /// # Panics
    /// If the statement has no current row or `index` is out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> ValueRef<'r> {
        assert!(
            self.stmt.is_busy(),
            "Access to a row of a statement that has no current row"
        );
        let count = self.column_count();
        assert!(
            index < count,
            "Column index {index} is out of range for a row of {count} columns"
        );
        let col = c_int::try_from(index).unwrap_or(c_int::MAX);
        ValueRef::new(self.stmt.raw(), col)
    }

    /// Extracts every column into `T` (a tuple of [`FromValue`] types).
    #[must_use]
    pub fn unpack<T: FromRow<'r>>(&self) -> T {
        T::from_row(self)
    }

    /// Attaches a tuple type to the row.
    #[must_use]
    pub const fn typed<T>(self) -> TypedRow<'r, T> {
        TypedRow {
            row: self,
            _marker: PhantomData,
        }
    }

    /// Iterates the values of the row in column order.
    pub fn values(&self) -> impl Iterator<Item = ValueRef<'r>> + 'r {
        let row = *self;
        (0..self.column_count()).map(move |i| row.get(i))
    }

    /// Result column metadata.
    #[must_use]
    pub fn columns(&self) -> ColumnAccess<'r> {
        ColumnAccess::new(self.stmt.raw())
    }
}

impl fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.stmt.is_busy() {
            f.debug_list().entries(self.values()).finish()
        } else {
            f.write_str("Row(<no current row>)")
        }
    }
}

/// A row paired with the tuple type it converts into.
#[derive(Clone, Copy)]
pub struct TypedRow<'r, T> {
    row: Row<'r>,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T: FromRow<'r>> TypedRow<'r, T> {
    /// Converts the row into its tuple type.
    #[must_use]
    pub fn as_tuple(&self) -> T {
        self.row.unpack()
    }
}

impl<'r, T> TypedRow<'r, T> {
    /// The untyped row.
    #[must_use]
    pub const fn row(&self) -> Row<'r> {
        self.row
    }
}

impl<T> fmt::Debug for TypedRow<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.row, f)
    }
}

/// A tuple type that a whole row can be unpacked into.
///
/// Implemented for tuples of up to twelve [`FromValue`] types. Each element
/// is extracted from the column at its position.
pub trait FromRow<'r>: Sized {
    /// Unpacks the row.
    fn from_row(row: &Row<'r>) -> Self;
}

macro_rules! from_row_impl {
    ($($name:ident : $idx:tt),+) => {
        impl<'r, $($name: FromValue<'r>),+> FromRow<'r> for ($($name,)+) {
            fn from_row(row: &Row<'r>) -> Self {
                ($(row.get($idx).get::<$name>(),)+)
            }
        }
    };
}

from_row_impl!(A: 0);
from_row_impl!(A: 0, B: 1);
from_row_impl!(A: 0, B: 1, C: 2);
from_row_impl!(A: 0, B: 1, C: 2, D: 3);
from_row_impl!(A: 0, B: 1, C: 2, D: 3, E: 4);
from_row_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
from_row_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
from_row_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
from_row_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8);
from_row_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9);
from_row_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10);
from_row_impl!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7, I: 8, J: 9, K: 10, L: 11);
