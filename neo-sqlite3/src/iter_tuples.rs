//! Iteration over statement results unpacked into tuples.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::iter_rows::{End, IterRows, RowCursor};
use crate::row::FromRow;
use crate::statement::Statement;
use crate::Result;

/// A range over the result rows of a statement, each unpacked into `T`.
///
/// Offers the same cursor shape as [`IterRows`] and also implements
/// [`Iterator`] for tuples of owned element types. The iterator yields the
/// first step error and then ends.
pub struct IterTuples<'s, 'db, T> {
    rows: IterRows<'s, 'db>,
    _marker: PhantomData<fn() -> T>,
}

impl<'s, 'db, T> IterTuples<'s, 'db, T> {
    /// Wraps a statement.
    #[must_use]
    pub fn new(stmt: &'s mut Statement<'db>) -> Self {
        Self {
            rows: IterRows::new(stmt),
            _marker: PhantomData,
        }
    }

    /// Steps the statement once and returns a cursor at the resulting tuple.
    /// As with [`IterRows::begin`], calling this twice skips a row.
    ///
    /// # Errors
    /// If the step fails.
    pub fn begin(&mut self) -> Result<TupleCursor<'_, 'db, T>> {
        Ok(TupleCursor {
            inner: self.rows.begin()?,
            _marker: PhantomData,
        })
    }

    /// The end sentinel.
    #[must_use]
    pub const fn end(&self) -> End {
        End
    }

    /// The underlying row range.
    pub fn rows(&mut self) -> &mut IterRows<'s, 'db> {
        &mut self.rows
    }
}

impl<T> Iterator for IterTuples<'_, '_, T>
where
    T: for<'r> FromRow<'r>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Result<T>> {
        self.rows.next_row().map(|row| row.map(|row| row.unpack()))
    }
}

impl<T> FusedIterator for IterTuples<'_, '_, T> where T: for<'r> FromRow<'r> {}

impl<T> fmt::Debug for IterTuples<'_, '_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterTuples")
            .field("rows", &self.rows)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

/// A position in an [`IterTuples`] range.
pub struct TupleCursor<'c, 'db, T> {
    inner: RowCursor<'c, 'db>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TupleCursor<'_, '_, T> {
    /// Unpacks the current row. Repeated calls do not advance.
    ///
    /// # Panics
    /// If the cursor is at the end.
    #[must_use]
    pub fn get<'a>(&'a self) -> T
    where
        T: FromRow<'a>,
    {
        self.inner.row().unpack()
    }

    /// Steps to the next row.
    ///
    /// # Errors
    /// If the step fails.
    pub fn advance(&mut self) -> Result<()> {
        self.inner.advance()
    }

    /// `true` once the statement has no current row.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.inner.at_end()
    }
}

impl<T> PartialEq<End> for TupleCursor<'_, '_, T> {
    fn eq(&self, other: &End) -> bool {
        self.inner == *other
    }
}

impl<T> fmt::Debug for TupleCursor<'_, '_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TupleCursor")
            .field("at_end", &self.at_end())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Connection;

    fn stuff() -> Connection {
        let db = Connection::open_in_memory().expect("open in-memory db");
        db.exec("CREATE TABLE stuff AS VALUES (1, 2, 'STRING'), (2, 5, 'other')")
            .expect("seed");
        db
    }

    #[test]
    fn cursor_over_tuples() {
        let db = stuff();
        let mut st = db.prepare("SELECT * FROM stuff").expect("prepare");
        let mut tups = IterTuples::<(i32, i32, String)>::new(&mut st);
        let stop = tups.end();
        let mut it = tups.begin().expect("begin");
        assert!(it != stop);
        assert_eq!(it.get(), (1, 2, "STRING".to_owned()));
        it.advance().expect("advance");
        assert!(it != stop);
        assert_eq!(it.get(), (2, 5, "other".to_owned()));
        it.advance().expect("advance");
        assert!(it == stop);
    }

    #[test]
    fn cursor_can_borrow_text() {
        let db = stuff();
        let mut st = db.prepare("SELECT column3 FROM stuff").expect("prepare");
        let mut tups = IterTuples::<(&[u8],)>::new(&mut st);
        let it = tups.begin().expect("begin");
        assert_eq!(it.get().0, b"STRING");
    }

    #[test]
    fn standard_iterator() {
        let db = stuff();
        let mut st = db
            .prepare("SELECT column1, column3 FROM stuff ORDER BY column1")
            .expect("prepare");
        let all: Vec<(i64, String)> = IterTuples::<(i64, String)>::new(&mut st)
            .collect::<Result<_>>()
            .expect("collect");
        assert_eq!(all, [(1, "STRING".to_owned()), (2, "other".to_owned())]);
    }

    #[test]
    fn iterator_ends_after_error() {
        let db = Connection::open_in_memory().expect("open in-memory db");
        db.exec("CREATE TABLE t (x NOT NULL)").expect("create");
        let mut st = db
            .prepare("INSERT INTO t VALUES (NULL) RETURNING x")
            .expect("prepare");
        let mut it = IterTuples::<(i64,)>::new(&mut st);
        assert!(it.next().expect("one item").is_err());
        assert!(it.next().is_none());
    }
}
