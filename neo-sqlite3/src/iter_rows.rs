//! Single-pass iteration over the rows of a statement.
//!
//! [`IterRows::begin`] steps the statement once to ready the first result.
//! Calling it again steps again, so the row seen by the first cursor is
//! skipped. Only call `begin` once per execution.
//!
//! Both `begin` and [`IterRows::next_row`] always step the statement, so a
//! statement that already finished is run again by the engine. Only
//! `next_row` fuses: once it has reported the end of this range it keeps
//! returning `None`.

use std::fmt;

use crate::row::Row;
use crate::statement::{Statement, StatementState};
use crate::Result;

/// A range over the result rows of a statement.
pub struct IterRows<'s, 'db> {
    stmt: &'s mut Statement<'db>,
    exhausted: bool,
}

impl<'s, 'db> IterRows<'s, 'db> {
    /// Wraps a statement. Nothing is executed until [`begin`](Self::begin)
    /// or [`next_row`](Self::next_row).
    #[must_use]
    pub fn new(stmt: &'s mut Statement<'db>) -> Self {
        Self {
            stmt,
            exhausted: false,
        }
    }

    /// Steps the statement once and returns a cursor at the resulting row.
    ///
    /// # Errors
    /// If the step fails.
    pub fn begin(&mut self) -> Result<RowCursor<'_, 'db>> {
        self.stmt.step().throw_if_error()?;
        Ok(RowCursor {
            stmt: &mut *self.stmt,
        })
    }

    /// The end sentinel that a cursor compares equal to once exhausted.
    #[must_use]
    pub const fn end(&self) -> End {
        End
    }

    /// Lending alternative to the cursor: steps and returns the new row.
    ///
    /// The first call steps whatever state the statement is in, like
    /// [`begin`](Self::begin). After this method has returned `None` or an
    /// error it returns `None` without stepping again.
    pub fn next_row(&mut self) -> Option<Result<Row<'_>>> {
        if self.exhausted {
            return None;
        }
        if let Err(err) = self.stmt.step().throw_if_error() {
            self.exhausted = true;
            return Some(Err(err));
        }
        if self.stmt.state() == StatementState::Busy {
            Some(Ok(self.stmt.row()))
        } else {
            self.exhausted = true;
            None
        }
    }

    /// The underlying statement.
    pub fn statement(&mut self) -> &mut Statement<'db> {
        self.stmt
    }
}

impl fmt::Debug for IterRows<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterRows")
            .field("stmt", &self.stmt)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

/// End-of-results sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct End;

/// A position in an [`IterRows`] range.
pub struct RowCursor<'c, 'db> {
    stmt: &'c mut Statement<'db>,
}

impl RowCursor<'_, '_> {
    /// The current row. Repeated calls do not advance.
    ///
    /// # Panics
    /// If the cursor is at the end.
    #[must_use]
    pub fn row(&self) -> Row<'_> {
        assert!(!self.at_end(), "Dereference of finished row-iterator");
        self.stmt.row()
    }

    /// Steps to the next row.
    ///
    /// # Errors
    /// If the step fails. The cursor is then at the end.
    ///
    /// # Panics
    /// If the cursor is already at the end.
    pub fn advance(&mut self) -> Result<()> {
        assert!(!self.at_end(), "Advance of a finished row-iterator");
        self.stmt.step().throw_if_error()
    }

    /// `true` once the statement has no current row.
    #[must_use]
    pub fn at_end(&self) -> bool {
        !self.stmt.is_busy()
    }
}

impl PartialEq<End> for RowCursor<'_, '_> {
    fn eq(&self, _: &End) -> bool {
        self.at_end()
    }
}

impl fmt::Debug for RowCursor<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowCursor")
            .field("at_end", &self.at_end())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errc::ErrorCondition;
    use crate::Connection;

    fn stuff() -> Connection {
        let db = Connection::open_in_memory().expect("open in-memory db");
        db.exec("CREATE TABLE stuff AS VALUES (1, 2, 3), (4, 5, 6), (7, 8, 9)")
            .expect("seed");
        db
    }

    #[test]
    fn basic_iteration() {
        let db = stuff();
        let mut st = db.prepare("SELECT * FROM stuff").expect("prepare");
        let mut rows = IterRows::new(&mut st);
        let stop = rows.end();
        let mut it = rows.begin().expect("begin");
        assert!(it != stop);
        for _ in 0..5 {
            assert_eq!(it.row().get(0).as_integer(), 1);
        }
        let mut seen = Vec::new();
        while it != stop {
            let row = it.row();
            seen.push((
                row.get(0).as_integer(),
                row.get(1).as_integer(),
                row.get(2).as_integer(),
            ));
            it.advance().expect("advance");
        }
        assert_eq!(seen, [(1, 2, 3), (4, 5, 6), (7, 8, 9)]);
        assert!(it.at_end());
        assert_eq!(rows.end(), End);
    }

    #[test]
    fn calling_begin_twice_skips_a_row() {
        let db = stuff();
        let mut st = db.prepare("SELECT column1 FROM stuff").expect("prepare");
        let mut rows = IterRows::new(&mut st);
        {
            let first = rows.begin().expect("first begin");
            assert_eq!(first.row().get(0).as_integer(), 1);
        }
        let second = rows.begin().expect("second begin");
        assert_eq!(second.row().get(0).as_integer(), 4);
    }

    #[test]
    fn next_row_lends_each_row() {
        let db = stuff();
        let mut st = db.prepare("SELECT column2 FROM stuff").expect("prepare");
        let mut rows = IterRows::new(&mut st);
        let mut total = 0;
        while let Some(row) = rows.next_row() {
            total += row.expect("row").get(0).as_integer();
        }
        assert_eq!(total, 2 + 5 + 8);
        assert!(rows.next_row().is_none());
    }

    #[test]
    fn next_row_and_begin_both_rerun_a_finished_statement() {
        let db = stuff();
        let mut st = db.prepare("SELECT column1 FROM stuff").expect("prepare");
        st.run_to_completion().expect("first run");
        assert_eq!(st.state(), StatementState::Done);

        let mut rows = IterRows::new(&mut st);
        let first = rows.next_row().expect("a row").expect("step");
        assert_eq!(first.get(0).as_integer(), 1);
        while rows.next_row().is_some() {}
        assert!(rows.next_row().is_none());
        assert_eq!(rows.statement().state(), StatementState::Done);

        let mut again = IterRows::new(&mut st);
        let it = again.begin().expect("begin");
        assert_eq!(it.row().get(0).as_integer(), 1);
    }

    #[test]
    fn step_error_surfaces_from_begin() {
        let db = Connection::open_in_memory().expect("open in-memory db");
        db.exec("CREATE TABLE t (x NOT NULL)").expect("create");
        let mut st = db
            .prepare("INSERT INTO t VALUES (NULL) RETURNING x")
            .expect("prepare");
        let mut rows = IterRows::new(&mut st);
        let err = rows.begin().expect_err("constraint violation");
        assert_eq!(err, ErrorCondition::Constraint);
    }

    #[test]
    #[should_panic(expected = "finished row-iterator")]
    fn dereferencing_end_panics() {
        let db = stuff();
        let mut st = db.prepare("SELECT * FROM stuff WHERE 0").expect("prepare");
        let mut rows = IterRows::new(&mut st);
        let it = rows.begin().expect("begin");
        assert!(it == End);
        let _ = it.row();
    }
}
