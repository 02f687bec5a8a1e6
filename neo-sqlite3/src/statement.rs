//! Safe wrapper around a `SQLite` prepared statement.
//!
//! This file contains **no `unsafe` code**. All FFI interaction is delegated to
//! [`ffi::RawStmt`] which encapsulates the raw pointers and C type conversions.
//!
//! # Step state machine
//!
//! A statement is always in one of three [`StatementState`]s:
//!
//! * **Idle** -- freshly prepared or reset; may be stepped or rebound.
//! * **Busy** -- the last step produced a row; column reads are valid.
//! * **Done** -- the last step finished execution (or failed); there is no
//!   current row.
//!
//! [`Statement::step`] moves between them. The engine's `misuse` code means
//! this layer drove the engine through an invalid call sequence, which is a
//! bug rather than a recoverable condition, so it panics.

use std::borrow::Cow;
use std::ops::{Deref, DerefMut};

use crate::binding::BindingAccess;
use crate::column::ColumnAccess;
use crate::connection::ConnectionRef;
use crate::errable::Errable;
use crate::errc::ErrorCode;
use crate::ffi::{self, RawStmt};
use crate::row::Row;

/// Execution state of a [`Statement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementState {
    /// No unconsumed row; can be stepped or rebound.
    Idle,
    /// A row is available.
    Busy,
    /// Execution finished; no row is available.
    Done,
}

/// A prepared `SQLite` statement.
///
/// Created via [`ConnectionRef::prepare`]. Tied to the lifetime of the
/// connection that created it. Finalized when dropped.
pub struct Statement<'db> {
    raw: RawStmt,
    db: &'db ConnectionRef,
    state: StatementState,
}

impl<'db> Statement<'db> {
    pub(crate) const fn new(raw: RawStmt, db: &'db ConnectionRef) -> Self {
        Self {
            raw,
            db,
            state: StatementState::Idle,
        }
    }

    /// Advances the statement by one step.
    ///
    /// Returns code `row` when a row is available, `done` when execution
    /// finished, or an error. After an error the statement should be reset
    /// before reuse.
    ///
    /// # Panics
    /// If the engine reports `misuse`.
    pub fn step(&mut self) -> Errable<'db> {
        if self.state == StatementState::Idle {
            log::trace!("stepping [[{}]]", self.sql());
        }
        let rc = self.raw.step();
        assert!(
            rc != ffi::SQLITE_MISUSE,
            "sqlite3_step() reported misuse for [[{}]]: {}",
            self.sql(),
            self.db.error_message()
        );
        let code = ErrorCode::from_raw(rc);
        self.state = if code == ErrorCode::Row {
            StatementState::Busy
        } else {
            StatementState::Done
        };
        if code.is_error() {
            Errable::error(
                code,
                Some(Cow::Borrowed("sqlite3_step() failed")),
                Some(self.db),
            )
        } else {
            Errable::with_code(code, ())
        }
    }

    /// Returns the statement to the idle state.
    ///
    /// Bindings are kept; use [`BindingAccess::clear`] to unbind them. The
    /// engine's return code is ignored since it only repeats the outcome of
    /// the last step.
    pub fn reset(&mut self) {
        self.raw.reset();
        self.state = StatementState::Idle;
    }

    /// Steps until `done`, discarding rows. Returns the first error.
    pub fn run_to_completion(&mut self) -> Errable<'db> {
        loop {
            let e = self.step();
            if e != ErrorCode::Row {
                return e;
            }
        }
    }

    /// `true` while a row is available.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state == StatementState::Busy
    }

    /// The current execution state.
    #[must_use]
    pub const fn state(&self) -> StatementState {
        self.state
    }

    /// Returns a guard that resets the statement when dropped.
    pub fn auto_reset(&mut self) -> AutoReset<'_, 'db> {
        AutoReset { stmt: self }
    }

    /// The current row. Reading from it requires the statement to be busy.
    #[must_use]
    pub fn row(&self) -> Row<'_> {
        Row::new(self)
    }

    /// Parameter bindings.
    pub fn bindings(&mut self) -> BindingAccess<'_, 'db> {
        BindingAccess::new(self)
    }

    /// Result column metadata.
    #[must_use]
    pub fn columns(&self) -> ColumnAccess<'_> {
        ColumnAccess::new(&self.raw)
    }

    /// The connection this statement was prepared on.
    #[must_use]
    pub const fn connection(&self) -> &'db ConnectionRef {
        self.db
    }

    /// The SQL text this statement was compiled from.
    #[must_use]
    pub fn sql(&self) -> &str {
        self.raw.sql()
    }

    /// The SQL text with the current bindings substituted.
    #[must_use]
    pub fn expanded_sql(&self) -> Option<String> {
        self.raw.expanded_sql()
    }

    pub(crate) const fn raw(&self) -> &RawStmt {
        &self.raw
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Resets the borrowed statement when dropped.
///
/// Guarantees the statement returns to idle even if the caller stops
/// consuming rows early or unwinds mid-iteration.
pub struct AutoReset<'s, 'db> {
    stmt: &'s mut Statement<'db>,
}

impl<'db> Deref for AutoReset<'_, 'db> {
    type Target = Statement<'db>;

    fn deref(&self) -> &Statement<'db> {
        self.stmt
    }
}

impl<'db> DerefMut for AutoReset<'_, 'db> {
    fn deref_mut(&mut self) -> &mut Statement<'db> {
        self.stmt
    }
}

impl Drop for AutoReset<'_, '_> {
    fn drop(&mut self) {
        self.stmt.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errc::ErrorCondition;
    use crate::Connection;

    fn seeded() -> Connection {
        let db = Connection::open_in_memory().expect("open in-memory db");
        db.exec(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, val TEXT);
             INSERT INTO t (val) VALUES ('a'), ('b');",
        )
        .expect("seed");
        db
    }

    #[test]
    fn state_machine() {
        let db = seeded();
        let mut st = db.prepare("SELECT val FROM t ORDER BY id").expect("prepare");
        assert_eq!(st.state(), StatementState::Idle);
        assert_eq!(st.step(), ErrorCode::Row);
        assert!(st.is_busy());
        assert_eq!(st.step(), ErrorCode::Row);
        assert_eq!(st.step(), ErrorCode::Done);
        assert_eq!(st.state(), StatementState::Done);
        assert!(!st.is_busy());

        st.reset();
        assert_eq!(st.state(), StatementState::Idle);
        assert_eq!(st.step(), ErrorCode::Row);
        assert_eq!(st.row().get(0).as_text(), "a");
    }

    #[test]
    fn run_to_completion_stops_at_done() {
        let db = seeded();
        let mut st = db.prepare("SELECT * FROM t").expect("prepare");
        let e = st.run_to_completion();
        assert!(!e.is_error());
        assert_eq!(e, ErrorCode::Done);
        assert!(!st.is_busy());
    }

    #[test]
    fn step_error_is_returned() {
        let db = seeded();
        db.exec("CREATE TABLE u (x NOT NULL)").expect("create");
        let mut st = db.prepare("INSERT INTO u VALUES (NULL)").expect("prepare");
        let e = st.step();
        assert_eq!(e.code(), ErrorCode::ConstraintNotNull);
        assert_eq!(e, ErrorCondition::Constraint);
        assert!(!st.is_busy());
    }

    #[test]
    fn auto_reset_on_scope_exit() {
        let db = seeded();
        let mut st = db.prepare("SELECT val FROM t").expect("prepare");
        {
            let mut guard = st.auto_reset();
            assert_eq!(guard.step(), ErrorCode::Row);
            assert!(guard.is_busy());
        }
        assert_eq!(st.state(), StatementState::Idle);
    }

    #[test]
    fn sql_and_expanded_sql() {
        let db = seeded();
        let mut st = db.prepare("SELECT ?1 + 1").expect("prepare");
        st.bindings().at(1).set(&41).expect("bind");
        assert_eq!(st.sql(), "SELECT ?1 + 1");
        assert_eq!(st.expanded_sql().as_deref(), Some("SELECT 41 + 1"));
        assert!(std::ptr::eq(st.connection(), &*db));
    }

    #[test]
    #[should_panic(expected = "no current row")]
    fn reading_row_after_done_panics() {
        let db = seeded();
        let mut st = db.prepare("SELECT val FROM t WHERE 0").expect("prepare");
        assert_eq!(st.step(), ErrorCode::Done);
        let _ = st.row().get(0);
    }
}
