//! Scope-bound transactions.
//!
//! A [`TransactionGuard`] issues `BEGIN` when created and ends the
//! transaction when dropped: `ROLLBACK` if the thread started panicking after
//! the guard was created, `COMMIT` otherwise. A commit that fails in `Drop`
//! rolls the transaction back and then panics with the commit error, since
//! `Drop` has no other way to report it. Use [`TransactionGuard::commit`] or
//! [`with_transaction`] to receive that failure as an [`Error`] instead.

use std::thread;

use crate::connection::ConnectionRef;
use crate::error::Error;
use crate::Result;

/// How `BEGIN` acquires locks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionBehavior {
    /// Locks are taken on first access.
    #[default]
    Deferred,
    /// A write lock is taken immediately.
    Immediate,
    /// An exclusive lock is taken immediately.
    Exclusive,
}

impl TransactionBehavior {
    const fn begin_sql(self) -> &'static str {
        match self {
            Self::Deferred => "BEGIN",
            Self::Immediate => "BEGIN IMMEDIATE",
            Self::Exclusive => "BEGIN EXCLUSIVE",
        }
    }
}

fn run(db: &ConnectionRef, sql: &'static str) -> Result<()> {
    let mut st = db.prepare(sql).throw_if_error()?;
    st.run_to_completion().throw_if_error()
}

/// An active transaction that ends when the guard is dropped.
#[must_use = "dropping the guard immediately commits the transaction"]
#[derive(Debug)]
pub struct TransactionGuard<'db> {
    db: Option<&'db ConnectionRef>,
    panicking_at_start: bool,
}

impl<'db> TransactionGuard<'db> {
    /// Issues `BEGIN` (deferred).
    ///
    /// # Errors
    /// If `BEGIN` fails, for example inside another transaction.
    pub fn begin(db: &'db ConnectionRef) -> Result<Self> {
        Self::begin_with(db, TransactionBehavior::Deferred)
    }

    /// Issues `BEGIN` with the given locking behavior.
    ///
    /// # Errors
    /// If `BEGIN` fails.
    pub fn begin_with(db: &'db ConnectionRef, behavior: TransactionBehavior) -> Result<Self> {
        log::debug!("transaction begin ({behavior:?})");
        run(db, behavior.begin_sql())?;
        Ok(Self {
            db: Some(db),
            panicking_at_start: thread::panicking(),
        })
    }

    /// Issues `COMMIT`. If it fails, the transaction is rolled back and the
    /// commit error returned.
    ///
    /// # Errors
    /// If `COMMIT` fails.
    ///
    /// # Panics
    /// If the guard was dropped with [`drop_guard`](Self::drop_guard).
    pub fn commit(mut self) -> Result<()> {
        let Some(db) = self.db.take() else {
            panic!("TransactionGuard::commit() on an ended (or dropped) transaction");
        };
        commit_or_undo(db)
    }

    /// Issues `ROLLBACK`.
    ///
    /// # Errors
    /// If `ROLLBACK` fails.
    ///
    /// # Panics
    /// If the guard was dropped with [`drop_guard`](Self::drop_guard).
    pub fn rollback(mut self) -> Result<()> {
        let Some(db) = self.db.take() else {
            panic!("TransactionGuard::rollback() on an ended (or dropped) transaction");
        };
        log::debug!("transaction rollback");
        run(db, "ROLLBACK")
    }

    /// Detaches the guard from the transaction without ending it. The
    /// transaction stays open on the connection.
    pub fn drop_guard(&mut self) {
        self.db = None;
    }

    /// `true` once the guard no longer controls a transaction.
    #[must_use]
    pub const fn is_dropped(&self) -> bool {
        self.db.is_none()
    }
}

fn commit_or_undo(db: &ConnectionRef) -> Result<()> {
    log::debug!("transaction commit");
    let Err(err) = run(db, "COMMIT") else {
        return Ok(());
    };
    if db.is_transaction_active() {
        if let Err(rb) = run(db, "ROLLBACK") {
            log::error!("rollback after failed commit also failed: {rb}");
        }
    }
    Err(err)
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        let Some(db) = self.db.take() else {
            return;
        };
        if thread::panicking() && !self.panicking_at_start {
            log::debug!("transaction rollback while unwinding");
            if let Err(err) = run(db, "ROLLBACK") {
                log::error!(
                    "Rolling back a transaction during a panic failed; the database may be \
                     in an inconsistent state: {err}"
                );
            }
            return;
        }
        if let Err(err) = commit_or_undo(db) {
            if thread::panicking() {
                log::error!("Failed to commit transaction: {err}");
            } else {
                panic!("Failed to commit transaction: {err}");
            }
        }
    }
}

/// A transaction guard that only opens a transaction if none is active.
///
/// Nested scopes can each hold one; only the outermost actually issues
/// `BEGIN` and `COMMIT`/`ROLLBACK`, the rest do nothing.
#[must_use = "dropping the guard immediately ends the transaction"]
#[derive(Debug)]
pub struct RecursiveTransactionGuard<'db> {
    inner: Option<TransactionGuard<'db>>,
}

impl<'db> RecursiveTransactionGuard<'db> {
    /// Begins a transaction unless one is already active.
    ///
    /// # Errors
    /// If `BEGIN` fails.
    pub fn new(db: &'db ConnectionRef) -> Result<Self> {
        let inner = if db.is_transaction_active() {
            None
        } else {
            Some(TransactionGuard::begin(db)?)
        };
        Ok(Self { inner })
    }

    /// Commits if this is the outermost guard.
    ///
    /// # Errors
    /// If `COMMIT` fails.
    pub fn commit(self) -> Result<()> {
        self.inner.map_or(Ok(()), TransactionGuard::commit)
    }

    /// Rolls back if this is the outermost guard.
    ///
    /// # Errors
    /// If `ROLLBACK` fails.
    pub fn rollback(self) -> Result<()> {
        self.inner.map_or(Ok(()), TransactionGuard::rollback)
    }

    /// Detaches from the transaction without ending it.
    pub fn drop_guard(&mut self) {
        if let Some(inner) = &mut self.inner {
            inner.drop_guard();
        }
    }

    /// `true` if this guard does not (or no longer) control a transaction.
    #[must_use]
    pub fn is_dropped(&self) -> bool {
        self.inner.as_ref().map_or(true, TransactionGuard::is_dropped)
    }

    /// `true` if this guard opened the transaction.
    #[must_use]
    pub const fn is_top_transaction(&self) -> bool {
        self.inner.is_some()
    }
}

/// Runs `f` inside a transaction.
///
/// Commits when `f` returns `Ok` (a failed commit is returned as the error),
/// rolls back when it returns `Err` or panics.
///
/// ```
/// use neo_sqlite3::{with_transaction, Connection, Error};
///
/// let db = Connection::open_in_memory().throw_if_error()?;
/// db.exec("CREATE TABLE t (x)").throw_if_error()?;
/// let n = with_transaction(&db, |db| {
///     db.exec("INSERT INTO t VALUES (1), (2)").throw_if_error()?;
///     Ok::<_, Error>(db.changes())
/// })?;
/// assert_eq!(n, 2);
/// # Ok::<(), Error>(())
/// ```
///
/// # Errors
/// If `BEGIN` or `COMMIT` fails, or `f` fails.
pub fn with_transaction<'db, T, E>(
    db: &'db ConnectionRef,
    f: impl FnOnce(&'db ConnectionRef) -> std::result::Result<T, E>,
) -> std::result::Result<T, E>
where
    E: From<Error>,
{
    let guard = TransactionGuard::begin(db)?;
    match f(db) {
        Ok(value) => {
            guard.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rb) = guard.rollback() {
                log::error!("rollback after failed transaction body also failed: {rb}");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use super::*;
    use crate::errc::ErrorCode;
    use crate::Connection;

    fn db_with_table() -> Connection {
        let db = Connection::open_in_memory().expect("open in-memory db");
        db.exec("CREATE TABLE t (x)").expect("create");
        db
    }

    fn count(db: &ConnectionRef) -> i64 {
        let mut st = db.prepare("SELECT count(*) FROM t").expect("prepare");
        st.one_cell(&()).expect("count")
    }

    #[test]
    fn create_and_drop_commits() {
        let db = db_with_table();
        assert!(!db.is_transaction_active());
        {
            let _tr = db.transaction().expect("begin");
            assert!(db.is_transaction_active());
            db.exec("INSERT INTO t VALUES (1)").expect("insert");
        }
        assert!(!db.is_transaction_active());
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn explicit_rollback_discards() {
        let db = db_with_table();
        let tr = db.transaction_immediate().expect("begin");
        db.exec("INSERT INTO t VALUES (1)").expect("insert");
        tr.rollback().expect("rollback");
        assert!(!db.is_transaction_active());
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn panic_rolls_back() {
        let db = db_with_table();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _tr = db.transaction().expect("begin");
            db.exec("INSERT INTO t VALUES (1)").expect("insert");
            panic!("abandon the transaction");
        }));
        assert!(result.is_err());
        assert!(!db.is_transaction_active());
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn begin_inside_transaction_fails() {
        let db = db_with_table();
        let _tr = db.transaction().expect("begin");
        let err = db.transaction().expect_err("nested BEGIN");
        assert_eq!(err, ErrorCode::Error);
    }

    #[test]
    fn drop_guard_leaves_transaction_open() {
        let db = db_with_table();
        let mut tr = TransactionGuard::begin_with(&db, TransactionBehavior::Exclusive)
            .expect("begin");
        tr.drop_guard();
        assert!(tr.is_dropped());
        drop(tr);
        assert!(db.is_transaction_active());
        db.exec("ROLLBACK").expect("manual rollback");
    }

    #[test]
    fn recursive_guard_only_top_level_acts() {
        let db = db_with_table();
        let outer = RecursiveTransactionGuard::new(&db).expect("outer");
        assert!(outer.is_top_transaction());
        {
            let inner = RecursiveTransactionGuard::new(&db).expect("inner");
            assert!(!inner.is_top_transaction());
            assert!(inner.is_dropped());
            db.exec("INSERT INTO t VALUES (1)").expect("insert");
            inner.commit().expect("no-op commit");
        }
        assert!(db.is_transaction_active());
        outer.rollback().expect("rollback");
        assert_eq!(count(&db), 0);
    }

    fn deferred_fk_db() -> Connection {
        let db = Connection::open_in_memory().expect("open in-memory db");
        db.exec(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE parent (id INTEGER PRIMARY KEY);
             CREATE TABLE child (
                 pid INTEGER REFERENCES parent(id) DEFERRABLE INITIALLY DEFERRED
             );",
        )
        .expect("schema");
        db
    }

    #[test]
    fn failed_commit_rolls_back_and_reports() {
        let db = deferred_fk_db();
        let tr = db.transaction().expect("begin");
        db.exec("INSERT INTO child VALUES (42)").expect("deferred insert");
        let err = tr.commit().expect_err("fk violation at commit");
        assert_eq!(err, ErrorCode::ConstraintForeignKey);
        assert!(!db.is_transaction_active());
    }

    #[test]
    #[should_panic(expected = "Failed to commit transaction")]
    fn failed_commit_in_drop_panics() {
        let db = deferred_fk_db();
        let _tr = db.transaction().expect("begin");
        db.exec("INSERT INTO child VALUES (42)").expect("deferred insert");
    }

    #[test]
    fn with_transaction_commits_or_rolls_back() {
        let db = db_with_table();
        let n = with_transaction(&db, |db| {
            db.exec("INSERT INTO t VALUES (1), (2)").throw_if_error()?;
            Ok::<_, Error>(db.changes())
        })
        .expect("commit");
        assert_eq!(n, 2);

        let err = with_transaction(&db, |db| {
            db.exec("INSERT INTO t VALUES (3)").throw_if_error()?;
            Err::<(), _>(Error::new(ErrorCode::Abort, "caller gave up"))
        })
        .expect_err("body error");
        assert_eq!(err.context(), "caller gave up");
        assert!(!db.is_transaction_active());
        assert_eq!(count(&db), 2);
    }
}
