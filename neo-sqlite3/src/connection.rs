//! Safe wrapper around a `SQLite` database connection.
//!
//! This file contains **no `unsafe` code**. All FFI interaction is delegated to
//! [`ffi::RawDb`] which encapsulates the raw pointers and C type conversions.
//!
//! [`Connection`] owns the handle and closes it when dropped. Most operations
//! live on [`ConnectionRef`], which `Connection` dereferences to, so helpers
//! can accept `&ConnectionRef` without caring who owns the handle.

use std::borrow::Cow;
use std::ops::Deref;
use std::path::Path;
use std::time::Duration;

use crate::blob::{BlobIo, BlobMode};
use crate::config::{OpenMode, OpenOptions};
use crate::errable::{check, Errable};
use crate::errc::ErrorCode;
use crate::error::Result;
use crate::ffi::{RawDb, RawInterrupt};
use crate::statement::Statement;
use crate::transaction::{TransactionBehavior, TransactionGuard};

/// A borrowed view of an open connection.
///
/// Only ever handed out by reference (`&ConnectionRef`); it cannot be
/// constructed or closed on its own. Not `Sync`: all access must happen from
/// one thread at a time.
pub struct ConnectionRef {
    raw: RawDb,
}

/// An open `SQLite` database connection.
///
/// Move-only; closed when dropped. Dereferences to [`ConnectionRef`].
pub struct Connection {
    inner: ConnectionRef,
}

impl Connection {
    /// Opens (or creates) a read-write database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Errable<'static, Self> {
        Self::open_with_mode(path, OpenMode::default())
    }

    /// Opens a database with explicit open flags.
    ///
    /// Extended result codes are enabled on every connection. If the open
    /// fails, the half-open handle is closed before the error is returned.
    ///
    /// A path that is not valid UTF-8 fails with `cant_open` rather than
    /// being rewritten into a different filename.
    pub fn open_with_mode(path: impl AsRef<Path>, mode: OpenMode) -> Errable<'static, Self> {
        let path = path.as_ref();
        let Some(filename) = path.to_str() else {
            log::warn!("refusing to open non-UTF-8 path {}", path.display());
            return Errable::error(
                ErrorCode::CantOpen,
                Some(Cow::Owned(format!(
                    "Failed to open SQLite connection [[{}]]: path is not valid UTF-8",
                    path.display()
                ))),
                None,
            );
        };
        log::debug!("opening SQLite database {filename:?} with {mode:?}");
        match RawDb::open(filename, mode.bits()) {
            Ok(raw) => Errable::new(Self {
                inner: ConnectionRef { raw },
            }),
            Err((rc, message)) => {
                log::warn!("failed to open SQLite database {filename:?}: {message}");
                Errable::error(
                    ErrorCode::from_raw(rc),
                    Some(Cow::Owned(format!(
                        "Failed to open SQLite connection [[{filename}]]"
                    ))),
                    None,
                )
            }
        }
    }

    /// Opens a database and applies `options` (busy timeout and PRAGMAs).
    ///
    /// # Errors
    /// If the open fails or any configuration statement fails.
    pub fn open_with(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self> {
        let conn = Self::open_with_mode(path, options.mode()).throw_if_error()?;
        options.apply(&conn)?;
        Ok(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Errable<'static, Self> {
        Self::open(":memory:")
    }

    /// Opens a private on-disk temporary database, deleted when closed.
    pub fn open_temporary() -> Errable<'static, Self> {
        Self::open("")
    }
}

impl Deref for Connection {
    type Target = ConnectionRef;

    fn deref(&self) -> &ConnectionRef {
        &self.inner
    }
}

impl AsRef<ConnectionRef> for Connection {
    fn as_ref(&self) -> &ConnectionRef {
        &self.inner
    }
}

impl ConnectionRef {
    /// Compiles the first statement in `sql`.
    ///
    /// Text without any statement (empty, or only whitespace and comments)
    /// is reported as an `error` code rather than producing a null statement.
    pub fn prepare(&self, sql: &str) -> Errable<'_, Statement<'_>> {
        match self.raw.prepare(sql) {
            Ok(Some(raw)) => Errable::new(Statement::new(raw, self)),
            Ok(None) => Errable::error(
                ErrorCode::Error,
                Some(Cow::Borrowed("SQL text contains no statement")),
                None,
            ),
            Err(rc) => {
                log::warn!("failed to prepare [[{sql}]]: {}", self.error_message());
                Errable::error(
                    ErrorCode::from_raw(rc),
                    Some(Cow::Borrowed("Failure while preparing database statement")),
                    Some(self),
                )
            }
        }
    }

    /// Executes one or more semicolon-separated statements, discarding any
    /// result rows. Suitable for DDL, PRAGMAs and scripts.
    pub fn exec(&self, sql: &str) -> Errable<'_> {
        log::debug!("exec [[{sql}]]");
        Errable::from_rc(
            self.raw.exec(sql),
            Some(Cow::Borrowed("sqlite3_exec() failed")),
            Some(self),
        )
    }

    /// Begins a deferred transaction.
    ///
    /// # Errors
    /// If `BEGIN` fails (for example because a transaction is already open).
    pub fn transaction(&self) -> Result<TransactionGuard<'_>> {
        TransactionGuard::begin(self)
    }

    /// Begins an immediate transaction (acquires a RESERVED lock right away).
    ///
    /// # Errors
    /// If `BEGIN IMMEDIATE` fails.
    pub fn transaction_immediate(&self) -> Result<TransactionGuard<'_>> {
        TransactionGuard::begin_with(self, TransactionBehavior::Immediate)
    }

    /// `true` if the connection is inside an explicit transaction.
    #[must_use]
    pub fn is_transaction_active(&self) -> bool {
        !self.raw.get_autocommit()
    }

    /// Returns the rowid of the most recent successful INSERT.
    #[must_use]
    pub fn last_insert_rowid(&self) -> i64 {
        self.raw.last_insert_rowid()
    }

    /// Returns the number of rows changed by the most recent statement.
    #[must_use]
    pub fn changes(&self) -> usize {
        usize::try_from(self.raw.changes()).unwrap_or(0)
    }

    /// Returns the number of rows changed since the connection was opened.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        usize::try_from(self.raw.total_changes()).unwrap_or(0)
    }

    /// The engine's message for the most recent failure on this connection.
    #[must_use]
    pub fn error_message(&self) -> String {
        self.raw.errmsg()
    }

    /// `true` if the `main` database is read-only.
    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.is_readonly_db("main").unwrap_or(false)
    }

    /// Whether the attached database `name` is read-only; `None` if no such
    /// database is attached.
    #[must_use]
    pub fn is_readonly_db(&self, name: &str) -> Option<bool> {
        match self.raw.db_readonly(name) {
            0 => Some(false),
            1 => Some(true),
            _ => None,
        }
    }

    /// Filename of the `main` database. Empty for in-memory and temporary
    /// databases.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        self.filename_of("main")
    }

    /// Filename of the attached database `name`; `None` if no such database
    /// is attached.
    #[must_use]
    pub fn filename_of(&self, name: &str) -> Option<String> {
        self.raw.db_filename(name)
    }

    /// Sets how long a statement waits on a locked database before failing
    /// with `busy`.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Errable<'_> {
        let ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        Errable::from_rc(
            self.raw.busy_timeout(ms),
            Some(Cow::Borrowed("sqlite3_busy_timeout() failed")),
            Some(self),
        )
    }

    /// Attaches the database file `filename` under the schema name `name`.
    pub fn attach(&self, filename: &str, name: &str) -> Errable<'_> {
        log::debug!("attaching {filename:?} as {name:?}");
        let (_, mut st) = check!(self.prepare("ATTACH DATABASE ? AS ?"));
        check!(st.bindings().bind_all(&(filename, name)));
        st.run_to_completion()
    }

    /// Detaches the database previously attached as `name`.
    pub fn detach(&self, name: &str) -> Errable<'_> {
        log::debug!("detaching {name:?}");
        let (_, mut st) = check!(self.prepare("DETACH DATABASE ?"));
        check!(st.bindings().bind_all(&(name,)));
        st.run_to_completion()
    }

    /// Asks the engine to abort any in-progress step on this connection at
    /// its next opportunity. The interrupted step fails with `interrupt`.
    ///
    /// The flag only sticks while some statement on the connection is
    /// running; with none running it is cleared by the next step. To cancel
    /// from another thread, use [`interrupt_handle`](Self::interrupt_handle).
    pub fn interrupt(&self) {
        self.raw.interrupt();
    }

    /// A `Send + Sync` handle that can interrupt this connection from any
    /// thread, and that becomes a no-op once the connection is closed.
    #[must_use]
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            raw: self.raw.interrupt_handle(),
        }
    }

    /// Opens a read-write incremental BLOB handle on `main.table.column` at
    /// `rowid`.
    pub fn open_blob(&self, table: &str, column: &str, rowid: i64) -> Errable<'_, BlobIo<'_>> {
        BlobIo::open(self, "main", table, column, rowid, BlobMode::ReadWrite)
    }

    /// Opens an incremental BLOB handle on `db.table.column` at `rowid`.
    pub fn open_blob_in(
        &self,
        db: &str,
        table: &str,
        column: &str,
        rowid: i64,
        mode: BlobMode,
    ) -> Errable<'_, BlobIo<'_>> {
        BlobIo::open(self, db, table, column, rowid, mode)
    }

    pub(crate) const fn raw(&self) -> &RawDb {
        &self.raw
    }
}

/// Interrupts a connection from any thread.
///
/// Obtained from [`ConnectionRef::interrupt_handle`]. The handle does not
/// keep the connection open.
///
/// ```
/// # use neo_sqlite3::Connection;
/// let db = Connection::open_in_memory().throw_if_error()?;
/// let handle = db.interrupt_handle();
/// std::thread::spawn(move || handle.interrupt()).join().unwrap();
/// # Ok::<(), neo_sqlite3::Error>(())
/// ```
#[derive(Clone)]
pub struct InterruptHandle {
    raw: RawInterrupt,
}

impl InterruptHandle {
    /// Interrupts whatever the connection is stepping, if it is still open.
    pub fn interrupt(&self) {
        self.raw.interrupt();
    }

    /// `true` once the connection has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.raw.is_closed()
    }
}

impl std::fmt::Debug for InterruptHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl std::fmt::Debug for ConnectionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRef")
            .field("filename", &self.filename())
            .field("transaction_active", &self.is_transaction_active())
            .field("total_changes", &self.total_changes())
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("filename", &self.filename())
            .field("transaction_active", &self.is_transaction_active())
            .finish_non_exhaustive()
    }
}
