//! Safe, typed wrapper over the `SQLite` C API.
//!
//! This crate provides a thin, checked layer over the engine bundled by
//! `libsqlite3-sys`:
//!
//! * **Results**: every engine-calling operation returns an [`Errable`],
//!   which carries the exact extended [`ErrorCode`] (including the non-error
//!   `row` and `done` codes) and converts into a [`Result`] with
//!   [`Errable::throw_if_error`].
//! * **Statements**: [`Statement`] tracks the idle/busy/done step state.
//!   Reading a row outside the busy state, or an engine `misuse` report,
//!   is a bug in the caller or in this crate and panics.
//! * **Values**: parameters are bound from any [`Bindable`] (or a tuple of
//!   them), and columns are read through [`ValueRef`] and [`FromValue`].
//! * **Helpers**: [`IterRows`], [`IterTuples`], the `exec*`, `one_*` and
//!   `unpack_single*` statement methods, a [`StatementCache`] keyed by
//!   [`sql!`] call site, and [`TransactionGuard`] scopes.
//!
//! The `ffi` module is the **only** file that contains `unsafe` code or C
//! types.
//!
//! ```
//! use neo_sqlite3::{Connection, Error};
//!
//! let db = Connection::open_in_memory().throw_if_error()?;
//! db.exec("CREATE TABLE person (name TEXT, age INTEGER)").throw_if_error()?;
//!
//! let mut insert = db.prepare("INSERT INTO person VALUES (?, ?)").throw_if_error()?;
//! insert
//!     .exec_each([("Joe", 24), ("Amy", 18)])
//!     .throw_if_error()?;
//!
//! let mut oldest = db
//!     .prepare("SELECT name FROM person ORDER BY age DESC LIMIT 1")
//!     .throw_if_error()?;
//! let name: String = oldest.one_cell(&())?;
//! assert_eq!(name, "Joe");
//! # Ok::<(), Error>(())
//! ```

mod ffi;

mod binding;
mod blob;
mod column;
mod config;
mod connection;
mod errable;
pub mod errc;
pub mod error;
mod exec;
mod iter_rows;
mod iter_tuples;
mod literal;
mod row;
mod single;
mod statement;
mod statement_cache;
mod transaction;
pub mod value;

pub use binding::{
    BindTuple, BindValue, Bindable, Binding, BindingAccess, BlobView, Null, StaticText, ZeroBlob,
};
pub use blob::{BlobIo, BlobMode};
pub use column::{Column, ColumnAccess};
pub use config::{JournalMode, OpenMode, OpenOptions, Synchronous};
pub use connection::{Connection, ConnectionRef, InterruptHandle};
pub use errable::Errable;
pub use errc::{ErrorCode, ErrorCondition};
pub use error::{Error, ErrorInfo, Result};
pub use iter_rows::{End, IterRows, RowCursor};
pub use iter_tuples::{IterTuples, TupleCursor};
pub use literal::SqlLiteral;
pub use row::{FromRow, Row, TypedRow};
pub use statement::{AutoReset, Statement, StatementState};
pub use statement_cache::StatementCache;
pub use transaction::{
    with_transaction, RecursiveTransactionGuard, TransactionBehavior, TransactionGuard,
};
pub use value::{FromValue, Value, ValueRef, ValueType};
