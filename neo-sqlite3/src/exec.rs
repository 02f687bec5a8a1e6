//! Execution helpers: reset, rebind and run a statement in one call.

use std::borrow::Cow;

use crate::binding::BindTuple;
use crate::errable::{check, Errable};
use crate::errc::ErrorCode;
use crate::iter_rows::IterRows;
use crate::iter_tuples::IterTuples;
use crate::row::{FromRow, Row, TypedRow};
use crate::statement::Statement;
use crate::value::FromValue;
use crate::Result;

impl<'db> Statement<'db> {
    /// Resets the statement and binds `params` to slots `1..=n`.
    ///
    /// Slots beyond `params` keep their previous values.
    pub fn reset_and_bind<P: BindTuple + ?Sized>(&mut self, params: &P) -> Errable<'db> {
        self.reset();
        self.bindings().bind_all(params)
    }

    /// Resets, rebinds and runs the statement to completion, discarding rows.
    ///
    /// ```
    /// # use neo_sqlite3::Connection;
    /// let db = Connection::open_in_memory().throw_if_error()?;
    /// db.exec("CREATE TABLE foo (value)").throw_if_error()?;
    /// let mut insert = db.prepare("INSERT INTO foo VALUES (?)").throw_if_error()?;
    /// insert.exec(&(2,)).throw_if_error()?;
    /// insert.exec(&(55,)).throw_if_error()?;
    /// assert_eq!(db.total_changes(), 2);
    /// # Ok::<(), neo_sqlite3::Error>(())
    /// ```
    pub fn exec<P: BindTuple + ?Sized>(&mut self, params: &P) -> Errable<'db> {
        check!(self.reset_and_bind(params));
        self.run_to_completion()
    }

    /// Resets and rebinds, then returns a range over the result rows.
    pub fn exec_rows<P: BindTuple + ?Sized>(
        &mut self,
        params: &P,
    ) -> Errable<'db, IterRows<'_, 'db>> {
        check!(self.reset_and_bind(params));
        Errable::new(IterRows::new(self))
    }

    /// Resets and rebinds, then returns a range over the result rows
    /// unpacked into `T`.
    pub fn exec_tuples<T, P: BindTuple + ?Sized>(
        &mut self,
        params: &P,
    ) -> Errable<'db, IterTuples<'_, 'db, T>> {
        check!(self.reset_and_bind(params));
        Errable::new(IterTuples::new(self))
    }

    /// Runs the statement once per element of `rows`, rebinding each time.
    /// Stops at the first failure. Returns code `done` otherwise.
    pub fn exec_each<I>(&mut self, rows: I) -> Errable<'db>
    where
        I: IntoIterator,
        I::Item: BindTuple,
    {
        for params in rows {
            check!(self.exec(&params));
        }
        Errable::with_code(ErrorCode::Done, ())
    }

    /// Steps once and returns the new row.
    ///
    /// When the statement finishes instead, the result has code `done` and
    /// no value.
    pub fn next_row(&mut self) -> Errable<'db, Row<'_>> {
        let (code, ()) = check!(self.step());
        if code != ErrorCode::Row {
            return Errable::without_value(
                code,
                Some(Cow::Borrowed("Statement has no more rows")),
            );
        }
        Errable::with_code(code, Row::new(&*self))
    }

    /// [`next_row`](Self::next_row) with the row typed as `T`.
    pub fn next_typed<T>(&mut self) -> Errable<'db, TypedRow<'_, T>> {
        self.next_row().map(Row::typed)
    }

    /// Resets, rebinds and unpacks the first result row into `T`. The
    /// statement is reset again before returning.
    ///
    /// An empty result has code `done` and no value.
    pub fn try_one_row<T, P>(&mut self, params: &P) -> Errable<'db, T>
    where
        T: for<'r> FromRow<'r>,
        P: BindTuple + ?Sized,
    {
        check!(self.reset_and_bind(params));
        let mut st = self.auto_reset();
        let row = st.next_row().map(|row| row.unpack());
        drop(st);
        row
    }

    /// Throwing form of [`try_one_row`](Self::try_one_row).
    ///
    /// # Errors
    /// If binding or stepping fails, or with code `done` if there is no row.
    pub fn one_row<T, P>(&mut self, params: &P) -> Result<T>
    where
        T: for<'r> FromRow<'r>,
        P: BindTuple + ?Sized,
    {
        self.try_one_row(params).throw_if_error()
    }

    /// The first column of the first result row. See
    /// [`try_one_row`](Self::try_one_row).
    pub fn try_one_cell<T, P>(&mut self, params: &P) -> Errable<'db, T>
    where
        T: for<'r> FromValue<'r>,
        P: BindTuple + ?Sized,
    {
        self.try_one_row::<(T,), P>(params).map(|(value,)| value)
    }

    /// Throwing form of [`try_one_cell`](Self::try_one_cell).
    ///
    /// # Errors
    /// If binding or stepping fails, or with code `done` if there is no row.
    pub fn one_cell<T, P>(&mut self, params: &P) -> Result<T>
    where
        T: for<'r> FromValue<'r>,
        P: BindTuple + ?Sized,
    {
        self.try_one_cell(params).throw_if_error()
    }
}
