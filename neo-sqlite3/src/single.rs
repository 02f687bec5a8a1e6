//! Pulling exactly one result row from a statement.

use crate::errc::ErrorCode;
use crate::error::Error;
use crate::row::FromRow;
use crate::statement::Statement;
use crate::Result;

impl Statement<'_> {
    fn raise(&self, code: ErrorCode, context: &'static str) -> Error {
        if code.is_error() {
            Error::with_db_message(code, context, self.connection().error_message())
        } else {
            Error::new(code, context)
        }
    }

    /// Steps once and unpacks the row, then steps again to check that the
    /// statement is finished. The statement is not reset.
    ///
    /// Returns `None` if the first step reports `done`.
    ///
    /// # Errors
    /// If the first step fails, or if the second step produces another row
    /// or fails. In the second case the error carries the code of the second
    /// step.
    pub fn unpack_single_opt<T: for<'r> FromRow<'r>>(&mut self) -> Result<Option<T>> {
        let first = self.step();
        if first.is_error() {
            return Err(self.raise(
                first.code(),
                "Failed to pull a single element for a statement result for unpack_single_opt",
            ));
        }
        if first.code() != ErrorCode::Row {
            return Ok(None);
        }
        let value = self.row().unpack::<T>();
        let second = self.step();
        if second.code() != ErrorCode::Done {
            return Err(self.raise(
                second.code(),
                "More than one element is available for a statement result for \
                 unpack_single_opt, or an error occurred",
            ));
        }
        Ok(Some(value))
    }

    /// Like [`unpack_single_opt`](Self::unpack_single_opt), but an empty
    /// result is an error.
    ///
    /// ```
    /// # use neo_sqlite3::Connection;
    /// let db = Connection::open_in_memory().throw_if_error()?;
    /// let mut st = db.prepare("VALUES (1, 'one')").throw_if_error()?;
    /// let (n, name): (i64, String) = st.unpack_single()?;
    /// assert_eq!((n, name.as_str()), (1, "one"));
    /// # Ok::<(), neo_sqlite3::Error>(())
    /// ```
    ///
    /// # Errors
    /// As `unpack_single_opt`, plus code `done` if there is no row.
    pub fn unpack_single<T: for<'r> FromRow<'r>>(&mut self) -> Result<T> {
        self.unpack_single_opt()?.ok_or_else(|| {
            Error::new(
                ErrorCode::Done,
                "Attempt to pull a single item from a query that is empty/exhausted.",
            )
        })
    }
}
