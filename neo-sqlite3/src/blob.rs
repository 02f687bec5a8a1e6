//! Incremental BLOB I/O.

use std::borrow::Cow;
use std::os::raw::c_int;

use crate::connection::ConnectionRef;
use crate::errable::Errable;
use crate::errc::ErrorCode;
use crate::ffi::RawBlob;

/// Access mode of a [`BlobIo`] handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlobMode {
    /// Reads only.
    ReadOnly,
    /// Reads and writes.
    #[default]
    ReadWrite,
}

/// A handle for reading and writing one BLOB value in place.
///
/// Writes cannot change the size of the BLOB; reserve space first with a
/// [`ZeroBlob`](crate::ZeroBlob) binding or the SQL `zeroblob()` function.
/// Closed on drop.
pub struct BlobIo<'db> {
    raw: RawBlob,
    db: &'db ConnectionRef,
}

fn offset_of<'db>(offset: usize, db: &'db ConnectionRef) -> Result<c_int, Errable<'db>> {
    c_int::try_from(offset).map_err(|_| {
        Errable::error(
            ErrorCode::TooBig,
            Some(Cow::Borrowed("BLOB offset is out of range")),
            Some(db),
        )
    })
}

impl<'db> BlobIo<'db> {
    pub(crate) fn open(
        db: &'db ConnectionRef,
        schema: &str,
        table: &str,
        column: &str,
        rowid: i64,
        mode: BlobMode,
    ) -> Errable<'db, Self> {
        log::debug!("opening BLOB {schema}.{table}.{column} at rowid {rowid} ({mode:?})");
        match db
            .raw()
            .blob_open(schema, table, column, rowid, mode == BlobMode::ReadWrite)
        {
            Ok(raw) => Errable::new(Self { raw, db }),
            Err(rc) => Errable::error(
                ErrorCode::from_raw(rc),
                Some(Cow::Borrowed("Failed to open BLOB handle")),
                Some(db),
            ),
        }
    }

    /// The size of the BLOB in bytes.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        usize::try_from(self.raw.bytes()).unwrap_or(0)
    }

    /// Fills `buf` from the BLOB starting at `offset`. Reading past the end
    /// fails without reading anything.
    pub fn read_into(&self, offset: usize, buf: &mut [u8]) -> Errable<'db> {
        let offset = match offset_of(offset, self.db) {
            Ok(offset) => offset,
            Err(e) => return e,
        };
        Errable::from_rc(
            self.raw.read(buf, offset),
            Some(Cow::Borrowed("Failed to read from BLOB")),
            Some(self.db),
        )
    }

    /// Writes `data` into the BLOB at `offset`.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Errable<'db> {
        let offset = match offset_of(offset, self.db) {
            Ok(offset) => offset,
            Err(e) => return e,
        };
        Errable::from_rc(
            self.raw.write(data, offset),
            Some(Cow::Borrowed("Failed to write to BLOB")),
            Some(self.db),
        )
    }

    /// Moves the handle to the same column of another row.
    pub fn reopen(&mut self, rowid: i64) -> Errable<'db> {
        Errable::from_rc(
            self.raw.reopen(rowid),
            Some(Cow::Borrowed("Failed to reopen BLOB handle")),
            Some(self.db),
        )
    }
}

impl std::fmt::Debug for BlobIo<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobIo")
            .field("byte_size", &self.byte_size())
            .finish_non_exhaustive()
    }
}
