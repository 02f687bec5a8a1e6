//! Raw FFI bindings to `SQLite`, resolved through `libsqlite3-sys`.
//!
//! The engine is the bundled amalgamation compiled by `libsqlite3-sys`. This
//! module is the **only** file that contains `unsafe` code or C types: every
//! handle is wrapped in an owning type ([`RawDb`], [`RawStmt`], [`RawBlob`])
//! and every C string crossing the boundary is converted here.
//!
//! Result codes are returned as plain `c_int` values. Interpreting them is the
//! job of the safe layer ([`crate::errc`]).

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_uchar, c_void};
use std::ptr::{self, NonNull};
use std::sync::{Arc, Mutex, PoisonError};

use libsqlite3_sys as sys;

// `libsqlite3-sys` blocklists `sqlite3_close_v2` from its generated bindings,
// but the bundled amalgamation still exports the symbol.
extern "C" {
    fn sqlite3_close_v2(db: *mut sys::sqlite3) -> c_int;
}

// ── SQLite constants ────────────────────────────────────────────────────

pub const SQLITE_OK: c_int = sys::SQLITE_OK;
pub const SQLITE_MISUSE: c_int = sys::SQLITE_MISUSE;
pub const SQLITE_NOMEM: c_int = sys::SQLITE_NOMEM;
pub const SQLITE_TOOBIG: c_int = sys::SQLITE_TOOBIG;

// Column type constants
pub const SQLITE_INTEGER: c_int = sys::SQLITE_INTEGER;
pub const SQLITE_FLOAT: c_int = sys::SQLITE_FLOAT;
pub const SQLITE_TEXT: c_int = sys::SQLITE_TEXT;
pub const SQLITE_BLOB: c_int = sys::SQLITE_BLOB;

// Open flags
pub const SQLITE_OPEN_READONLY: c_int = sys::SQLITE_OPEN_READONLY;
pub const SQLITE_OPEN_READWRITE: c_int = sys::SQLITE_OPEN_READWRITE;
pub const SQLITE_OPEN_CREATE: c_int = sys::SQLITE_OPEN_CREATE;
pub const SQLITE_OPEN_URI: c_int = sys::SQLITE_OPEN_URI;
pub const SQLITE_OPEN_MEMORY: c_int = sys::SQLITE_OPEN_MEMORY;
pub const SQLITE_OPEN_NOMUTEX: c_int = sys::SQLITE_OPEN_NOMUTEX;
pub const SQLITE_OPEN_FULLMUTEX: c_int = sys::SQLITE_OPEN_FULLMUTEX;
pub const SQLITE_OPEN_SHAREDCACHE: c_int = sys::SQLITE_OPEN_SHAREDCACHE;
pub const SQLITE_OPEN_PRIVATECACHE: c_int = sys::SQLITE_OPEN_PRIVATECACHE;
pub const SQLITE_OPEN_NOFOLLOW: c_int = sys::SQLITE_OPEN_NOFOLLOW;

/// Returns the engine's static English description of a result code.
pub fn errstr(code: c_int) -> &'static str {
    // SAFETY: sqlite3_errstr returns a pointer to a static, NUL-terminated
    // string for every input value.
    let ptr = unsafe { sys::sqlite3_errstr(code) };
    if ptr.is_null() {
        return "unknown error";
    }
    // SAFETY: see above; the string lives for the whole program.
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .unwrap_or("unknown error")
}

/// Copies a possibly-null C string into an owned `String`.
///
/// # Safety
/// `ptr` must be null or point to a valid NUL-terminated string.
unsafe fn owned_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Borrows a possibly-null C string owned by `SQLite`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for `'a`.
unsafe fn borrowed_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        None
    } else {
        CStr::from_ptr(ptr).to_str().ok()
    }
}

/// Builds a byte slice from an engine-owned pointer and length.
///
/// # Safety
/// `data` must be null or valid for reads of `len` bytes for `'a`.
unsafe fn borrowed_bytes<'a>(data: *const c_void, len: c_int) -> &'a [u8] {
    let len = usize::try_from(len).unwrap_or(0);
    if data.is_null() || len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(data.cast::<u8>(), len)
    }
}

// ── Connection handle ───────────────────────────────────────────────────

/// Owning wrapper around a `sqlite3*` handle. Closed on drop.
pub struct RawDb {
    ptr: NonNull<sys::sqlite3>,
    // Shared with every `RawInterrupt`; nulled under the lock before close.
    interrupt: Arc<Mutex<*mut sys::sqlite3>>,
}

// SAFETY: the bundled engine is compiled in serialized threading mode, so the
// handle may be moved to (and used from) another thread.
unsafe impl Send for RawDb {}

impl RawDb {
    /// Opens a connection with extended result codes enabled.
    ///
    /// On failure the half-open handle is closed and the extended result
    /// code plus the engine's diagnostic are returned.
    pub fn open(filename: &str, flags: c_int) -> Result<Self, (c_int, String)> {
        let c_filename = CString::new(filename)
            .map_err(|_| (SQLITE_MISUSE, "filename contains a NUL byte".to_owned()))?;
        let mut db: *mut sys::sqlite3 = ptr::null_mut();
        // SAFETY: valid C string and out-pointer; a null VFS selects the default.
        let rc = unsafe {
            sys::sqlite3_open_v2(c_filename.as_ptr(), &mut db, flags, ptr::null())
        };
        let Some(ptr) = NonNull::new(db) else {
            return Err((SQLITE_NOMEM, errstr(SQLITE_NOMEM).to_owned()));
        };
        // SAFETY: `ptr` is a handle returned by sqlite3_open_v2.
        unsafe { sys::sqlite3_extended_result_codes(ptr.as_ptr(), 1) };
        let raw = Self {
            ptr,
            interrupt: Arc::new(Mutex::new(ptr.as_ptr())),
        };
        if rc != SQLITE_OK {
            let code = raw.extended_errcode();
            let message = raw.errmsg();
            drop(raw);
            return Err((code, message));
        }
        Ok(raw)
    }

    /// Executes one or more semicolon-separated SQL statements.
    pub fn exec(&self, sql: &str) -> c_int {
        let Ok(c_sql) = CString::new(sql) else {
            return SQLITE_MISUSE;
        };
        // SAFETY: valid handle and C string; no callback, no errmsg out-param.
        unsafe {
            sys::sqlite3_exec(
                self.ptr.as_ptr(),
                c_sql.as_ptr(),
                None,
                ptr::null_mut(),
                ptr::null_mut(),
            )
        }
    }

    /// Compiles the first statement in `sql`.
    ///
    /// Returns `Ok(None)` when `sql` contains no statement (empty text or
    /// only comments).
    pub fn prepare(&self, sql: &str) -> Result<Option<RawStmt>, c_int> {
        let n_byte = c_int::try_from(sql.len()).map_err(|_| SQLITE_TOOBIG)?;
        let mut stmt: *mut sys::sqlite3_stmt = ptr::null_mut();
        // SAFETY: `sql` is valid for `n_byte` bytes; the engine does not need
        // a terminator when the length is given.
        let rc = unsafe {
            sys::sqlite3_prepare_v2(
                self.ptr.as_ptr(),
                sql.as_ptr().cast::<c_char>(),
                n_byte,
                &mut stmt,
                ptr::null_mut(),
            )
        };
        if rc != SQLITE_OK {
            return Err(rc);
        }
        Ok(NonNull::new(stmt).map(|ptr| RawStmt { ptr }))
    }

    /// Most recent error message on this connection.
    pub fn errmsg(&self) -> String {
        // SAFETY: valid handle; the returned string is owned by SQLite and
        // copied before any further call.
        unsafe { owned_str(sys::sqlite3_errmsg(self.ptr.as_ptr())) }.unwrap_or_default()
    }

    pub fn extended_errcode(&self) -> c_int {
        // SAFETY: valid handle.
        unsafe { sys::sqlite3_extended_errcode(self.ptr.as_ptr()) }
    }

    pub fn changes(&self) -> i64 {
        // SAFETY: valid handle.
        unsafe { sys::sqlite3_changes64(self.ptr.as_ptr()) }
    }

    pub fn total_changes(&self) -> i64 {
        // SAFETY: valid handle.
        unsafe { sys::sqlite3_total_changes64(self.ptr.as_ptr()) }
    }

    pub fn last_insert_rowid(&self) -> i64 {
        // SAFETY: valid handle.
        unsafe { sys::sqlite3_last_insert_rowid(self.ptr.as_ptr()) }
    }

    pub fn get_autocommit(&self) -> bool {
        // SAFETY: valid handle.
        unsafe { sys::sqlite3_get_autocommit(self.ptr.as_ptr()) != 0 }
    }

    pub fn interrupt(&self) {
        // SAFETY: valid handle; sqlite3_interrupt is safe to call at any time.
        unsafe { sys::sqlite3_interrupt(self.ptr.as_ptr()) }
    }

    pub fn interrupt_handle(&self) -> RawInterrupt {
        RawInterrupt(Arc::clone(&self.interrupt))
    }

    pub fn busy_timeout(&self, ms: c_int) -> c_int {
        // SAFETY: valid handle.
        unsafe { sys::sqlite3_busy_timeout(self.ptr.as_ptr(), ms) }
    }

    /// `1` for read-only, `0` for read-write, `-1` if `name` is not attached.
    pub fn db_readonly(&self, name: &str) -> c_int {
        let Ok(c_name) = CString::new(name) else {
            return -1;
        };
        // SAFETY: valid handle and C string.
        unsafe { sys::sqlite3_db_readonly(self.ptr.as_ptr(), c_name.as_ptr()) }
    }

    /// Filename of the attached database `name`; `None` if no such database.
    pub fn db_filename(&self, name: &str) -> Option<String> {
        let c_name = CString::new(name).ok()?;
        // SAFETY: valid handle and C string; the result is copied immediately.
        unsafe { owned_str(sys::sqlite3_db_filename(self.ptr.as_ptr(), c_name.as_ptr())) }
    }

    /// Opens an incremental BLOB handle.
    pub fn blob_open(
        &self,
        db: &str,
        table: &str,
        column: &str,
        rowid: i64,
        writable: bool,
    ) -> Result<RawBlob, c_int> {
        let to_c = |s: &str| CString::new(s).map_err(|_| SQLITE_MISUSE);
        let (c_db, c_table, c_column) = (to_c(db)?, to_c(table)?, to_c(column)?);
        let mut blob: *mut sys::sqlite3_blob = ptr::null_mut();
        // SAFETY: valid handle, C strings and out-pointer.
        let rc = unsafe {
            sys::sqlite3_blob_open(
                self.ptr.as_ptr(),
                c_db.as_ptr(),
                c_table.as_ptr(),
                c_column.as_ptr(),
                rowid,
                c_int::from(writable),
                &mut blob,
            )
        };
        let raw = NonNull::new(blob).map(|ptr| RawBlob { ptr });
        if rc != SQLITE_OK {
            // A handle (if any) is released by RawBlob's Drop.
            drop(raw);
            return Err(rc);
        }
        raw.ok_or(SQLITE_NOMEM)
    }
}

impl Drop for RawDb {
    fn drop(&mut self) {
        // Holding the lock across the close keeps a concurrent interrupt from
        // seeing a freed handle.
        let mut shared = self
            .interrupt
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *shared = ptr::null_mut();
        // SAFETY: the handle was returned by sqlite3_open_v2 and is closed
        // exactly once. close_v2 defers the close if statements remain.
        let rc = unsafe { sqlite3_close_v2(self.ptr.as_ptr()) };
        drop(shared);
        if rc != SQLITE_OK {
            log::warn!("sqlite3_close_v2 returned {rc}");
        }
    }
}

/// A thread-safe way to call `sqlite3_interrupt` on a connection that may
/// have been closed. Interrupting a closed connection does nothing.
#[derive(Clone)]
pub struct RawInterrupt(Arc<Mutex<*mut sys::sqlite3>>);

// SAFETY: the pointer is only read under the mutex, and only passed to
// sqlite3_interrupt, which may be called from any thread while the handle is
// open. RawDb nulls it under the same mutex before closing.
unsafe impl Send for RawInterrupt {}
// SAFETY: as above.
unsafe impl Sync for RawInterrupt {}

impl RawInterrupt {
    pub fn interrupt(&self) {
        let db = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !db.is_null() {
            // SAFETY: non-null means the handle is still open; see above.
            unsafe { sys::sqlite3_interrupt(*db) }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).is_null()
    }
}

// ── Statement handle ────────────────────────────────────────────────────

/// Owning wrapper around a `sqlite3_stmt*` handle. Finalized on drop.
///
/// Byte slices returned by the column accessors borrow `self`; the safe
/// layer guarantees that no slice survives a `step` or `reset`.
pub struct RawStmt {
    ptr: NonNull<sys::sqlite3_stmt>,
}

impl RawStmt {
    fn as_ptr(&self) -> *mut sys::sqlite3_stmt {
        self.ptr.as_ptr()
    }

    pub fn step(&self) -> c_int {
        // SAFETY: valid statement handle.
        unsafe { sys::sqlite3_step(self.as_ptr()) }
    }

    pub fn reset(&self) -> c_int {
        // SAFETY: valid statement handle.
        unsafe { sys::sqlite3_reset(self.as_ptr()) }
    }

    pub fn clear_bindings(&self) -> c_int {
        // SAFETY: valid statement handle.
        unsafe { sys::sqlite3_clear_bindings(self.as_ptr()) }
    }

    // ── Parameter binding ───────────────────────────────────────────────

    pub fn bind_int64(&self, index: c_int, value: i64) -> c_int {
        // SAFETY: valid statement handle; index is range-checked by SQLite.
        unsafe { sys::sqlite3_bind_int64(self.as_ptr(), index, value) }
    }

    pub fn bind_double(&self, index: c_int, value: f64) -> c_int {
        // SAFETY: valid statement handle.
        unsafe { sys::sqlite3_bind_double(self.as_ptr(), index, value) }
    }

    pub fn bind_null(&self, index: c_int) -> c_int {
        // SAFETY: valid statement handle.
        unsafe { sys::sqlite3_bind_null(self.as_ptr(), index) }
    }

    pub fn bind_zeroblob(&self, index: c_int, size: u64) -> c_int {
        // SAFETY: valid statement handle.
        unsafe { sys::sqlite3_bind_zeroblob64(self.as_ptr(), index, size) }
    }

    /// Binds a BLOB; SQLite copies the bytes before returning.
    pub fn bind_blob(&self, index: c_int, value: &[u8]) -> c_int {
        // SAFETY: `value` is valid for `len` bytes for the duration of the
        // call and SQLITE_TRANSIENT makes SQLite take a private copy.
        unsafe {
            sys::sqlite3_bind_blob64(
                self.as_ptr(),
                index,
                value.as_ptr().cast::<c_void>(),
                value.len() as u64,
                sys::SQLITE_TRANSIENT(),
            )
        }
    }

    /// Binds UTF-8 text; SQLite copies the bytes before returning.
    pub fn bind_text(&self, index: c_int, value: &str) -> c_int {
        // SAFETY: as for bind_blob.
        unsafe {
            sys::sqlite3_bind_text64(
                self.as_ptr(),
                index,
                value.as_ptr().cast::<c_char>(),
                value.len() as u64,
                sys::SQLITE_TRANSIENT(),
                sys::SQLITE_UTF8 as c_uchar,
            )
        }
    }

    /// Binds UTF-8 text without copying. The text is `'static`, so it
    /// outlives every use the statement can make of it.
    pub fn bind_static_text(&self, index: c_int, value: &'static str) -> c_int {
        // SAFETY: the buffer lives for the whole program, which satisfies the
        // SQLITE_STATIC contract.
        unsafe {
            sys::sqlite3_bind_text64(
                self.as_ptr(),
                index,
                value.as_ptr().cast::<c_char>(),
                value.len() as u64,
                sys::SQLITE_STATIC(),
                sys::SQLITE_UTF8 as c_uchar,
            )
        }
    }

    pub fn bind_parameter_count(&self) -> c_int {
        // SAFETY: valid statement handle.
        unsafe { sys::sqlite3_bind_parameter_count(self.as_ptr()) }
    }

    /// 1-based index of a named parameter, or `0` if there is none.
    pub fn bind_parameter_index(&self, name: &str) -> c_int {
        let Ok(c_name) = CString::new(name) else {
            return 0;
        };
        // SAFETY: valid statement handle and C string.
        unsafe { sys::sqlite3_bind_parameter_index(self.as_ptr(), c_name.as_ptr()) }
    }

    pub fn bind_parameter_name(&self, index: c_int) -> Option<&str> {
        // SAFETY: the name is owned by the statement and lives as long as it.
        unsafe { borrowed_str(sys::sqlite3_bind_parameter_name(self.as_ptr(), index)) }
    }

    // ── Column reading ──────────────────────────────────────────────────

    pub fn column_count(&self) -> c_int {
        // SAFETY: valid statement handle.
        unsafe { sys::sqlite3_column_count(self.as_ptr()) }
    }

    pub fn column_type(&self, col: c_int) -> c_int {
        // SAFETY: valid statement handle; out-of-range columns yield NULL.
        unsafe { sys::sqlite3_column_type(self.as_ptr(), col) }
    }

    pub fn column_int64(&self, col: c_int) -> i64 {
        // SAFETY: valid statement handle.
        unsafe { sys::sqlite3_column_int64(self.as_ptr(), col) }
    }

    pub fn column_double(&self, col: c_int) -> f64 {
        // SAFETY: valid statement handle.
        unsafe { sys::sqlite3_column_double(self.as_ptr(), col) }
    }

    /// UTF-8 text of a column, converting numeric values as SQLite does.
    pub fn column_text(&self, col: c_int) -> &[u8] {
        // SAFETY: sqlite3_column_text must be called before
        // sqlite3_column_bytes. The buffer stays valid until the next
        // step/reset, which requires `&mut` access in the safe layer.
        unsafe {
            let data = sys::sqlite3_column_text(self.as_ptr(), col);
            let len = sys::sqlite3_column_bytes(self.as_ptr(), col);
            borrowed_bytes(data.cast::<c_void>(), len)
        }
    }

    pub fn column_blob(&self, col: c_int) -> &[u8] {
        // SAFETY: as for column_text.
        unsafe {
            let data = sys::sqlite3_column_blob(self.as_ptr(), col);
            let len = sys::sqlite3_column_bytes(self.as_ptr(), col);
            borrowed_bytes(data, len)
        }
    }

    pub fn column_name(&self, col: c_int) -> Option<&str> {
        // SAFETY: the name is owned by the statement and valid until it is
        // finalized or the column is renamed by re-preparation.
        unsafe { borrowed_str(sys::sqlite3_column_name(self.as_ptr(), col)) }
    }

    pub fn column_decltype(&self, col: c_int) -> Option<&str> {
        // SAFETY: as for column_name.
        unsafe { borrowed_str(sys::sqlite3_column_decltype(self.as_ptr(), col)) }
    }

    #[cfg(feature = "column-metadata")]
    pub fn column_origin_name(&self, col: c_int) -> Option<&str> {
        // SAFETY: as for column_name.
        unsafe { borrowed_str(sys::sqlite3_column_origin_name(self.as_ptr(), col)) }
    }

    #[cfg(feature = "column-metadata")]
    pub fn column_table_name(&self, col: c_int) -> Option<&str> {
        // SAFETY: as for column_name.
        unsafe { borrowed_str(sys::sqlite3_column_table_name(self.as_ptr(), col)) }
    }

    #[cfg(feature = "column-metadata")]
    pub fn column_database_name(&self, col: c_int) -> Option<&str> {
        // SAFETY: as for column_name.
        unsafe { borrowed_str(sys::sqlite3_column_database_name(self.as_ptr(), col)) }
    }

    /// The SQL text the statement was compiled from.
    pub fn sql(&self) -> &str {
        // SAFETY: the text is owned by the statement.
        unsafe { borrowed_str(sys::sqlite3_sql(self.as_ptr())) }.unwrap_or_default()
    }

    /// The SQL text with current bindings substituted.
    pub fn expanded_sql(&self) -> Option<String> {
        // SAFETY: the returned buffer is allocated by SQLite, copied, then
        // released with sqlite3_free.
        unsafe {
            let ptr = sys::sqlite3_expanded_sql(self.as_ptr());
            let out = owned_str(ptr);
            sys::sqlite3_free(ptr.cast::<c_void>());
            out
        }
    }
}

impl Drop for RawStmt {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by sqlite3_prepare_v2 and is
        // finalized exactly once. The return code repeats the last step error.
        unsafe { sys::sqlite3_finalize(self.as_ptr()) };
    }
}

// ── Incremental BLOB handle ─────────────────────────────────────────────

/// Owning wrapper around a `sqlite3_blob*` handle. Closed on drop.
pub struct RawBlob {
    ptr: NonNull<sys::sqlite3_blob>,
}

impl RawBlob {
    pub fn bytes(&self) -> c_int {
        // SAFETY: valid blob handle.
        unsafe { sys::sqlite3_blob_bytes(self.ptr.as_ptr()) }
    }

    pub fn read(&self, buf: &mut [u8], offset: c_int) -> c_int {
        let Ok(n) = c_int::try_from(buf.len()) else {
            return SQLITE_TOOBIG;
        };
        // SAFETY: `buf` is valid for writes of `n` bytes; SQLite bounds-checks
        // `offset + n` against the BLOB size.
        unsafe {
            sys::sqlite3_blob_read(
                self.ptr.as_ptr(),
                buf.as_mut_ptr().cast::<c_void>(),
                n,
                offset,
            )
        }
    }

    pub fn write(&self, data: &[u8], offset: c_int) -> c_int {
        let Ok(n) = c_int::try_from(data.len()) else {
            return SQLITE_TOOBIG;
        };
        // SAFETY: `data` is valid for reads of `n` bytes.
        unsafe {
            sys::sqlite3_blob_write(
                self.ptr.as_ptr(),
                data.as_ptr().cast::<c_void>(),
                n,
                offset,
            )
        }
    }

    pub fn reopen(&self, rowid: i64) -> c_int {
        // SAFETY: valid blob handle.
        unsafe { sys::sqlite3_blob_reopen(self.ptr.as_ptr(), rowid) }
    }
}

impl Drop for RawBlob {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by sqlite3_blob_open and is closed
        // exactly once.
        unsafe { sys::sqlite3_blob_close(self.ptr.as_ptr()) };
    }
}
