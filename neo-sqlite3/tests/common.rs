//! Common test utilities shared across integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use neo_sqlite3::{Connection, OpenOptions};
use tempfile::TempDir;

/// An in-memory connection with a three-row `stuff (a, b, c)` table.
pub fn stuff_db() -> Connection {
    let db = Connection::open_in_memory().expect("open in-memory db");
    db.exec("CREATE TABLE stuff AS VALUES (1, 2, 'one'), (4, 5, 'two'), (7, 8, 'three')")
        .expect("seed");
    db
}

/// A scratch directory holding one database file, removed on drop.
pub struct TempDb {
    dir: TempDir,
}

impl TempDb {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("test.db")
    }

    /// Opens a new connection to the file with a short busy timeout.
    pub fn connect(&self) -> Connection {
        let options = OpenOptions {
            busy_timeout_ms: Some(10),
            ..OpenOptions::default()
        };
        Connection::open_with(self.path(), &options).expect("open file db")
    }
}

impl Default for TempDb {
    fn default() -> Self {
        Self::new()
    }
}

pub fn count(db: &Connection, table: &str) -> i64 {
    db.prepare(&format!("SELECT count(*) FROM {table}"))
        .expect("prepare count")
        .one_cell(&())
        .expect("count")
}
