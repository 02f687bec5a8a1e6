//! Prepared statements cached per [`SqlLiteral`] call site.

use std::fmt;

use crate::connection::ConnectionRef;
use crate::error::Error;
use crate::literal::SqlLiteral;
use crate::statement::Statement;
use crate::Result;

struct CachedStatement<'db> {
    key: &'static SqlLiteral,
    stmt: Box<Statement<'db>>,
}

/// Prepares each [`SqlLiteral`] once and hands back the same statement on
/// every later lookup.
///
/// Entries are kept sorted by key address and never evicted. Returned
/// statements keep whatever bindings and step state the previous user left,
/// so reset or rebind before use (the `exec` helpers do both).
///
/// ```
/// use neo_sqlite3::{sql, Connection, StatementCache};
///
/// let db = Connection::open_in_memory().throw_if_error()?;
/// let mut cache = StatementCache::new(&db);
/// db.exec("CREATE TABLE t (x)").throw_if_error()?;
/// for x in 0..3 {
///     cache
///         .lookup_or_prepare(sql!("INSERT INTO t VALUES (?)"))?
///         .exec(&(x,))
///         .throw_if_error()?;
/// }
/// assert_eq!(cache.len(), 1);
/// # Ok::<(), neo_sqlite3::Error>(())
/// ```
pub struct StatementCache<'db> {
    db: &'db ConnectionRef,
    statements: Vec<CachedStatement<'db>>,
}

impl<'db> StatementCache<'db> {
    /// An empty cache for `db`.
    #[must_use]
    pub const fn new(db: &'db ConnectionRef) -> Self {
        Self {
            db,
            statements: Vec::new(),
        }
    }

    /// Returns the statement for `key`, preparing it on first use.
    ///
    /// # Errors
    /// If the statement fails to prepare.
    pub fn lookup_or_prepare(&mut self, key: &'static SqlLiteral) -> Result<&mut Statement<'db>> {
        let pos = self.statements.partition_point(|item| item.key < key);
        let hit = self.statements.get(pos).is_some_and(|item| item.key == key);
        if !hit {
            let stmt = self.db.prepare(key.as_str()).into_result().map_err(|info| {
                Error::with_db_message(
                    info.code(),
                    format!("Failed to prepare statement for caching [[{key}]]"),
                    self.db.error_message(),
                )
            })?;
            log::debug!("cached statement [[{key}]]");
            self.statements.insert(
                pos,
                CachedStatement {
                    key,
                    stmt: Box::new(stmt),
                },
            );
        }
        Ok(&mut *self.statements[pos].stmt)
    }

    /// The number of cached statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// `true` if nothing has been prepared yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// The connection statements are prepared on.
    #[must_use]
    pub const fn connection(&self) -> &'db ConnectionRef {
        self.db
    }
}

impl fmt::Debug for StatementCache<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.statements.iter().map(|item| item.key))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errc::ErrorCondition;
    use crate::{sql, Connection};

    #[test]
    fn same_key_returns_same_statement() {
        let db = Connection::open_in_memory().expect("open in-memory db");
        let mut cache = StatementCache::new(&db);
        assert!(cache.is_empty());

        let q = sql!("SELECT 12");
        let st1: *const Statement<'_> = cache.lookup_or_prepare(q).expect("prepare q");
        let st2: *const Statement<'_> = cache
            .lookup_or_prepare(sql!("VALUES (1)"))
            .expect("prepare values");
        let st3: *const Statement<'_> = cache.lookup_or_prepare(q).expect("lookup q");
        assert_ne!(st1, st2);
        assert_eq!(st1, st3);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn same_text_at_different_sites_is_prepared_twice() {
        let db = Connection::open_in_memory().expect("open in-memory db");
        let mut cache = StatementCache::new(&db);
        let a: *const Statement<'_> = cache.lookup_or_prepare(sql!("SELECT 1")).expect("a");
        let b: *const Statement<'_> = cache.lookup_or_prepare(sql!("SELECT 1")).expect("b");
        assert_ne!(a, b);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn many_keys_stay_addressable() {
        let db = Connection::open_in_memory().expect("open in-memory db");
        let mut cache = StatementCache::new(&db);
        let keys = [
            sql!("SELECT 1"),
            sql!("SELECT 2"),
            sql!("SELECT 3"),
            sql!("SELECT 4"),
            sql!("SELECT 5"),
        ];
        for key in keys.iter().rev() {
            cache.lookup_or_prepare(*key).expect("prepare");
        }
        for (n, key) in (1..).zip(keys) {
            let st = cache.lookup_or_prepare(key).expect("lookup");
            assert_eq!(st.sql(), format!("SELECT {n}"));
        }
        assert_eq!(cache.len(), keys.len());
    }

    #[test]
    fn prepare_failure_names_the_sql() {
        let db = Connection::open_in_memory().expect("open in-memory db");
        let mut cache = StatementCache::new(&db);
        let err = cache
            .lookup_or_prepare(sql!("SELEKT nonsense"))
            .expect_err("syntax error");
        assert_eq!(err, ErrorCondition::Error);
        assert!(err.context().contains("[[SELEKT nonsense]]"));
        assert!(err.db_message().contains("syntax error"));
        assert!(cache.is_empty());
    }
}
