//! Result column metadata.
//!
//! Origin, table and database names need an engine built with column
//! metadata (the `column-metadata` feature). Without it, or for columns that
//! are expressions rather than table columns, those accessors return an
//! empty string instead of failing.

use std::os::raw::c_int;

use crate::ffi::RawStmt;

/// The result columns of a prepared statement.
#[derive(Clone, Copy)]
pub struct ColumnAccess<'s> {
    raw: &'s RawStmt,
}

impl<'s> ColumnAccess<'s> {
    pub(crate) const fn new(raw: &'s RawStmt) -> Self {
        Self { raw }
    }

    /// The number of result columns.
    #[must_use]
    pub fn count(&self) -> usize {
        usize::try_from(self.raw.column_count()).unwrap_or(0)
    }

    /// The column at zero-based `index`.
    ///
    /// # Panics
    /// If `index` is out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Column<'s> {
        let count = self.count();
        assert!(
            index < count,
            "Column index {index} is out of range for a statement with {count} columns"
        );
        Column {
            raw: self.raw,
            index: c_int::try_from(index).unwrap_or(c_int::MAX),
        }
    }

    /// Iterates over every column.
    pub fn iter(&self) -> impl Iterator<Item = Column<'s>> + 's {
        let this = *self;
        (0..self.count()).map(move |i| this.get(i))
    }
}

impl std::fmt::Debug for ColumnAccess<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter().map(|c| c.name())).finish()
    }
}

/// Metadata for a single result column.
#[derive(Clone, Copy)]
pub struct Column<'s> {
    raw: &'s RawStmt,
    index: c_int,
}

impl<'s> Column<'s> {
    /// Zero-based position of the column.
    #[must_use]
    pub fn index(&self) -> usize {
        usize::try_from(self.index).unwrap_or(0)
    }

    /// The column name as it appears in the result (honoring `AS`).
    #[must_use]
    pub fn name(&self) -> &'s str {
        self.raw.column_name(self.index).unwrap_or_default()
    }

    /// The declared type of the originating table column, if any.
    #[must_use]
    pub fn decl_type(&self) -> Option<&'s str> {
        self.raw.column_decltype(self.index)
    }

    /// The name of the originating table column.
    #[must_use]
    pub fn origin_name(&self) -> &'s str {
        #[cfg(feature = "column-metadata")]
        {
            self.raw.column_origin_name(self.index).unwrap_or_default()
        }
        #[cfg(not(feature = "column-metadata"))]
        {
            ""
        }
    }

    /// The name of the originating table.
    #[must_use]
    pub fn table_name(&self) -> &'s str {
        #[cfg(feature = "column-metadata")]
        {
            self.raw.column_table_name(self.index).unwrap_or_default()
        }
        #[cfg(not(feature = "column-metadata"))]
        {
            ""
        }
    }

    /// The schema name (`main`, `temp`, or an attached name) of the
    /// originating table.
    #[must_use]
    pub fn database_name(&self) -> &'s str {
        #[cfg(feature = "column-metadata")]
        {
            self.raw.column_database_name(self.index).unwrap_or_default()
        }
        #[cfg(not(feature = "column-metadata"))]
        {
            ""
        }
    }
}

impl std::fmt::Debug for Column<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("index", &self.index)
            .field("name", &self.name())
            .field("decl_type", &self.decl_type())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::Connection;

    #[test]
    fn names_and_decl_types() {
        let db = Connection::open_in_memory().expect("open in-memory db");
        db.exec("CREATE TABLE person (id INTEGER PRIMARY KEY, name TEXT)")
            .expect("create");
        let st = db
            .prepare("SELECT id, name AS who, 1 + 1 FROM person")
            .expect("prepare");
        let cols = st.columns();
        assert_eq!(cols.count(), 3);
        let names: Vec<&str> = cols.iter().map(|c| c.name()).collect();
        assert_eq!(names, ["id", "who", "1 + 1"]);
        assert_eq!(cols.get(1).decl_type(), Some("TEXT"));
        assert_eq!(cols.get(2).decl_type(), None);
    }

    #[cfg(feature = "column-metadata")]
    #[test]
    fn origin_metadata() {
        let db = Connection::open_in_memory().expect("open in-memory db");
        db.exec("CREATE TABLE person (id INTEGER PRIMARY KEY, name TEXT)")
            .expect("create");
        let st = db
            .prepare("SELECT name AS who, 42 FROM person")
            .expect("prepare");
        let who = st.columns().get(0);
        assert_eq!(who.name(), "who");
        assert_eq!(who.origin_name(), "name");
        assert_eq!(who.table_name(), "person");
        assert_eq!(who.database_name(), "main");

        let expr = st.columns().get(1);
        assert_eq!(expr.origin_name(), "");
        assert_eq!(expr.table_name(), "");
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn column_index_past_count_panics() {
        let db = Connection::open_in_memory().expect("open in-memory db");
        let st = db.prepare("SELECT 1").expect("prepare");
        let _ = st.columns().get(1);
    }
}
