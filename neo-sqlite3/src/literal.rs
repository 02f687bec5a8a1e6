//! Identity-keyed SQL text.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// SQL text living in a `static`, compared by the address of that `static`.
///
/// Two literals with identical text written at different call sites are
/// distinct keys. Create them with [`sql!`](crate::sql), which gives every
/// expansion its own `static`. The type is neither `Clone` nor `Copy`, so a
/// `&'static SqlLiteral` is the only way to refer to one.
pub struct SqlLiteral {
    text: &'static str,
}

impl SqlLiteral {
    #[doc(hidden)]
    #[must_use]
    pub const fn new(text: &'static str) -> Self {
        Self { text }
    }

    /// The SQL text.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.text
    }

    fn addr(&self) -> *const Self {
        self
    }
}

impl PartialEq for SqlLiteral {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for SqlLiteral {}

impl PartialOrd for SqlLiteral {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SqlLiteral {
    fn cmp(&self, other: &Self) -> Ordering {
        self.addr().cmp(&other.addr())
    }
}

impl Hash for SqlLiteral {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl AsRef<str> for SqlLiteral {
    fn as_ref(&self) -> &str {
        self.text
    }
}

impl fmt::Debug for SqlLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sql!({:?})", self.text)
    }
}

impl fmt::Display for SqlLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

/// Creates a `&'static SqlLiteral` unique to this call site.
///
/// ```
/// use neo_sqlite3::{sql, SqlLiteral};
///
/// fn query() -> &'static SqlLiteral {
///     sql!("SELECT 1")
/// }
///
/// assert_eq!(query(), query());
/// assert_ne!(query(), sql!("SELECT 1"));
/// assert_eq!(query().as_str(), "SELECT 1");
/// ```
#[macro_export]
macro_rules! sql {
    ($text:literal) => {{
        static LITERAL: $crate::SqlLiteral = $crate::SqlLiteral::new($text);
        &LITERAL
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_call_sites_are_distinct_keys() {
        let foo = sql!("foo");
        let bar = sql!("bar");
        assert_ne!(foo, bar);
        assert!(foo < bar || bar < foo);

        let same_text = sql!("foo");
        assert_ne!(foo, same_text);
        assert_eq!(foo.as_str(), same_text.as_str());
    }

    #[test]
    fn same_call_site_is_same_key() {
        let keys: Vec<&'static SqlLiteral> = (0..3).map(|_| sql!("SELECT 12")).collect();
        assert!(keys.iter().all(|k| *k == keys[0]));
        assert_eq!(format!("{:?}", keys[0]), "sql!(\"SELECT 12\")");
        assert_eq!(keys[0].to_string(), "SELECT 12");
    }
}
