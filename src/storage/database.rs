//! Storage backend contract
//!
//! The merge engine only needs a minimal relational capability: plain
//! statement execution, bound statement execution and small queries. Each
//! concrete backend provides one adapter implementing [`Database`].

use crate::Result;

/// A bound parameter or a returned column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
}

impl SqlValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::Integer(i64::from(v))
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Minimal relational backend used by the store.
///
/// Transaction control goes through [`Database::execute`] with
/// `BEGIN IMMEDIATE`, `COMMIT` and `ROLLBACK`.
pub trait Database {
    /// Execute a statement without parameters (DDL, set-based DML,
    /// transaction control).
    fn execute(&self, sql: &str) -> Result<()>;

    /// Execute a prepared statement with bound parameters, returning the
    /// number of affected rows.
    fn execute_bound(&self, sql: &str, params: &[SqlValue]) -> Result<usize>;

    /// Run a query returning a single integer (counts, ids).
    fn query_scalar(&self, sql: &str, params: &[SqlValue]) -> Result<i64>;

    /// Run a query and collect every row.
    fn query_rows(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Vec<SqlValue>>>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(SqlValue::from(5u32), SqlValue::Integer(5));
        assert_eq!(SqlValue::from("foo"), SqlValue::Text("foo".to_string()));
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::Integer(3).as_i64(), Some(3));
        assert_eq!(SqlValue::Null.as_str(), None);
    }
}
