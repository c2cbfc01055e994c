//! # Key Domain
//!
//! Snapshot of key values that already exist, keyed by table then column.
//! Foreign keys draw their candidate values from the owner's entry here.
//! As owners are materialized, their generated row keys can be recorded so
//! dependent tables see them (owners first, dependents after).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{KeyweaveError, Result};

/// Already-known key values: table name → column name → values.
///
/// A table with no entry is one whose keys are still to be generated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyDomain {
    tables: IndexMap<String, IndexMap<String, Vec<i64>>>,
}

impl KeyDomain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `{"table": {"column": [1, 2, 3]}}` JSON snapshot.
    pub fn from_json_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| KeyweaveError::Config {
            message: format!("Failed to parse key domain: {}", e),
        })
    }

    /// Replace the values known for `table.column`.
    pub fn insert(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        values: impl IntoIterator<Item = i64>,
    ) {
        self.tables
            .entry(table.into())
            .or_default()
            .insert(column.into(), values.into_iter().collect());
    }

    /// Builder form of [`KeyDomain::insert`].
    pub fn with(
        mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        values: impl IntoIterator<Item = i64>,
    ) -> Self {
        self.insert(table, column, values);
        self
    }

    /// Append every value of the given row key dictionaries to `table`.
    pub fn record_rows<'a>(
        &mut self,
        table: &str,
        rows: impl IntoIterator<Item = &'a IndexMap<String, i64>>,
    ) {
        let entry = self.tables.entry(table.to_string()).or_default();
        for row in rows {
            for (column, value) in row {
                entry.entry(column.clone()).or_default().push(*value);
            }
        }
    }

    pub fn column(&self, table: &str, column: &str) -> Option<&[i64]> {
        self.tables
            .get(table)
            .and_then(|columns| columns.get(column))
            .map(Vec::as_slice)
    }

    pub fn table(&self, table: &str) -> Option<&IndexMap<String, Vec<i64>>> {
        self.tables.get(table)
    }

    pub fn contains_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let domain = KeyDomain::new()
            .with("users", "id", 1..=3)
            .with("orders", "id", vec![10, 11]);

        assert_eq!(domain.column("users", "id"), Some(&[1, 2, 3][..]));
        assert_eq!(domain.column("orders", "id"), Some(&[10, 11][..]));
        assert_eq!(domain.column("users", "email"), None);
        assert_eq!(domain.column("ghost", "id"), None);
        assert!(domain.contains_table("orders"));
        assert_eq!(domain.table_names(), vec!["users", "orders"]);
    }

    #[test]
    fn test_record_rows_appends() {
        let mut domain = KeyDomain::new().with("a", "id", vec![1]);
        let rows: Vec<IndexMap<String, i64>> = (2..=3)
            .map(|id| [("id".to_string(), id)].into_iter().collect())
            .collect();
        domain.record_rows("a", &rows);
        assert_eq!(domain.column("a", "id"), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn test_from_json_str() {
        let domain = KeyDomain::from_json_str(r#"{"a": {"id": [1, 2]}, "b": {"id": []}}"#).unwrap();
        assert_eq!(domain.column("a", "id"), Some(&[1, 2][..]));
        assert_eq!(domain.column("b", "id"), Some(&[][..]));
        assert!(KeyDomain::from_json_str("[1, 2]").is_err());
    }
}
