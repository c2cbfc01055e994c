//! # Error Types
//!
//! Defines `KeyweaveError`, the unified error enum for every failure mode in
//! key sequencing and foreign-key assignment. Every variant names the table,
//! column, owner or bounds involved so a failure can be debugged from the
//! message alone.
//!
//! Failures fall into two groups. Configuration errors come from the inputs
//! the caller chose (bounds, selection flags, schema descriptions). Domain
//! consistency errors come from a Key Domain snapshot that does not cover
//! what the schema graph references.

use thiserror::Error;

/// All errors that can occur in keyweave operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyweaveError {
    #[error("Invalid sequence bounds: start {start} is greater than stop {stop}")]
    InvalidBounds { start: i64, stop: i64 },

    #[error("Sequences need at least one dimension (got 0 labels or n = 0)")]
    ZeroDimension,

    #[error("Key selection cannot be both 'only primary' and 'exclude primary'")]
    ConflictingSelection,

    #[error("Ambiguous bounds for table '{table}': explicit start/stop cannot be combined with a key domain\n  Bounds are derived from the key domain; drop start/stop or drop the domain")]
    AmbiguousBounds { table: String },

    #[error("Table '{table}' has no primary key\n  Every table must be uniquely identifiable to receive generated keys")]
    MissingPrimaryKey { table: String },

    #[error("Table '{table}' is declared more than once in the schema graph")]
    DuplicateTable { table: String },

    #[error("Table '{table}' does not exist in the schema graph")]
    UnknownTable { table: String },

    #[error("Key column {table}.{column} is not one of the table's declared columns")]
    UndeclaredKeyColumn { table: String, column: String },

    #[error("Foreign key {table}.{column} references table '{owner_table}', which does not exist in the schema graph")]
    UnknownOwnerTable {
        table: String,
        column: String,
        owner_table: String,
    },

    #[error("Foreign key {table}.{column} references {owner_table}.{owner_column}, but '{owner_table}' has no column '{owner_column}'")]
    UnknownOwnerColumn {
        table: String,
        column: String,
        owner_table: String,
        owner_column: String,
    },

    #[error("Repeat count must be at least 1 (got {repeat})")]
    InvalidRepeat { repeat: usize },

    #[error("Circular dependency detected involving tables: {tables}\n  Supply a key domain for each owner in the cycle instead of relying on an owner-first order")]
    CircularDependency { tables: String },

    #[error("Key domain has no values for {owner_table}.{owner_column}, referenced by {table}.{column}\n  Materialize '{owner_table}' first or add its keys to the domain")]
    MissingDomain {
        table: String,
        column: String,
        owner_table: String,
        owner_column: String,
    },

    #[error("Key domains referenced by {table}.({columns}) share no values; no row could satisfy every foreign key")]
    EmptyDomain { table: String, columns: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl KeyweaveError {
    /// True for errors caused by the caller's inputs: bounds, flags,
    /// sequencer dimensions, schema descriptions and config files.
    pub fn is_configuration(&self) -> bool {
        !self.is_domain_consistency()
    }

    /// True for errors caused by a key domain that does not cover what the
    /// schema graph references.
    pub fn is_domain_consistency(&self) -> bool {
        matches!(
            self,
            KeyweaveError::MissingDomain { .. } | KeyweaveError::EmptyDomain { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, KeyweaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy() {
        assert!(KeyweaveError::ZeroDimension.is_configuration());
        assert!(KeyweaveError::InvalidBounds { start: 3, stop: 1 }.is_configuration());

        let missing = KeyweaveError::MissingDomain {
            table: "b".to_string(),
            column: "id_a".to_string(),
            owner_table: "a".to_string(),
            owner_column: "id".to_string(),
        };
        assert!(missing.is_domain_consistency());
        assert!(!missing.is_configuration());
    }

    #[test]
    fn test_messages_carry_context() {
        let err = KeyweaveError::UnknownOwnerTable {
            table: "orders".to_string(),
            column: "user_id".to_string(),
            owner_table: "users".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("orders.user_id"), "{}", msg);
        assert!(msg.contains("'users'"), "{}", msg);
    }
}
