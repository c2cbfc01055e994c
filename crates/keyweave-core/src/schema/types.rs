use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{KeyweaveError, Result};

/// The `(owner table, owner column)` a foreign key points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

impl ForeignKeyRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Externally supplied description of one table, before validation.
///
/// The builder methods add key columns to `columns` as they go, so a spec
/// built in code never needs to list them twice. Deserialized specs must
/// list every key column explicitly; `SchemaGraph::new` checks this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    #[serde(default)]
    pub foreign_keys: IndexMap<String, ForeignKeyRef>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_keys: Vec::new(),
            foreign_keys: IndexMap::new(),
        }
    }

    /// Declare a plain column.
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.declare(name.into());
        self
    }

    /// Declare a primary-key column.
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.declare(name.clone());
        if !self.primary_keys.contains(&name) {
            self.primary_keys.push(name);
        }
        self
    }

    /// Declare a foreign-key column referencing `owner_table.owner_column`.
    pub fn foreign_key(
        mut self,
        name: impl Into<String>,
        owner_table: impl Into<String>,
        owner_column: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.declare(name.clone());
        self.foreign_keys
            .insert(name, ForeignKeyRef::new(owner_table, owner_column));
        self
    }

    /// Declare a column that is both a primary key and a foreign key.
    pub fn primary_foreign_key(
        self,
        name: impl Into<String>,
        owner_table: impl Into<String>,
        owner_column: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.primary_key(name.clone())
            .foreign_key(name, owner_table, owner_column)
    }

    fn declare(&mut self, name: String) {
        if !self.columns.contains(&name) {
            self.columns.push(name);
        }
    }
}

/// Which foreign keys of a table to select, relative to its primary keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySelection {
    /// Every foreign key.
    #[default]
    All,
    /// Foreign keys that are also primary keys (primary-foreign keys).
    OnlyPrimary,
    /// Foreign keys that are not primary keys.
    ExcludePrimary,
}

impl KeySelection {
    /// Translate a pair of boolean flags into a selection.
    ///
    /// Both flags set at once cannot be satisfied and is rejected.
    pub fn from_flags(only_primary: bool, exclude_primary: bool) -> Result<Self> {
        match (only_primary, exclude_primary) {
            (true, true) => Err(KeyweaveError::ConflictingSelection),
            (true, false) => Ok(KeySelection::OnlyPrimary),
            (false, true) => Ok(KeySelection::ExcludePrimary),
            (false, false) => Ok(KeySelection::All),
        }
    }

    /// Whether a foreign key with the given primary-key status is selected.
    pub fn admits(self, is_primary: bool) -> bool {
        match self {
            KeySelection::All => true,
            KeySelection::OnlyPrimary => is_primary,
            KeySelection::ExcludePrimary => !is_primary,
        }
    }
}

impl fmt::Display for KeySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySelection::All => write!(f, "all"),
            KeySelection::OnlyPrimary => write!(f, "only_primary"),
            KeySelection::ExcludePrimary => write!(f, "exclude_primary"),
        }
    }
}
