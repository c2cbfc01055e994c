//! # Schema Graph
//!
//! The immutable, validated description of every table the engine may be
//! asked about. Built once from [`TableSpec`]s; every structural mistake
//! (unknown owner tables, missing primary keys, undeclared key columns) is
//! reported here so that no lazy stream ever fails on it later.
//!
//! Foreign keys may form cycles (`a -> b -> c -> d -> a`) or point at their
//! own table. The graph never tries to order or resolve them.

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use std::collections::BTreeSet;

use crate::error::{KeyweaveError, Result};
use crate::schema::types::{ForeignKeyRef, KeySelection, TableSpec};

/// A validated table: ordered columns, primary keys and foreign keys.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: IndexSet<String>,
    primary_keys: IndexSet<String>,
    foreign_keys: IndexMap<String, ForeignKeyRef>,
}

impl Table {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &IndexSet<String> {
        &self.columns
    }

    /// Position of `column` in the declared column order.
    pub fn column_position(&self, column: &str) -> Option<usize> {
        self.columns.get_index_of(column)
    }

    pub fn primary_keys(&self) -> &IndexSet<String> {
        &self.primary_keys
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_keys.contains(column)
    }

    pub fn is_foreign_key(&self, column: &str) -> bool {
        self.foreign_keys.contains_key(column)
    }

    /// Foreign keys selected by `mode`, in declaration order.
    pub fn foreign_keys(&self, mode: KeySelection) -> IndexMap<&str, &ForeignKeyRef> {
        self.foreign_keys
            .iter()
            .filter(|(column, _)| mode.admits(self.is_primary_key(column)))
            .map(|(column, owner)| (column.as_str(), owner))
            .collect()
    }

    /// Owner table of each foreign key selected by `mode`.
    pub fn foreign_key_owners(&self, mode: KeySelection) -> IndexMap<&str, &str> {
        self.foreign_keys(mode)
            .into_iter()
            .map(|(column, owner)| (column, owner.table.as_str()))
            .collect()
    }

    /// Primary keys that are not also foreign keys.
    pub fn pure_primary_keys(&self) -> Vec<&str> {
        self.primary_keys
            .iter()
            .filter(|column| !self.is_foreign_key(column))
            .map(String::as_str)
            .collect()
    }
}

/// Immutable collection of validated tables, indexed by name.
#[derive(Debug, Clone)]
pub struct SchemaGraph {
    tables: IndexMap<String, Table>,
    primary_key_names: BTreeSet<String>,
    foreign_key_names: BTreeSet<String>,
}

#[derive(Deserialize)]
struct SchemaDescription {
    #[serde(default)]
    tables: Vec<TableSpec>,
}

impl SchemaGraph {
    /// Validate and index the given table descriptions.
    pub fn new(specs: impl IntoIterator<Item = TableSpec>) -> Result<Self> {
        let mut tables = IndexMap::new();
        for spec in specs {
            let table = validate_table(spec)?;
            if tables.contains_key(&table.name) {
                return Err(KeyweaveError::DuplicateTable { table: table.name });
            }
            tables.insert(table.name.clone(), table);
        }

        // Owners are checked once every table is known, so specs may be
        // supplied in any order and cycles need no special casing.
        for table in tables.values() {
            for (column, owner) in &table.foreign_keys {
                let owner_table =
                    tables
                        .get(&owner.table)
                        .ok_or_else(|| KeyweaveError::UnknownOwnerTable {
                            table: table.name.clone(),
                            column: column.clone(),
                            owner_table: owner.table.clone(),
                        })?;
                if !owner_table.columns.contains(&owner.column) {
                    return Err(KeyweaveError::UnknownOwnerColumn {
                        table: table.name.clone(),
                        column: column.clone(),
                        owner_table: owner.table.clone(),
                        owner_column: owner.column.clone(),
                    });
                }
            }
        }

        let primary_key_names = tables
            .values()
            .flat_map(|t| t.primary_keys.iter().cloned())
            .collect();
        let foreign_key_names = tables
            .values()
            .flat_map(|t| t.foreign_keys.keys().cloned())
            .collect();

        Ok(Self {
            tables,
            primary_key_names,
            foreign_key_names,
        })
    }

    /// Parse a `[[tables]]` TOML description and validate it.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let description: SchemaDescription =
            toml::from_str(input).map_err(|e| KeyweaveError::Config {
                message: format!("Failed to parse schema description: {}", e),
            })?;
        Self::new(description.tables)
    }

    /// Parse a `{"tables": [...]}` JSON description and validate it.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let description: SchemaDescription =
            serde_json::from_str(input).map_err(|e| KeyweaveError::Config {
                message: format!("Failed to parse schema description: {}", e),
            })?;
        Self::new(description.tables)
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| KeyweaveError::UnknownTable {
                table: name.to_string(),
            })
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Every primary-key column name seen across all tables.
    pub fn primary_key_names(&self) -> &BTreeSet<String> {
        &self.primary_key_names
    }

    /// Every foreign-key column name seen across all tables.
    pub fn foreign_key_names(&self) -> &BTreeSet<String> {
        &self.foreign_key_names
    }

    pub fn foreign_key_count(&self) -> usize {
        self.tables.values().map(|t| t.foreign_keys.len()).sum()
    }
}

fn validate_table(spec: TableSpec) -> Result<Table> {
    let TableSpec {
        name,
        columns,
        primary_keys,
        foreign_keys,
    } = spec;

    let columns: IndexSet<String> = columns.into_iter().collect();
    if primary_keys.is_empty() {
        return Err(KeyweaveError::MissingPrimaryKey { table: name });
    }
    let undeclared = primary_keys
        .iter()
        .chain(foreign_keys.keys())
        .find(|column| !columns.contains(*column));
    if let Some(column) = undeclared {
        return Err(KeyweaveError::UndeclaredKeyColumn {
            table: name,
            column: column.clone(),
        });
    }

    Ok(Table {
        name,
        columns,
        primary_keys: primary_keys.into_iter().collect(),
        foreign_keys,
    })
}
