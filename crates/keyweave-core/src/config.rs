//! # Configuration File Parser
//!
//! Reads and parses `keyweave.toml`, the optional file holding default key
//! iteration settings so callers don't have to thread them through code.
//! Supports:
//!
//! - `[generate]`: default sequencer, bounds, repeat count and row limit
//! - `[tables.<name>]`: per-table overrides of the same settings
//!
//! Example `keyweave.toml`:
//!
//! ```toml
//! [generate]
//! sequencer = "squared"
//! rows = 500
//!
//! [tables.order_items]
//! repeat = 3
//!
//! [tables.users]
//! sequencer = "triangled"
//! start = 100
//! stop = 199
//! ```
//!
//! `start`/`stop` only apply when no key domain is passed to the engine;
//! with a domain, bounds come from the owners' keys.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{KeyweaveError, Result};
use crate::keys::IterOptions;
use crate::schema::SchemaGraph;
use crate::sequence::Sequencer;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "keyweave.toml";

/// Top-level keyweave.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyweaveConfig {
    /// Defaults applied to every table.
    pub generate: GenerateConfig,
    /// Per-table overrides, keyed by table name.
    pub tables: BTreeMap<String, GenerateConfig>,
}

/// Key iteration settings. Every field is optional so that table sections
/// only need to name what they override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    pub sequencer: Option<Sequencer>,
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub repeat: Option<usize>,
    /// Maximum number of rows to take per table.
    pub rows: Option<usize>,
}

impl GenerateConfig {
    fn validate(&self, section: &str) -> Result<()> {
        if let (Some(start), Some(stop)) = (self.start, self.stop) {
            if start > stop {
                return Err(KeyweaveError::Config {
                    message: format!(
                        "[{}]: start ({}) must be less than or equal to stop ({})",
                        section, start, stop
                    ),
                });
            }
        }
        if self.repeat == Some(0) {
            return Err(KeyweaveError::Config {
                message: format!("[{}]: repeat must be at least 1", section),
            });
        }
        Ok(())
    }
}

/// Read and parse a keyweave.toml file from the given directory.
///
/// Returns `None` if the file doesn't exist (config is optional).
/// Returns an error if the file exists but can't be parsed or validated.
pub fn read_config(dir: &Path) -> Result<Option<KeyweaveConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| KeyweaveError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let config: KeyweaveConfig = toml::from_str(&content).map_err(|e| KeyweaveError::Config {
        message: format!("Failed to parse {}: {}", path.display(), e),
    })?;
    config.validate()?;

    Ok(Some(config))
}

impl KeyweaveConfig {
    /// Validate semantic constraints that serde cannot enforce.
    pub fn validate(&self) -> Result<()> {
        self.generate.validate("generate")?;
        for (name, table) in &self.tables {
            table.validate(&format!("tables.{}", name))?;
        }
        Ok(())
    }

    /// Resolve the iteration options for `table`: table override, then
    /// `[generate]` default, then built-in default, field by field.
    pub fn options_for(&self, table: &str) -> IterOptions {
        let defaults = IterOptions::default();
        let over = self.tables.get(table);
        IterOptions {
            sequencer: over
                .and_then(|t| t.sequencer)
                .or(self.generate.sequencer)
                .unwrap_or(defaults.sequencer),
            start: over.and_then(|t| t.start).or(self.generate.start),
            stop: over.and_then(|t| t.stop).or(self.generate.stop),
            repeat: over
                .and_then(|t| t.repeat)
                .or(self.generate.repeat)
                .unwrap_or(defaults.repeat),
            limit: over.and_then(|t| t.rows).or(self.generate.rows),
        }
    }

    /// Warnings for table sections that name tables absent from `graph`.
    ///
    /// Each warning is also logged via `tracing::warn` so stale entries are
    /// visible even when the caller ignores the return value.
    pub fn validate_against_schema(&self, graph: &SchemaGraph) -> Vec<String> {
        self.tables
            .keys()
            .filter(|name| !graph.contains_table(name))
            .map(|name| {
                let warning = format!(
                    "keyweave.toml: [tables.{}] references table '{}' which does not exist in the schema graph",
                    name, name
                );
                tracing::warn!("{}", warning);
                warning
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableSpec;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[generate]
sequencer = "squared"
rows = 500
repeat = 2

[tables.users]
sequencer = "triangled"
start = 100
stop = 199

[tables.orders]
rows = 5000
"#;

        let config: KeyweaveConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.generate.sequencer, Some(Sequencer::Squared));
        assert_eq!(config.generate.rows, Some(500));
        assert_eq!(config.tables["users"].start, Some(100));
        assert_eq!(config.tables["orders"].rows, Some(5000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_empty_config() {
        let config: KeyweaveConfig = toml::from_str("").unwrap();
        assert_eq!(config.generate, GenerateConfig::default());
        assert!(config.tables.is_empty());
        assert_eq!(config.options_for("anything"), IterOptions::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: std::result::Result<KeyweaveConfig, _> =
            toml::from_str("[generate]\nsequence = \"squared\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_options_for_layers_overrides() {
        let toml = r#"
[generate]
sequencer = "triangled"
rows = 10
repeat = 2

[tables.orders]
repeat = 4
stop = 20
"#;
        let config: KeyweaveConfig = toml::from_str(toml).unwrap();

        let orders = config.options_for("orders");
        assert_eq!(orders.sequencer, Sequencer::Triangled);
        assert_eq!(orders.repeat, 4);
        assert_eq!(orders.start, None);
        assert_eq!(orders.stop, Some(20));
        assert_eq!(orders.limit, Some(10));

        let users = config.options_for("users");
        assert_eq!(users.repeat, 2);
        assert_eq!(users.stop, None);
    }

    #[test]
    fn test_validate_inverted_bounds() {
        let toml = r#"
[tables.users]
start = 9
stop = 3
"#;
        let config: KeyweaveConfig = toml::from_str(toml).unwrap();
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("tables.users"), "Error should name the section: {}", msg);
    }

    #[test]
    fn test_validate_zero_repeat() {
        let config: KeyweaveConfig = toml::from_str("[generate]\nrepeat = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_read_config_nonexistent() {
        let result = read_config(Path::new("/nonexistent/dir"));
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_read_config_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[generate]\nrows = 200\n",
        )
        .unwrap();

        let config = read_config(dir.path()).unwrap().unwrap();
        assert_eq!(config.generate.rows, Some(200));
        assert!(config.tables.is_empty());
    }

    #[test]
    fn test_read_config_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "this is not valid [[[toml").unwrap();
        assert!(matches!(
            read_config(dir.path()),
            Err(KeyweaveError::Config { .. })
        ));
    }

    #[test]
    fn test_read_config_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[generate]\nstart = 5\nstop = 1\n",
        )
        .unwrap();
        assert!(read_config(dir.path()).is_err());
    }

    #[test]
    fn test_validate_against_schema() {
        let toml = r#"
[tables.users]
rows = 3

[tables.ghost]
rows = 3
"#;
        let config: KeyweaveConfig = toml::from_str(toml).unwrap();
        let graph = SchemaGraph::new([TableSpec::new("users").primary_key("id")]).unwrap();

        let warnings = config.validate_against_schema(&graph);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ghost"), "Should mention table: {}", warnings[0]);
    }
}
