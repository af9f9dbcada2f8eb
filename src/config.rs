use crate::error::{Error, Result};
use crate::schema::Schema;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MEMORY_PATH: &str = ":memory:";
pub const DEFAULT_ID_COLUMN: &str = "id";

/// SQLite configuration
///
/// ```toml
/// db_path = "app.db"
/// id_column = "id"
///
/// [[schema.tables]]
/// name = "users"
/// columns = [{ name = "id", data_type = "Integer", constraints = ["PrimaryKey"] }]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Path to the SQLite database file, or `:memory:`
    pub db_path: String,
    /// Primary key column used when a model does not name its own
    pub id_column: String,
    /// Apply `PRAGMA foreign_keys = ON` when opening
    pub foreign_keys: bool,
    pub busy_timeout_ms: u64,
    /// Schema definition for the database
    pub schema: Schema,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            db_path: MEMORY_PATH.to_string(),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            foreign_keys: true,
            busy_timeout_ms: 5000,
            schema: Schema::new(),
        }
    }
}

impl SqliteConfig {
    /// Create a new SQLite config with path and schema
    pub fn new(db_path: impl Into<String>, schema: Schema) -> Self {
        Self {
            db_path: db_path.into(),
            schema,
            ..Self::default()
        }
    }

    pub fn with_id_column(mut self, id_column: &str) -> Self {
        self.id_column = id_column.to_string();
        self
    }

    pub fn is_memory(&self) -> bool {
        self.db_path == MEMORY_PATH
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a config file from disk.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnConstraint, DataType};

    #[test]
    fn defaults_apply_to_empty_config() {
        let config = SqliteConfig::from_toml_str("").unwrap();
        assert_eq!(config, SqliteConfig::default());
        assert!(config.is_memory());
        assert_eq!(config.id_column, "id");
    }

    #[test]
    fn parses_schema_tables() {
        let config = SqliteConfig::from_toml_str(
            r#"
            db_path = "app.db"
            foreign_keys = false

            [[schema.tables]]
            name = "users"
            columns = [
                { name = "id", data_type = "Integer", constraints = ["PrimaryKey"] },
                { name = "name", data_type = "Text", constraints = ["NotNull"] },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path, "app.db");
        assert!(!config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, 5000);
        let users = &config.schema.tables[0];
        assert_eq!(users.name, "users");
        assert_eq!(users.columns[1].data_type, DataType::Text);
        assert_eq!(users.columns[0].constraints, vec![ColumnConstraint::PrimaryKey]);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = SqliteConfig::from_toml_str("db_path = [").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
