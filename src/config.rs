//! Filler configuration
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `FILLER_*` environment variables. The CLI applies its flags last.

use crate::error::{FillerError, Result};
use crate::ingestion::IngestionOptions;
use crate::schema::{validate_identifier, TableRef, TableScheme};
use crate::store::{SqliteClient, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_STORE: &str = "FILLER_STORE";
pub const ENV_DATABASE: &str = "FILLER_DATABASE";
pub const ENV_TABLE: &str = "FILLER_TABLE";
pub const ENV_JSON_POINTER: &str = "FILLER_JSON_POINTER";
pub const ENV_DEDUP_SCOPE: &str = "FILLER_DEDUP_SCOPE";
pub const ENV_BLOCK_ROWS: &str = "FILLER_BLOCK_ROWS";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillerConfig {
    /// SQLite store file; the store is kept in memory when unset
    pub store_path: Option<PathBuf>,

    /// Rows per block when scanning the table
    pub block_rows: usize,

    pub database: String,

    pub table: String,

    /// Ordered (name, type) columns: identifier first, key second
    pub scheme: TableScheme,

    /// File ingested right after the table is created
    pub data_file: Option<PathBuf>,

    pub ingestion: IngestionOptions,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            store_path: None,
            block_rows: SqliteClient::DEFAULT_BLOCK_ROWS,
            database: "test".to_string(),
            table: "drivers".to_string(),
            scheme: TableScheme::default(),
            data_file: None,
            ingestion: IngestionOptions::default(),
        }
    }
}

impl FillerConfig {
    /// Load a JSON config file; missing keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            FillerError::Config(format!("can't read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| FillerError::Config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Override values from the process environment
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(store) = lookup(ENV_STORE) {
            self.store_path = Some(PathBuf::from(store));
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self.database = database;
        }
        if let Some(table) = lookup(ENV_TABLE) {
            self.table = table;
        }
        if let Some(pointer) = lookup(ENV_JSON_POINTER) {
            self.ingestion.json_pointer = pointer;
        }
        if let Some(scope) = lookup(ENV_DEDUP_SCOPE) {
            self.ingestion.dedup_scope = scope.parse()?;
        }
        if let Some(rows) = lookup(ENV_BLOCK_ROWS) {
            self.block_rows = rows.parse().map_err(|e| {
                FillerError::Config(format!("{} must be a positive integer: {}", ENV_BLOCK_ROWS, e))
            })?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        validate_identifier(&self.database)?;
        if !self.table.is_empty() {
            validate_identifier(&self.table)?;
        }
        if self.block_rows == 0 {
            return Err(FillerError::Config("block_rows must be positive".to_string()));
        }
        let pointer = &self.ingestion.json_pointer;
        if !pointer.is_empty() && !pointer.starts_with('/') {
            return Err(FillerError::Config(format!(
                "json_pointer '{}' must be empty or start with '/'",
                pointer
            )));
        }
        Ok(())
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.database, &self.table)
    }

    /// Open the configured SQLite store
    pub fn open_store(&self) -> StoreResult<SqliteClient> {
        let client = match &self.store_path {
            Some(path) => SqliteClient::open(path)?,
            None => SqliteClient::open_in_memory()?,
        };
        Ok(client.with_block_rows(self.block_rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::DedupScope;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = FillerConfig::default();
        assert_eq!(config.table_ref().to_string(), "test.drivers");
        assert_eq!(config.ingestion.json_pointer, "/data/drivers");
        assert_eq!(config.ingestion.dedup_scope, DedupScope::SnapshotAndBatch);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("filler.json");
        std::fs::write(
            &path,
            r#"{
                "database": "fleet",
                "scheme": [
                    {"name": "row_no", "type": "UInt64"},
                    {"name": "driver", "type": "String"}
                ],
                "ingestion": {"dedup_scope": "snapshot_only"}
            }"#,
        )
        .unwrap();

        let config = FillerConfig::load(&path).unwrap();
        assert_eq!(config.database, "fleet");
        assert_eq!(config.table, "drivers");
        assert_eq!(config.scheme.columns()[1].name, "driver");
        assert_eq!(config.ingestion.dedup_scope, DedupScope::SnapshotOnly);
        assert_eq!(config.ingestion.json_pointer, "/data/drivers");
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = FillerConfig::load("/nonexistent/filler.json").unwrap_err();
        assert!(matches!(err, FillerError::Config(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DATABASE, "prod"),
            (ENV_TABLE, "hashes"),
            (ENV_DEDUP_SCOPE, "snapshot_only"),
            (ENV_BLOCK_ROWS, "128"),
        ]
        .into_iter()
        .collect();

        let config = FillerConfig::default()
            .apply_env_from(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.table_ref(), TableRef::new("prod", "hashes"));
        assert_eq!(config.ingestion.dedup_scope, DedupScope::SnapshotOnly);
        assert_eq!(config.block_rows, 128);
        assert_eq!(config.store_path, None);
    }

    #[test]
    fn test_bad_env_value_is_config_error() {
        let err = FillerConfig::default()
            .apply_env_from(|name| (name == ENV_BLOCK_ROWS).then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, FillerError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = FillerConfig::default();
        config.ingestion.json_pointer = "data.drivers".to_string();
        assert!(matches!(config.validate(), Err(FillerError::Config(_))));

        let mut config = FillerConfig::default();
        config.database = "my db".to_string();
        assert!(matches!(config.validate(), Err(FillerError::Schema(_))));
    }
}
