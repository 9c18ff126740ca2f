//! Intent-to-table resolution and table definitions
//!
//! The schema store is loaded once from the table definitions file and is
//! read-only for the life of the process. The `dump-tables` binary is the
//! only writer, and it runs as a separate offline process.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or saving the table definitions file
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("failed to read table definitions from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse table definitions: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize table definitions: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Description and column/type map for one data table
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TableDefinition {
    #[serde(default)]
    pub description: String,
    // BTreeMap keeps field order stable so prompts are identical across runs
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

/// Static mapping of intents to tables plus the per-table definitions
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct SchemaStore {
    /// Intent label (lowercase) to table name
    #[serde(default)]
    pub mappers: BTreeMap<String, String>,
    /// Table name to its definition
    #[serde(default)]
    pub tables: BTreeMap<String, TableDefinition>,
}

impl SchemaStore {
    /// Load the store from a TOML table definitions file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let store: SchemaStore = toml::from_str(&content)?;
        debug!(
            intents = store.mappers.len(),
            tables = store.tables.len(),
            "loaded table definitions from {}",
            path.display()
        );
        Ok(store)
    }

    /// Write the store back to a TOML table definitions file
    ///
    /// Last writer wins; there is no locking on the definitions file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SchemaError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| SchemaError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
            }
        }
        fs::write(path, content).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Resolve the table mapped to an intent, if any
    ///
    /// Lookups are exact after lowercasing the intent.
    pub fn resolve_table(&self, intent: &str) -> Option<&str> {
        self.mappers.get(&intent.to_lowercase()).map(String::as_str)
    }

    /// Definition for a table name, if known
    pub fn table_definition(&self, table: &str) -> Option<&TableDefinition> {
        self.tables.get(table)
    }

    /// The full definition map, for the flow that lets the model pick tables
    pub fn all_tables(&self) -> &BTreeMap<String, TableDefinition> {
        &self.tables
    }
}
