use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Configuration for a storage stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Upserts items as attribute-encoded records into a backend table.
    Document(DocumentStorageConfig),
}

impl StorageConfig {
    /// Returns the type name of this storage stage.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageConfig::Document(_) => "document",
        }
    }
}

/// Write semantics of a storage stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Merge new fields over any existing record under the same key, later
    /// write winning on overlap.
    #[default]
    Upsert,
    /// Write only when no record exists under the key; otherwise skip.
    InsertIfAbsent,
}

/// Parameters for the document storage stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct DocumentStorageConfig {
    /// Destination table.
    pub table: String,
    /// Name of the table's partition key attribute.
    pub partition_key: String,
    /// Format template producing the partition key from payload fields.
    pub partition_key_format: String,
    /// Optional sort key attribute name.
    #[serde(default)]
    pub range_key: Option<String>,
    /// Format template producing the sort key from payload fields.
    #[serde(default)]
    pub range_key_format: Option<String>,
    /// Payload fields excluded from the stored record.
    #[serde(default)]
    pub exclude_fields: Vec<String>,
    /// Renames applied to payload fields before storing, `from` → `to`.
    #[serde(default)]
    pub property_mapping: BTreeMap<String, String>,
    /// Write semantics, upsert by default.
    #[serde(default)]
    pub write_mode: WriteMode,
}
