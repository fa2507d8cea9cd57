use serde::{Deserialize, Serialize};

use crate::shared::{FilterConfig, StorageConfig};

/// Configuration for a transformer stage.
///
/// `kind` is either a built-in type name (e.g. `identity`) or a dotted
/// reference to a transformer registered by the embedding application (e.g.
/// `custom.ArticleScrape`). The declared input and output item types are
/// immutable for the lifetime of the configuration: routing is driven only
/// by these declarations, never inferred from payload shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TransformerConfig {
    /// Transformer type name.
    #[serde(rename = "type")]
    pub kind: String,
    /// Item types this transformer consumes; one worker runs per entry.
    pub input_item_types: Vec<String>,
    /// Item types this transformer may emit.
    pub output_item_types: Vec<String>,
    /// Filters applied to the transformer's output.
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    /// Storage stages applied to retained output.
    #[serde(default)]
    pub storage: Vec<StorageConfig>,
    /// Free-form parameters validated by the concrete transformer's typed
    /// configuration at construction time.
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl TransformerConfig {
    /// Returns the first declared output item type.
    ///
    /// Transformers with the default 1:1 cardinality emit items of this
    /// type.
    pub fn primary_output_type(&self) -> Option<&str> {
        self.output_item_types.first().map(String::as_str)
    }
}
