use serde::{Deserialize, Serialize};

/// Configuration for an item filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterConfig {
    /// Drops items whose formatted key already exists in a backend table.
    UniqueKey(UniqueKeyFilterConfig),
}

impl FilterConfig {
    /// Returns the type name of this filter.
    pub fn kind(&self) -> &'static str {
        match self {
            FilterConfig::UniqueKey(_) => "unique_key",
        }
    }
}

/// Parameters for the unique-key filter.
///
/// The filter looks up the item's formatted partition key in the configured
/// table; a hit means the item was already processed and is dropped. Backing
/// the lookup with the same table the storage stage writes to makes the
/// pipeline idempotent under at-least-once delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub struct UniqueKeyFilterConfig {
    /// Table holding the uniqueness index.
    pub table: String,
    /// Name of the table's partition key attribute.
    pub partition_key: String,
    /// Format template producing the key from payload fields, e.g.
    /// `"{url}"`.
    pub partition_key_format: String,
}
