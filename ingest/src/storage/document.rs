use std::sync::Arc;

use async_trait::async_trait;
use ingest_config::shared::{DocumentStorageConfig, WriteMode};
use tracing::debug;

use crate::error::IngestResult;
use crate::storage::base::Storage;
use crate::storage::template::render_key;
use crate::store::attribute::{AttrMap, AttrValue, encode_value};
use crate::store::base::{RecordKey, TableClient};
use crate::types::Item;

/// Persists items as attribute-encoded records in a backend table.
///
/// The primary key is computed by substituting payload fields into the
/// configured format template. The default write mode is upsert: any record
/// already stored under the key is read, the new fields are merged over the
/// old ones, and the union is written back, so repeated stores of the same
/// logical item converge to a single record. `insert_if_absent` instead
/// leaves an existing record untouched.
pub struct DocumentStorage {
    client: Arc<dyn TableClient>,
    config: DocumentStorageConfig,
}

impl DocumentStorage {
    pub fn new(client: Arc<dyn TableClient>, config: DocumentStorageConfig) -> Self {
        Self { client, config }
    }

    /// Builds the backend record for an item.
    ///
    /// Excluded fields are dropped, property renames applied, and the key
    /// attributes set from their rendered templates.
    fn record(&self, item: &Item) -> AttrMap {
        let mut record = AttrMap::new();
        for (field, value) in &item.payload {
            if self.config.exclude_fields.contains(field) {
                continue;
            }
            let name = self
                .config
                .property_mapping
                .get(field)
                .cloned()
                .unwrap_or_else(|| field.clone());
            record.insert(name, encode_value(value));
        }

        record.insert(
            self.config.partition_key.clone(),
            AttrValue::S(render_key(&self.config.partition_key_format, &item.payload)),
        );

        if let (Some(range_key), Some(range_format)) =
            (&self.config.range_key, &self.config.range_key_format)
        {
            let rendered = render_key(range_format, &item.payload);
            let value = if rendered.parse::<f64>().is_ok() {
                AttrValue::N(rendered)
            } else {
                AttrValue::S(rendered)
            };
            record.insert(range_key.clone(), value);
        }

        record
    }

    fn primary_key(&self, item: &Item) -> RecordKey {
        RecordKey::new(
            self.config.partition_key.clone(),
            render_key(&self.config.partition_key_format, &item.payload),
        )
    }
}

#[async_trait]
impl Storage for DocumentStorage {
    async fn store_item(&self, item: &Item) -> IngestResult<()> {
        let key = self.primary_key(item);
        let existing = self.client.get_record(&self.config.table, &key).await?;

        let record = self.record(item);
        let merged = match existing {
            Some(_) if self.config.write_mode == WriteMode::InsertIfAbsent => {
                debug!("record already exists under key {}, skipping", key.value);
                return Ok(());
            }
            Some(mut base) => {
                // New fields win on overlap; fields only present in the old
                // record survive.
                base.extend(record);
                base
            }
            None => record,
        };

        self.client.put_record(&self.config.table, merged).await
    }
}
