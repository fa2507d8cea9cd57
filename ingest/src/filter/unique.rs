use std::sync::Arc;

use async_trait::async_trait;
use ingest_config::shared::UniqueKeyFilterConfig;
use tracing::debug;

use crate::error::IngestResult;
use crate::filter::base::ItemFilter;
use crate::storage::template::render_key;
use crate::store::base::{RecordKey, TableClient};
use crate::types::Item;

/// Drops items whose formatted key already exists in a backend table.
///
/// This is the durable uniqueness index that makes consumers idempotent
/// under the distributed queue's at-least-once delivery: a redelivered item
/// formats to the same key as the delivery that already ran, finds the
/// stored record, and is dropped.
pub struct UniqueKeyFilter {
    client: Arc<dyn TableClient>,
    config: UniqueKeyFilterConfig,
}

impl UniqueKeyFilter {
    pub fn new(client: Arc<dyn TableClient>, config: UniqueKeyFilterConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ItemFilter for UniqueKeyFilter {
    async fn filter(&self, item: &Item) -> IngestResult<bool> {
        let key = render_key(&self.config.partition_key_format, &item.payload);
        let record_key = RecordKey::new(self.config.partition_key.clone(), key.clone());

        let existing = self
            .client
            .get_record(&self.config.table, &record_key)
            .await?;

        if existing.is_some() {
            debug!("dropping item already present under key {}", key);
        }

        Ok(existing.is_none())
    }
}
