use async_trait::async_trait;

use crate::error::IngestResult;
use crate::types::Item;

/// A pluggable storage stage.
///
/// Storage persists the output of sources and transformers after filtering:
///
/// ```text
/// Transformer/Source ----> Filters -----> Storage
/// ```
///
/// Instances are stateless across items; the persistent state is the backend
/// they write to.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persists one item.
    async fn store_item(&self, item: &Item) -> IngestResult<()>;
}

/// Runs an item through a storage chain in configuration order.
pub async fn store_with_all(storages: &[Box<dyn Storage>], item: &Item) -> IngestResult<()> {
    for storage in storages {
        storage.store_item(item).await?;
    }

    Ok(())
}
