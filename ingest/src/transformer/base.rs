use async_trait::async_trait;

use crate::error::IngestResult;
use crate::types::Item;

/// A pluggable transformer.
///
/// Transformers consume items produced by sources and other transformers,
/// producing new items in turn. The declared input and output item types
/// come from configuration and are immutable for the lifetime of a
/// configured instance; routing never inspects payloads.
#[async_trait]
pub trait Transformer: std::fmt::Debug + Send + Sync {
    /// Item types this transformer consumes.
    fn input_item_types(&self) -> &[String];

    /// Item types this transformer may emit.
    fn output_item_types(&self) -> &[String];

    /// Transforms one item into one item.
    async fn transform(&self, item: Item) -> IngestResult<Item>;

    /// Transforms a batch of items.
    ///
    /// The default maps [`Transformer::transform`] over the batch, preserving
    /// the 1:1 cardinality. A transformer producing more or fewer items than
    /// it consumes overrides this method.
    async fn transform_items(&self, items: Vec<Item>) -> IngestResult<Vec<Item>> {
        let mut outputs = Vec::with_capacity(items.len());
        for item in items {
            outputs.push(self.transform(item).await?);
        }

        Ok(outputs)
    }
}
