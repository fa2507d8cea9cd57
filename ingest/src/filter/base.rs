use async_trait::async_trait;

use crate::error::IngestResult;
use crate::types::Item;

/// A pluggable item filter.
///
/// Filters remove items from the pipeline immediately after production.
/// Instances are stateless across items: anything persistent lives in the
/// external backend the filter queries.
#[async_trait]
pub trait ItemFilter: Send + Sync {
    /// Returns `true` to keep the item, `false` to drop it.
    async fn filter(&self, item: &Item) -> IngestResult<bool>;
}

/// Runs a filter chain over an item with short-circuit AND semantics.
///
/// Filters run in configuration order; the first `false` drops the item and
/// the remaining filters are never invoked.
pub async fn apply_filters(filters: &[Box<dyn ItemFilter>], item: &Item) -> IngestResult<bool> {
    for filter in filters {
        if !filter.filter(item).await? {
            return Ok(false);
        }
    }

    Ok(true)
}
