use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::IngestResult;
use crate::queue::base::ItemQueue;
use crate::types::{Delivery, Item};

#[derive(Debug, Default)]
struct Inner {
    queues: HashMap<String, Vec<Item>>,
}

/// In-process queue backend for synchronous single-process replay.
///
/// One ordered collection per item type inside a single lock; `receive` pops
/// the most recent item and is destructive, acting as both receive and
/// implicit acknowledge. The map is shared mutably by every concurrently
/// running worker, so all access goes through the mutex. Intended for
/// low-concurrency testing and replay, not production throughput.
#[derive(Debug, Clone, Default)]
pub struct LocalQueue {
    inner: Arc<Mutex<Inner>>,
}

impl LocalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of pending items for `item_type`.
    pub async fn len(&self, item_type: &str) -> usize {
        let inner = self.inner.lock().await;
        inner
            .queues
            .get(item_type)
            .map(|queue| queue.len())
            .unwrap_or(0)
    }

    /// Returns whether no items are pending for `item_type`.
    pub async fn is_empty(&self, item_type: &str) -> bool {
        self.len(item_type).await == 0
    }
}

#[async_trait]
impl ItemQueue for LocalQueue {
    async fn enqueue(&self, item_type: &str, item: &Item) -> IngestResult<()> {
        let mut inner = self.inner.lock().await;
        inner
            .queues
            .entry(item_type.to_owned())
            .or_default()
            .push(item.stripped());

        Ok(())
    }

    async fn receive(&self, item_type: &str) -> IngestResult<Vec<Item>> {
        let mut inner = self.inner.lock().await;
        let item = inner
            .queues
            .get_mut(item_type)
            .and_then(|queue| queue.pop());

        Ok(item.into_iter().collect())
    }

    async fn acknowledge(&self, _delivery: &Delivery) -> IngestResult<()> {
        // Local receives are destructive; there is nothing left to delete.
        Ok(())
    }
}
