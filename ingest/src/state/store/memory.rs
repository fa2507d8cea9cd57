use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::IngestResult;
use crate::state::checkpoint::{Fingerprint, SourceState};
use crate::state::store::base::CheckpointStore;

#[derive(Debug, Default)]
struct Inner {
    checkpoints: HashMap<Fingerprint, SourceState>,
}

/// In-memory [`CheckpointStore`] for single-process runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn get(&self, fingerprint: &Fingerprint) -> IngestResult<Option<SourceState>> {
        let inner = self.inner.lock().await;

        Ok(inner.checkpoints.get(fingerprint).cloned())
    }

    async fn put(&self, fingerprint: &Fingerprint, state: SourceState) -> IngestResult<()> {
        let mut inner = self.inner.lock().await;
        inner.checkpoints.insert(fingerprint.clone(), state);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_checkpoint_reads_as_none() {
        let store = MemoryCheckpointStore::new();

        let state = store.get(&"rss_feedabc123".to_owned()).await.unwrap();
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn put_replaces_previous_state() {
        let store = MemoryCheckpointStore::new();
        let fingerprint = "rss_feedabc123".to_owned();

        let mut first = SourceState::new();
        first.set("time_last_updated", 1);
        store.put(&fingerprint, first).await.unwrap();

        let mut second = SourceState::new();
        second.set("time_last_updated", 2);
        store.put(&fingerprint, second).await.unwrap();

        let state = store.get(&fingerprint).await.unwrap().unwrap();
        assert_eq!(state.get_f64("time_last_updated"), Some(2.0));
    }
}
