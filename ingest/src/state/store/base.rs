use async_trait::async_trait;

use crate::error::IngestResult;
use crate::state::checkpoint::{Fingerprint, SourceState};

/// Key-value persistence of per-source resumable state.
///
/// The store offers plain get/put semantics: no transactions, no conditional
/// writes. An absent checkpoint is a first run, not an error. Implementations
/// are assumed safe for concurrent external access, but nothing guards two
/// concurrent jobs of the same source against overwriting each other's
/// checkpoint; callers must not run the same source cycle concurrently.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Reads the state stored under `fingerprint`, or `None` when absent.
    async fn get(&self, fingerprint: &Fingerprint) -> IngestResult<Option<SourceState>>;

    /// Writes `state` under `fingerprint`, replacing any previous blob.
    async fn put(&self, fingerprint: &Fingerprint, state: SourceState) -> IngestResult<()>;
}
