use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{ErrorKind, IngestError, IngestResult};
use crate::ingest_error;
use crate::state::checkpoint::{Fingerprint, SourceState};
use crate::state::store::base::CheckpointStore;
use crate::store::attribute::{AttrMap, AttrValue};
use crate::store::base::{RecordKey, TableClient};

/// Attribute holding the checkpoint key.
const FINGERPRINT_ATTRIBUTE: &str = "fingerprint";

/// Attribute holding the serialized source state.
const STATE_ATTRIBUTE: &str = "state";

/// [`CheckpointStore`] persisting source state through the attribute-encoded
/// table backend.
///
/// Each checkpoint is one record: the fingerprint as partition key and the
/// state serialized to a JSON string. Writes replace the whole blob, matching
/// the write-once-at-job-completion checkpoint lifecycle.
#[derive(Clone)]
pub struct TableCheckpointStore {
    client: Arc<dyn TableClient>,
    table: String,
}

impl TableCheckpointStore {
    pub fn new(client: Arc<dyn TableClient>, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl CheckpointStore for TableCheckpointStore {
    async fn get(&self, fingerprint: &Fingerprint) -> IngestResult<Option<SourceState>> {
        let key = RecordKey::new(FINGERPRINT_ATTRIBUTE, fingerprint.clone());
        let Some(record) = self.client.get_record(&self.table, &key).await? else {
            return Ok(None);
        };

        let raw = record
            .get(STATE_ATTRIBUTE)
            .and_then(AttrValue::as_s)
            .ok_or_else(|| {
                ingest_error!(
                    ErrorKind::CheckpointError,
                    "Checkpoint record has no state attribute",
                    fingerprint
                )
            })?;

        let state = serde_json::from_str(raw)?;

        Ok(Some(state))
    }

    async fn put(&self, fingerprint: &Fingerprint, state: SourceState) -> IngestResult<()> {
        let mut record = AttrMap::new();
        record.insert(
            FINGERPRINT_ATTRIBUTE.to_owned(),
            AttrValue::S(fingerprint.clone()),
        );
        record.insert(
            STATE_ATTRIBUTE.to_owned(),
            AttrValue::S(serde_json::to_string(&state)?),
        );

        self.client.put_record(&self.table, record).await
    }
}
