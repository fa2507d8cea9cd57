use async_trait::async_trait;
use futures::stream::BoxStream;
use sha2::{Digest, Sha256};

use crate::error::IngestResult;
use crate::state::checkpoint::{Fingerprint, SourceState};
use crate::types::Item;

/// A finite, lazy sequence of items produced by one source invocation.
pub type ItemStream<'a> = BoxStream<'a, IngestResult<Item>>;

/// A pluggable data source.
///
/// Sources gather information from live or archived origins and emit items.
/// They are designed to be interruptible: a source exposes its resumable
/// state, the controller persists it under the source's fingerprint after a
/// completed pass, and restores it before the next one. This makes
/// long-running scrapes fault tolerant across job invocations.
#[async_trait]
pub trait Source: Send {
    /// Returns the checkpoint key for this source's configuration.
    fn fingerprint(&self) -> Fingerprint;

    /// Returns whether the source has new data and a job should run.
    ///
    /// This is the sole admission gate against redundant runs; a `false`
    /// terminates the source cycle before any job is spawned.
    async fn has_new_data(&self) -> IngestResult<bool>;

    /// Produces the items of one pass.
    ///
    /// The sequence is finite and not restartable mid-pass; a new pass
    /// requires a fresh call.
    fn yield_items(&mut self) -> ItemStream<'_>;

    /// Returns the source's current resumable state.
    fn state(&self) -> SourceState;

    /// Merges `partial` into the source's state.
    ///
    /// Keys absent from `partial` retain their current values, so defaults
    /// established at construction survive a restore.
    fn restore_state(&mut self, partial: SourceState);
}

/// Computes the fingerprint of a plugin configuration.
///
/// The type name is concatenated with the SHA-256 hex digest of the
/// canonical (recursively key-sorted) JSON form of the parameters, so the
/// result is stable across processes and field orderings.
pub fn config_fingerprint(kind: &str, params: &serde_json::Value) -> Fingerprint {
    let mut canonical = String::new();
    write_canonical(params, &mut canonical);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = hasher.finalize();

    format!("{kind}{digest:x}")
}

fn write_canonical(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys = map.keys().collect::<Vec<_>>();
            keys.sort();

            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        serde_json::Value::Array(values) => {
            out.push('[');
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(value, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}
