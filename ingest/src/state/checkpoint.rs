use serde::{Deserialize, Serialize};

/// Stable identifier of a plugin configuration, used as the checkpoint key.
///
/// Computed as the plugin type name plus a hash of the canonical (sorted-key)
/// JSON form of its parameters: two plugins with identical configuration
/// share a fingerprint and therefore a checkpoint. Configuration differences
/// are the only axis of identity.
pub type Fingerprint = String;

/// Resumable per-source state.
///
/// A free-form field map persisted under the source's fingerprint. The state
/// is read once at job start, mutated only in memory while the job runs, and
/// written back once at job completion; a crash mid-job loses that job's
/// progress entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceState {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl SourceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a state field, if set.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    /// Returns a state field as a float, if set and numeric.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(|value| value.as_f64())
    }

    /// Sets a state field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Merges `partial` into this state.
    ///
    /// Keys present in `partial` override the current values; keys absent
    /// from `partial` retain their prior values. This is never a full
    /// replace: defaults established at construction survive a partial
    /// restore from the checkpoint store.
    pub fn merge(&mut self, partial: SourceState) {
        for (key, value) in partial.fields {
            self.fields.insert(key, value);
        }
    }

    /// Returns whether no fields are set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_overrides_given_keys_and_keeps_the_rest() {
        let mut state = SourceState::new();
        state.set("time_last_updated", 0);
        state.set("pages_seen", 3);

        let mut partial = SourceState::new();
        partial.set("time_last_updated", 1_700_000_000);

        state.merge(partial);

        assert_eq!(state.get_f64("time_last_updated"), Some(1_700_000_000.0));
        assert_eq!(state.get_f64("pages_seen"), Some(3.0));
    }

    #[test]
    fn merge_of_empty_partial_changes_nothing() {
        let mut state = SourceState::new();
        state.set("time_last_updated", 42);

        state.merge(SourceState::new());

        assert_eq!(state.get_f64("time_last_updated"), Some(42.0));
    }
}
