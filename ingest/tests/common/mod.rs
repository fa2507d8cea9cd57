#![allow(dead_code)]

//! Shared helpers for pipeline integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use ingest::error::{ErrorKind, IngestError, IngestResult};
use ingest::ingest_error;
use ingest::invoke::base::{ComputeInvoker, InvocationStatus};
use ingest::registry::{PluginRegistry, TransformerConstructor};
use ingest::transformer::base::Transformer;
use ingest::types::{Item, Payload};
use ingest_config::shared::{PipelineConfig, TransformerConfig};

/// Deserializes a pipeline configuration from inline JSON.
pub fn config_from_json(value: serde_json::Value) -> PipelineConfig {
    serde_json::from_value(value).expect("test pipeline config deserializes")
}

/// Builds an item with a single `url` payload field.
pub fn url_item(item_type: &str, url: &str) -> Item {
    let mut payload = Payload::new();
    payload.insert("url".to_owned(), url.into());
    Item::new(item_type, payload)
}

/// [`ComputeInvoker`] that records invocations instead of running anything.
#[derive(Debug, Clone, Default)]
pub struct RecordingInvoker {
    invocations: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded `(function_name, payload)` pairs in invocation
    /// order.
    pub async fn invocations(&self) -> Vec<(String, serde_json::Value)> {
        self.invocations.lock().await.clone()
    }
}

#[async_trait]
impl ComputeInvoker for RecordingInvoker {
    async fn invoke_async(
        &self,
        function_name: &str,
        payload: serde_json::Value,
    ) -> IngestResult<()> {
        let mut invocations = self.invocations.lock().await;
        invocations.push((function_name.to_owned(), payload));

        Ok(())
    }

    async fn invoke_sync(
        &self,
        function_name: &str,
        payload: serde_json::Value,
    ) -> IngestResult<InvocationStatus> {
        self.invoke_async(function_name, payload).await?;

        Ok(InvocationStatus::Ok)
    }
}

/// Payload field marking an item the poison transformer refuses.
pub const POISON_FIELD: &str = "poison";

/// Transformer that fails on items carrying a `poison` payload field and
/// otherwise behaves like the identity transformer.
///
/// Used to assert per-item fault isolation: a poisoned item must be logged
/// and skipped without aborting the worker's drain.
#[derive(Debug)]
struct PoisonTransformer {
    input_item_types: Vec<String>,
    output_item_types: Vec<String>,
    attempts: Arc<AtomicUsize>,
}

/// Registers the poison transformer under `custom.Poison` and returns the
/// shared transform-attempt counter.
pub fn register_poison_transformer(registry: &mut PluginRegistry) -> Arc<AtomicUsize> {
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_for_constructor = attempts.clone();

    let constructor: TransformerConstructor = Arc::new(move |config: &TransformerConfig| {
        Ok(Box::new(PoisonTransformer {
            input_item_types: config.input_item_types.clone(),
            output_item_types: config.output_item_types.clone(),
            attempts: attempts_for_constructor.clone(),
        }) as Box<dyn Transformer>)
    });
    registry.register_transformer("custom.Poison", constructor);

    attempts
}

#[async_trait]
impl Transformer for PoisonTransformer {
    fn input_item_types(&self) -> &[String] {
        &self.input_item_types
    }

    fn output_item_types(&self) -> &[String] {
        &self.output_item_types
    }

    async fn transform(&self, item: Item) -> IngestResult<Item> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if item.payload.contains_key(POISON_FIELD) {
            return Err(ingest_error!(
                ErrorKind::TransformError,
                "Item is poisoned",
                item.field_str("url").unwrap_or_default()
            ));
        }

        let output_type = self
            .output_item_types
            .first()
            .cloned()
            .unwrap_or_else(|| item.item_type.clone());

        Ok(Item::new(output_type, item.payload))
    }
}
