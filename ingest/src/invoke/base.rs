use async_trait::async_trait;
use ingest_config::shared::{PipelineConfig, SourceConfig, TransformerConfig};
use serde::{Deserialize, Serialize};

use crate::error::IngestResult;
use crate::types::Item;

/// Outcome of a synchronous remote invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStatus {
    Ok,
    Error,
}

/// Client for the external compute service that runs remote jobs.
///
/// `invoke_async` is fire-and-forget: the controller does not await a
/// result, track retries, or record the invocation. At most one in-flight
/// invocation per source cycle is assumed, not enforced.
#[async_trait]
pub trait ComputeInvoker: Send + Sync {
    /// Starts `function_name` with `payload` without awaiting its result.
    async fn invoke_async(&self, function_name: &str, payload: serde_json::Value)
    -> IngestResult<()>;

    /// Runs `function_name` with `payload` and reports its outcome.
    async fn invoke_sync(
        &self,
        function_name: &str,
        payload: serde_json::Value,
    ) -> IngestResult<InvocationStatus>;
}

/// Event payload of a remote source job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceJobPayload {
    pub controller_config: PipelineConfig,
    pub source_config: SourceConfig,
}

/// Event payload of a remote transformer job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerJobPayload {
    pub controller_config: PipelineConfig,
    pub transformer_config: TransformerConfig,
    pub item: Item,
}

/// Returns the remote function name of a source job.
pub fn source_job_function(project_name: &str, source_kind: &str) -> String {
    format!("{project_name}-source-{}", source_kind.replace('.', "_"))
}

/// Returns the remote function name of a transformer job.
pub fn transformer_job_function(project_name: &str, transformer_kind: &str) -> String {
    format!(
        "{project_name}-transformer-{}",
        transformer_kind.replace('.', "_")
    )
}
