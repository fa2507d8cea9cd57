use async_trait::async_trait;
use tracing::debug;

use crate::error::IngestResult;
use crate::invoke::base::{ComputeInvoker, InvocationStatus};

/// [`ComputeInvoker`] for fully local pipelines.
///
/// Local in-process execution never dispatches remote jobs; this invoker
/// satisfies the controller's invoker seam and reports any unexpected
/// invocation at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInvoker;

#[async_trait]
impl ComputeInvoker for NoopInvoker {
    async fn invoke_async(
        &self,
        function_name: &str,
        _payload: serde_json::Value,
    ) -> IngestResult<()> {
        debug!("noop invoker ignoring invocation of {}", function_name);

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
