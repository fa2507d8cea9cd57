use std::future::Future;

use crate::error::IngestResult;

/// A trait for types that can be started as workers.
///
/// The generic parameter `H` represents the handle type returned when the
/// worker starts.
pub trait Worker<H>
where
    H: WorkerHandle,
{
    /// Error type.
    type Error;

    /// Starts the worker and returns a future that resolves to its handle.
    ///
    /// The handle can be used to monitor the worker's execution.
    fn start(self) -> impl Future<Output = Result<H, Self::Error>> + Send;
}

/// A handle to a running worker providing access to its completion status.
pub trait WorkerHandle {
    /// Returns a future that resolves when the worker completes.
    ///
    /// The future resolves to a [`Result`] indicating whether the worker
    /// completed successfully or encountered an error, a caught panic
    /// included.
    fn wait(self) -> impl Future<Output = IngestResult<()>> + Send;
}
