use std::sync::Arc;
use std::time::Duration;

use ingest_config::shared::{JobDispatch, PipelineConfig, QueueMode, TransformerConfig};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info};

use crate::concurrency::shutdown::ShutdownRx;
use crate::error::{ErrorKind, IngestError, IngestResult};
use crate::filter::base::{ItemFilter, apply_filters};
use crate::ingest_error;
use crate::invoke::base::{ComputeInvoker, TransformerJobPayload, transformer_job_function};
use crate::queue::base::ItemQueue;
use crate::storage::base::{Storage, store_with_all};
use crate::transformer::base::Transformer;
use crate::types::Item;
use crate::workers::base::{Worker, WorkerHandle};
use crate::workers::pool::TransformerWorkerPool;

/// Delay before polling an empty distributed queue again.
const RECEIVE_BACKOFF: Duration = Duration::from_millis(100);

/// Returns the pool key of the worker for a (transformer, input type) pair.
pub fn worker_key(transformer_kind: &str, input_item_type: &str) -> String {
    format!("{transformer_kind}/{input_item_type}")
}

#[derive(Debug)]
pub struct TransformerWorkerHandle {
    handle: Option<JoinHandle<IngestResult<()>>>,
}

impl WorkerHandle for TransformerWorkerHandle {
    async fn wait(mut self) -> IngestResult<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        match handle.await {
            Ok(result) => result,
            Err(err) => Err(ingest_error!(
                ErrorKind::WorkerPanic,
                "Transformer worker panicked",
                err
            )),
        }
    }
}

/// Worker consuming one input item type on behalf of one transformer.
///
/// In local mode the worker drains the in-process queue to exhaustion and
/// returns. In distributed mode it polls the durable queue until its
/// wall-clock deadline or a shutdown signal, transforming items in-process
/// or dispatching them to remote invocations depending on the configured job
/// dispatch. A failed transform of one item is logged and the worker
/// proceeds to the next item in both modes, so a single bad item never
/// poisons the whole drain.
pub struct TransformerWorker<I> {
    config: Arc<PipelineConfig>,
    transformer_config: TransformerConfig,
    input_item_type: String,
    transformer: Arc<dyn Transformer>,
    filters: Arc<Vec<Box<dyn ItemFilter>>>,
    storages: Arc<Vec<Box<dyn Storage>>>,
    queue: Arc<dyn ItemQueue>,
    invoker: I,
    pool: TransformerWorkerPool,
    shutdown_rx: ShutdownRx,
}

impl<I> TransformerWorker<I> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<PipelineConfig>,
        transformer_config: TransformerConfig,
        input_item_type: String,
        transformer: Arc<dyn Transformer>,
        filters: Arc<Vec<Box<dyn ItemFilter>>>,
        storages: Arc<Vec<Box<dyn Storage>>>,
        queue: Arc<dyn ItemQueue>,
        invoker: I,
        pool: TransformerWorkerPool,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        Self {
            config,
            transformer_config,
            input_item_type,
            transformer,
            filters,
            storages,
            queue,
            invoker,
            pool,
            shutdown_rx,
        }
    }

    /// Returns this worker's pool key.
    pub fn key(&self) -> String {
        worker_key(&self.transformer_config.kind, &self.input_item_type)
    }
}

impl<I> Worker<TransformerWorkerHandle> for TransformerWorker<I>
where
    I: ComputeInvoker + Clone + Send + Sync + 'static,
{
    type Error = IngestError;

    async fn start(self) -> Result<TransformerWorkerHandle, Self::Error> {
        let key = self.key();
        info!("starting transformer worker {}", key);

        let worker_span = tracing::info_span!(
            "transformer_worker",
            transformer = %self.transformer_config.kind,
            input_item_type = %self.input_item_type,
        );
        let worker = async move {
            let result = match self.config.execution.queue_mode {
                QueueMode::Local => self.drain_local().await,
                QueueMode::Distributed => self.run_distributed().await,
            };

            if let Err(err) = &result {
                error!("transformer worker failed: {}", err);
            }

            // The worker reports itself finished so the pool can stop
            // tracking it as active; its result stays available through the
            // handle.
            self.pool.lock().await.mark_worker_finished(
                &self.transformer_config.kind,
                &self.input_item_type,
            );

            result
        }
        .instrument(worker_span);

        let handle = tokio::spawn(worker);

        Ok(TransformerWorkerHandle {
            handle: Some(handle),
        })
    }
}

impl<I> TransformerWorker<I>
where
    I: ComputeInvoker + Clone + Send + Sync + 'static,
{
    /// Drains the in-process queue for the input type to exhaustion.
    async fn drain_local(&self) -> IngestResult<()> {
        let mut processed = 0u64;
        loop {
            let items = self.queue.receive(&self.input_item_type).await?;
            if items.is_empty() {
                break;
            }

            for item in items {
                self.process_item(item).await?;
                processed += 1;
            }
        }

        info!(
            "drained local queue for item type {} ({} items)",
            self.input_item_type, processed
        );

        Ok(())
    }

    /// Polls the distributed queue until the deadline or shutdown.
    async fn run_distributed(&self) -> IngestResult<()> {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let deadline =
            Instant::now() + Duration::from_millis(self.config.execution.worker_deadline_ms);

        loop {
            if Instant::now() >= deadline {
                info!(
                    "transformer worker for item type {} reached its deadline",
                    self.input_item_type
                );
                break;
            }

            let items = tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!(
                        "shutting down transformer worker for item type {}",
                        self.input_item_type
                    );
                    break;
                }

                items = self.queue.receive(&self.input_item_type) => items?,
            };

            if items.is_empty() {
                let next_poll = Instant::now() + RECEIVE_BACKOFF;
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = tokio::time::sleep_until(next_poll.min(deadline)) => {}
                }
                continue;
            }

            for item in items {
                match self.config.execution.job_dispatch {
                    JobDispatch::InProcess => self.process_item(item).await?,
                    JobDispatch::Remote => self.dispatch_remote(item).await?,
                }
            }
        }

        Ok(())
    }

    /// Processes a single item in-process.
    ///
    /// A transform failure is contained to the item: it is logged and the
    /// worker moves on. Queue and storage failures propagate, aborting the
    /// worker.
    async fn process_item(&self, item: Item) -> IngestResult<()> {
        let transformed = match self.transformer.transform(item.stripped()).await {
            Ok(transformed) => transformed,
            Err(err) => {
                error!(
                    "failed to transform item of type {}: {}",
                    self.input_item_type, err
                );
                return Ok(());
            }
        };

        // The consumed message is deleted only when the item carries a
        // delivery handle; locally synthesized items, e.g. from backfill,
        // have none.
        if let Some(delivery) = &item.delivery {
            self.queue.acknowledge(delivery).await?;
        }

        if !apply_filters(&self.filters, &transformed).await? {
            debug!("transformed item dropped by output filter chain");
            return Ok(());
        }

        store_with_all(&self.storages, &transformed).await?;
        self.queue
            .enqueue(&transformed.item_type, &transformed)
            .await?;

        debug!("created new item on queue {}", transformed.item_type);

        Ok(())
    }

    /// Hands a single item to a remote invocation, fire-and-forget.
    async fn dispatch_remote(&self, item: Item) -> IngestResult<()> {
        let payload = TransformerJobPayload {
            controller_config: (*self.config).clone(),
            transformer_config: self.transformer_config.clone(),
            item,
        };

        self.invoker
            .invoke_async(
                &transformer_job_function(&self.config.project_name, &self.transformer_config.kind),
                serde_json::to_value(&payload)?,
            )
            .await
    }
}
