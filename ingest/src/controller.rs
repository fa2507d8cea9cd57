//! Core pipeline orchestration and execution.
//!
//! Contains the main [`Controller`] struct that composes sources, filters,
//! transformers, storage, queues, and the checkpoint store into running
//! jobs. Manages worker lifecycles, shutdown coordination, and error
//! handling.

use std::sync::Arc;

use futures::TryStreamExt;
use ingest_config::shared::{JobDispatch, PipelineConfig, SourceConfig, TransformerConfig};
use tracing::{debug, error, info};

use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use crate::error::IngestResult;
use crate::filter::base::apply_filters;
use crate::invoke::base::{ComputeInvoker, SourceJobPayload, source_job_function};
use crate::queue::base::ItemQueue;
use crate::registry::PluginRegistry;
use crate::source::base::Source;
use crate::state::store::CheckpointStore;
use crate::storage::base::store_with_all;
use crate::transformer::base::Transformer;
use crate::types::Item;
use crate::workers::pool::TransformerWorkerPool;
use crate::workers::transformer::TransformerWorker;

/// Aggregate counts reported by a completed source job.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceJobReport {
    /// Items the source yielded.
    pub produced: u64,
    /// Items that survived the source filter chain and were stored and
    /// enqueued.
    pub retained: u64,
}

/// Internal state tracking for the controller lifecycle.
#[derive(Debug)]
enum ControllerState {
    /// The controller has been created but not yet started.
    NotStarted,
    /// The controller is running with active transformer workers.
    Started { pool: TransformerWorkerPool },
}

/// Composes the pipeline stages into source and transformer job execution.
///
/// One controller invocation runs the per-source cycles sequentially, then
/// one transformer worker per (transformer config, declared input type)
/// pair, all concurrent. Checkpoints give sources resumability; the queue
/// backend gives stages at-least-once transport.
///
/// Concurrent invocations of the same source cycle are unsafe: two cycles
/// could both observe new data and double-spawn a job. Nothing in the
/// controller provides fingerprint-scoped mutual exclusion; the external
/// scheduler must not overlap ticks.
pub struct Controller<S, I> {
    config: Arc<PipelineConfig>,
    checkpoint_store: S,
    invoker: I,
    queue: Arc<dyn ItemQueue>,
    registry: Arc<PluginRegistry>,
    state: ControllerState,
    shutdown_tx: ShutdownTx,
}

impl<S, I> Controller<S, I>
where
    S: CheckpointStore + Clone + Send + Sync + 'static,
    I: ComputeInvoker + Clone + Send + Sync + 'static,
{
    /// Creates a new controller over the given collaborators.
    ///
    /// The configuration is validated eagerly; an invalid configuration
    /// never reaches any I/O.
    pub fn new(
        config: PipelineConfig,
        checkpoint_store: S,
        invoker: I,
        queue: Arc<dyn ItemQueue>,
        registry: Arc<PluginRegistry>,
    ) -> IngestResult<Self> {
        config.validate()?;

        // The receiver is not kept: workers subscribe through the sender.
        let (shutdown_tx, _) = create_shutdown_channel();

        Ok(Self {
            config: Arc::new(config),
            checkpoint_store,
            invoker,
            queue,
            registry,
            state: ControllerState::NotStarted,
            shutdown_tx,
        })
    }

    /// Returns a handle for sending shutdown signals to this controller's
    /// workers.
    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Returns the distinct item types observed in the configuration.
    pub fn item_types(&self) -> Vec<String> {
        self.config.item_types()
    }

    /// Runs the source cycles, then starts the transformer workers.
    ///
    /// Every transformer, filter, and storage stage is constructed before
    /// the first worker spawns, so configuration errors surface here rather
    /// than inside a running worker.
    pub async fn start(&mut self) -> IngestResult<()> {
        info!(
            "starting pipeline controller for project '{}'",
            self.config.project_name
        );

        self.run_sources().await?;

        let pool = TransformerWorkerPool::new();

        for transformer_config in &self.config.transformers {
            let transformer: Arc<dyn Transformer> =
                Arc::from(self.registry.build_transformer(transformer_config)?);
            let filters = Arc::new(self.registry.build_filters(&transformer_config.filters)?);
            let storages = Arc::new(self.registry.build_storages(&transformer_config.storage)?);

            for input_item_type in &transformer_config.input_item_types {
                let worker = TransformerWorker::new(
                    self.config.clone(),
                    transformer_config.clone(),
                    input_item_type.clone(),
                    transformer.clone(),
                    filters.clone(),
                    storages.clone(),
                    self.queue.clone(),
                    self.invoker.clone(),
                    pool.clone(),
                    self.shutdown_tx.subscribe(),
                );

                pool.lock().await.start_worker(worker).await?;
            }
        }

        self.state = ControllerState::Started { pool };

        Ok(())
    }

    /// Waits for all transformer workers to complete.
    ///
    /// If the controller was never started, returns immediately. Errors from
    /// failed workers are aggregated and returned together.
    pub async fn wait(self) -> IngestResult<()> {
        let ControllerState::Started { pool } = self.state else {
            info!("controller was not started, nothing to wait for");

            return Ok(());
        };

        info!("waiting for transformer workers to complete");

        pool.wait_all().await
    }

    /// Initiates graceful shutdown of the running workers.
    ///
    /// Returns immediately after signaling; use [`Controller::wait`] to wait
    /// for the workers to actually stop.
    pub fn shutdown(&self) {
        info!("trying to shut down the pipeline controller");

        if let Err(err) = self.shutdown_tx.shutdown() {
            error!("failed to send shutdown signal to the workers: {}", err);
            return;
        }

        info!("shutdown signal successfully sent to all workers");
    }

    /// Initiates shutdown and waits for complete termination.
    pub async fn shutdown_and_wait(self) -> IngestResult<()> {
        self.shutdown();
        self.wait().await
    }

    /// Runs one cycle for every configured source, sequentially.
    pub async fn run_sources(&self) -> IngestResult<()> {
        for source_config in &self.config.sources {
            self.run_source_cycle(source_config).await?;
        }

        Ok(())
    }

    /// Runs one cycle for a single source.
    ///
    /// Builds the source, restores its checkpoint, and consults
    /// `has_new_data` — the sole admission gate against redundant runs.
    /// With new data the job either runs in-process or is dispatched as a
    /// remote invocation, fire-and-forget. Returns whether a job ran or was
    /// dispatched.
    pub async fn run_source_cycle(&self, source_config: &SourceConfig) -> IngestResult<bool> {
        let mut source = self.registry.build_source(source_config)?;

        let fingerprint = source.fingerprint();
        // An absent checkpoint is a first run, not an error.
        if let Some(checkpoint) = self.checkpoint_store.get(&fingerprint).await? {
            source.restore_state(checkpoint);
        }

        if !source.has_new_data().await? {
            info!(
                "source {} has no new data, no job spawned",
                source_config.kind()
            );
            return Ok(false);
        }

        match self.config.execution.job_dispatch {
            JobDispatch::InProcess => {
                self.run_source_pass(source).await?;
            }
            JobDispatch::Remote => {
                let payload = SourceJobPayload {
                    controller_config: (*self.config).clone(),
                    source_config: source_config.clone(),
                };

                // Fire-and-forget: no result is awaited and no retry is
                // tracked; at most one in-flight invocation is assumed.
                self.invoker
                    .invoke_async(
                        &source_job_function(&self.config.project_name, source_config.kind()),
                        serde_json::to_value(&payload)?,
                    )
                    .await?;

                info!("dispatched source {} to a remote job", source_config.kind());
            }
        }

        Ok(true)
    }

    /// Runs a full source job for the given config, unconditionally.
    ///
    /// This is the entry point remote job handlers call: admission control
    /// already happened in the cycle that dispatched the job.
    pub async fn run_source_job(&self, source_config: &SourceConfig) -> IngestResult<SourceJobReport> {
        let mut source = self.registry.build_source(source_config)?;

        let fingerprint = source.fingerprint();
        if let Some(checkpoint) = self.checkpoint_store.get(&fingerprint).await? {
            source.restore_state(checkpoint);
        }

        self.run_source_pass(source).await
    }

    /// Consumes one pass of a source's items.
    ///
    /// Filters run before storage: a dropped item is never stored or
    /// enqueued. The source's final state is persisted once, after the item
    /// sequence is exhausted; a crash mid-pass loses the pass's progress.
    async fn run_source_pass(&self, mut source: Box<dyn Source>) -> IngestResult<SourceJobReport> {
        let fingerprint = source.fingerprint();
        let filters = self.registry.build_filters(&self.config.source_filters)?;
        let storages = self.registry.build_storages(&self.config.source_storage)?;

        let mut report = SourceJobReport::default();

        {
            let mut items = source.yield_items();
            while let Some(item) = items.try_next().await? {
                report.produced += 1;

                if !apply_filters(&filters, &item).await? {
                    continue;
                }

                store_with_all(&storages, &item).await?;
                self.queue.enqueue(&item.item_type, &item).await?;
                debug!("created source item on queue {}", item.item_type);

                report.retained += 1;
            }
        }

        self.checkpoint_store
            .put(&fingerprint, source.state())
            .await?;

        info!(
            "source job complete: {} items produced, {} retained",
            report.produced, report.retained
        );

        Ok(report)
    }

    /// Runs a single transformer job over one item.
    ///
    /// This is the entry point remote job handlers call. The originating
    /// message is deleted only when the item carries a delivery handle.
    /// Returns the emitted item, or `None` when the output filter chain
    /// dropped it.
    pub async fn run_transformer_job(
        &self,
        transformer_config: &TransformerConfig,
        item: Item,
    ) -> IngestResult<Option<Item>> {
        let transformer = self.registry.build_transformer(transformer_config)?;

        let new_item = transformer.transform(item.stripped()).await?;

        if let Some(delivery) = &item.delivery {
            self.queue.acknowledge(delivery).await?;
        }

        let filters = self.registry.build_filters(&transformer_config.filters)?;
        if !apply_filters(&filters, &new_item).await? {
            return Ok(None);
        }

        let storages = self.registry.build_storages(&transformer_config.storage)?;
        store_with_all(&storages, &new_item).await?;

        self.queue.enqueue(&new_item.item_type, &new_item).await?;
        debug!("created new item on queue {}", new_item.item_type);

        Ok(Some(new_item))
    }

    /// Receives and acknowledges every pending message across all item
    /// types. Returns the number of messages drained.
    pub async fn drain_queues(&self) -> IngestResult<u64> {
        let mut drained = 0;

        for item_type in self.config.item_types() {
            loop {
                let items = self.queue.receive(&item_type).await?;
                if items.is_empty() {
                    break;
                }

                for item in items {
                    if let Some(delivery) = &item.delivery {
                        self.queue.acknowledge(delivery).await?;
                    }
                    drained += 1;
                }
            }
        }

        Ok(drained)
    }
}
