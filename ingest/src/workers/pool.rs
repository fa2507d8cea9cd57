use std::collections::HashMap;
use std::mem;
use std::ops::Deref;
use std::sync::Arc;

use tokio::sync::{Mutex, Notify};
use tracing::{debug, warn};

use crate::error::IngestResult;
use crate::invoke::ComputeInvoker;
use crate::workers::base::{Worker, WorkerHandle};
use crate::workers::transformer::{TransformerWorker, TransformerWorkerHandle, worker_key};

/// Internal state for [`TransformerWorkerPool`].
#[derive(Debug)]
pub struct TransformerWorkerPoolInner {
    /// Currently active workers indexed by (transformer, input type) key.
    active: HashMap<String, TransformerWorkerHandle>,
    /// Completed or failed workers, preserving history for inspection.
    finished: HashMap<String, Vec<TransformerWorkerHandle>>,
    /// Notification mechanism for pool state changes.
    pool_update: Arc<Notify>,
}

impl TransformerWorkerPoolInner {
    fn new() -> Self {
        Self {
            active: HashMap::new(),
            finished: HashMap::new(),
            pool_update: Arc::new(Notify::new()),
        }
    }

    /// Starts a worker and adds it to the active pool.
    ///
    /// If a worker for the same (transformer, input type) pair already
    /// exists, the operation is skipped to prevent double consumption.
    ///
    /// Returns `Ok(true)` if the worker was started, `Ok(false)` if one for
    /// the pair already exists.
    pub async fn start_worker<I>(&mut self, worker: TransformerWorker<I>) -> IngestResult<bool>
    where
        I: ComputeInvoker + Clone + Send + Sync + 'static,
    {
        let key = worker.key();
        if self.active.contains_key(&key) {
            warn!("worker {} already exists in the pool", key);
            return Ok(false);
        }

        let handle = worker.start().await?;
        self.active.insert(key.clone(), handle);

        debug!("successfully added worker {} to the pool", key);

        Ok(true)
    }

    /// Moves a worker from the active to the finished pool and notifies any
    /// process waiting on pool changes.
    pub fn mark_worker_finished(&mut self, transformer_kind: &str, input_item_type: &str) {
        let key = worker_key(transformer_kind, input_item_type);
        let removed_worker = self.active.remove(&key);

        self.pool_update.notify_waiters();

        if let Some(removed_worker) = removed_worker {
            self.finished.entry(key).or_default().push(removed_worker);
        }
    }

    /// Waits for all workers to complete or returns a notification handle.
    ///
    /// If active workers remain, returns `Ok(Some(notify))` so the caller
    /// can wait for the next pool change without holding the pool lock;
    /// waiting while locked would deadlock, since a finishing worker needs
    /// the lock to mark itself finished. With no active workers left, the
    /// finished workers' results are collected and any errors aggregated.
    pub async fn wait_all(&mut self) -> IngestResult<Option<Arc<Notify>>> {
        if !self.active.is_empty() {
            return Ok(Some(self.pool_update.clone()));
        }

        let mut errors = Vec::new();
        for (_, workers) in mem::take(&mut self.finished) {
            for worker in workers {
                // `wait` returns either an error from a caught panic or the
                // error returned by the worker.
                if let Err(err) = worker.wait().await {
                    errors.push(err);
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        Ok(None)
    }
}

/// Pool managing the per-(transformer, input type) workers of a pipeline.
///
/// One worker runs per (transformer config, declared input type) pair, all
/// concurrently; the pool tracks their lifecycles and aggregates their
/// results.
#[derive(Debug, Clone)]
pub struct TransformerWorkerPool {
    inner: Arc<Mutex<TransformerWorkerPoolInner>>,
}

impl TransformerWorkerPool {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(TransformerWorkerPoolInner::new())),
        }
    }

    /// Waits for all active workers to complete.
    ///
    /// Blocks until every worker in the pool has finished; errors from
    /// failed workers are collected and returned together.
    pub async fn wait_all(&self) -> IngestResult<()> {
        loop {
            // Try to collect all workers; while some are still active we get
            // back a `Notify` to await before trying again.
            let notify = {
                let mut workers = self.inner.lock().await;
                let Some(notify) = workers.wait_all().await? else {
                    return Ok(());
                };

                notify
            };

            notify.notified().await;
        }
    }
}

impl Default for TransformerWorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TransformerWorkerPool {
    type Target = Mutex<TransformerWorkerPoolInner>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
