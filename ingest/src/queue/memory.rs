use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ErrorKind, IngestError, IngestResult};
use crate::ingest_error;
use crate::queue::base::{QueueClient, QueueMessage, dead_letter_queue_id};

/// Maximum messages returned by a single receive call.
const MAX_RECEIVE_BATCH: usize = 10;

#[derive(Debug)]
struct StoredMessage {
    message_id: String,
    body: String,
    /// Receipt of the current in-flight delivery, if any.
    receipt_handle: Option<String>,
    /// Instant until which the message is invisible to receivers.
    invisible_until: Option<Instant>,
    receive_count: u32,
}

#[derive(Debug, Default)]
struct Inner {
    queues: HashMap<String, Vec<StoredMessage>>,
    deletes: HashMap<String, u32>,
}

/// In-memory [`QueueClient`] with visibility-timeout and dead-letter
/// semantics.
///
/// Behaves like the external durable queue for deterministic tests: a
/// received message becomes invisible for the visibility timeout and
/// redelivers with a fresh receipt handle unless deleted first; a message
/// that exceeds the delivery bound moves to the paired dead-letter queue
/// instead of being delivered again.
#[derive(Debug, Clone)]
pub struct InMemoryQueueClient {
    inner: Arc<Mutex<Inner>>,
    visibility_timeout: Duration,
    max_deliveries: u32,
}

impl InMemoryQueueClient {
    pub fn new(visibility_timeout: Duration, max_deliveries: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            visibility_timeout,
            max_deliveries,
        }
    }

    /// Returns the number of messages stored in `queue_id`, in-flight ones
    /// included.
    pub async fn message_count(&self, queue_id: &str) -> usize {
        let inner = self.inner.lock().await;
        inner
            .queues
            .get(queue_id)
            .map(|queue| queue.len())
            .unwrap_or(0)
    }

    /// Returns the number of messages in the dead-letter queue paired with
    /// `queue_id`.
    pub async fn dead_letter_count(&self, queue_id: &str) -> usize {
        self.message_count(&dead_letter_queue_id(queue_id)).await
    }

    /// Returns how many deletes were performed against `queue_id`.
    pub async fn delete_count(&self, queue_id: &str) -> u32 {
        let inner = self.inner.lock().await;
        inner.deletes.get(queue_id).copied().unwrap_or(0)
    }
}

impl Default for InMemoryQueueClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(30), 5)
    }
}

#[async_trait]
impl QueueClient for InMemoryQueueClient {
    async fn send(&self, queue_id: &str, body: String) -> IngestResult<()> {
        let mut inner = self.inner.lock().await;
        inner
            .queues
            .entry(queue_id.to_owned())
            .or_default()
            .push(StoredMessage {
                message_id: Uuid::new_v4().to_string(),
                body,
                receipt_handle: None,
                invisible_until: None,
                receive_count: 0,
            });

        Ok(())
    }

    async fn receive(&self, queue_id: &str) -> IngestResult<Vec<QueueMessage>> {
        let now = Instant::now();
        let mut inner = self.inner.lock().await;

        // Messages that exhausted their delivery budget move to the
        // dead-letter queue before this receive hands anything out.
        let mut dead = Vec::new();
        if let Some(queue) = inner.queues.get_mut(queue_id) {
            let mut index = 0;
            while index < queue.len() {
                let message = &queue[index];
                let visible = message.invisible_until.is_none_or(|until| until <= now);
                if visible && message.receive_count >= self.max_deliveries {
                    dead.push(queue.remove(index));
                } else {
                    index += 1;
                }
            }
        }
        if !dead.is_empty() {
            debug!(
                "moving {} exhausted messages from queue {} to its dead-letter queue",
                dead.len(),
                queue_id
            );
            let dlq = inner
                .queues
                .entry(dead_letter_queue_id(queue_id))
                .or_default();
            for mut message in dead {
                message.receipt_handle = None;
                message.invisible_until = None;
                message.receive_count = 0;
                dlq.push(message);
            }
        }

        let Some(queue) = inner.queues.get_mut(queue_id) else {
            return Ok(Vec::new());
        };

        let mut batch = Vec::new();
        for message in queue.iter_mut() {
            if batch.len() == MAX_RECEIVE_BATCH {
                break;
            }
            let visible = message.invisible_until.is_none_or(|until| until <= now);
            if !visible {
                continue;
            }

            let receipt_handle = Uuid::new_v4().to_string();
            message.receipt_handle = Some(receipt_handle.clone());
            message.invisible_until = Some(now + self.visibility_timeout);
            message.receive_count += 1;

            batch.push(QueueMessage {
                message_id: message.message_id.clone(),
                receipt_handle,
                body: message.body.clone(),
            });
        }

        Ok(batch)
    }

    async fn delete(&self, queue_id: &str, receipt_handle: &str) -> IngestResult<()> {
        let mut inner = self.inner.lock().await;

        let queue = inner.queues.get_mut(queue_id).ok_or_else(|| {
            ingest_error!(ErrorKind::QueueError, "Queue does not exist", queue_id)
        })?;

        let position = queue
            .iter()
            .position(|message| message.receipt_handle.as_deref() == Some(receipt_handle))
            .ok_or_else(|| {
                ingest_error!(
                    ErrorKind::QueueError,
                    "Receipt handle does not match an in-flight message",
                    queue_id
                )
            })?;

        queue.remove(position);
        *inner.deletes.entry(queue_id.to_owned()).or_default() += 1;

        Ok(())
    }
}
