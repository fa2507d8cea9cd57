use async_trait::async_trait;

use crate::error::IngestResult;
use crate::types::{Delivery, Item};

/// Transport between pipeline stages.
///
/// One contract, two backends: the in-process queue used for synchronous
/// replay, and the distributed durable queue used in production. Items
/// received from a distributed backend carry a [`Delivery`]; omitting
/// [`ItemQueue::acknowledge`] causes redelivery after the backend's
/// visibility timeout, which is the system's only recovery path for a
/// crashed consumer. No cross-consumer ordering is guaranteed by either
/// backend.
#[async_trait]
pub trait ItemQueue: Send + Sync {
    /// Enqueues `item` on the queue for `item_type`.
    async fn enqueue(&self, item_type: &str, item: &Item) -> IngestResult<()>;

    /// Receives pending items for `item_type`.
    ///
    /// May return fewer items than are pending, including none.
    async fn receive(&self, item_type: &str) -> IngestResult<Vec<Item>>;

    /// Permanently removes the message identified by `delivery`.
    async fn acknowledge(&self, delivery: &Delivery) -> IngestResult<()>;
}

/// A raw message as the distributed queue backend sees it.
#[derive(Debug, Clone)]
pub struct QueueMessage {
    /// Backend-assigned message identifier.
    pub message_id: String,
    /// Opaque token for deleting this delivery of the message.
    pub receipt_handle: String,
    /// Serialized message body.
    pub body: String,
}

/// Client for the external distributed queue service.
///
/// The backend is durable and at-least-once: a received message becomes
/// invisible for the visibility timeout and redelivers unless deleted.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Sends `body` to the queue identified by `queue_id`.
    async fn send(&self, queue_id: &str, body: String) -> IngestResult<()>;

    /// Receives a batch of pending messages from `queue_id`.
    async fn receive(&self, queue_id: &str) -> IngestResult<Vec<QueueMessage>>;

    /// Deletes the delivery identified by `receipt_handle` from `queue_id`.
    async fn delete(&self, queue_id: &str, receipt_handle: &str) -> IngestResult<()>;
}

/// Returns the queue identifier for an item type within a project.
pub fn queue_id(project_name: &str, item_type: &str) -> String {
    format!("{project_name}-queue-{item_type}")
}

/// Returns the dead-letter queue identifier paired with `queue_id`.
pub fn dead_letter_queue_id(queue_id: &str) -> String {
    format!("{queue_id}-dlq")
}
