use async_trait::async_trait;

use crate::error::IngestResult;
use crate::queue::base::{ItemQueue, QueueClient, queue_id};
use crate::types::{Delivery, Item, Payload};

/// Distributed queue backend over an external [`QueueClient`].
///
/// Maps each item type to one durable queue named
/// `{project}-queue-{item_type}`. Message bodies carry only the payload; the
/// item type is implied by the queue a message was read from, and delivery
/// metadata is reattached as a typed [`Delivery`] on receive so consumers can
/// acknowledge the exact delivery they processed.
#[derive(Debug, Clone)]
pub struct DistributedQueue<C> {
    client: C,
    project_name: String,
}

impl<C> DistributedQueue<C> {
    pub fn new(client: C, project_name: impl Into<String>) -> Self {
        Self {
            client,
            project_name: project_name.into(),
        }
    }
}

#[async_trait]
impl<C> ItemQueue for DistributedQueue<C>
where
    C: QueueClient,
{
    async fn enqueue(&self, item_type: &str, item: &Item) -> IngestResult<()> {
        let body = serde_json::to_string(&item.payload)?;

        self.client
            .send(&queue_id(&self.project_name, item_type), body)
            .await
    }

    async fn receive(&self, item_type: &str) -> IngestResult<Vec<Item>> {
        let queue = queue_id(&self.project_name, item_type);
        let messages = self.client.receive(&queue).await?;

        let mut items = Vec::with_capacity(messages.len());
        for message in messages {
            let payload: Payload = serde_json::from_str(&message.body)?;
            items.push(Item::new(item_type, payload).with_delivery(Delivery {
                message_id: message.message_id,
                receipt_handle: message.receipt_handle,
                queue_id: queue.clone(),
            }));
        }

        Ok(items)
    }

    async fn acknowledge(&self, delivery: &Delivery) -> IngestResult<()> {
        self.client
            .delete(&delivery.queue_id, &delivery.receipt_handle)
            .await
    }
}
