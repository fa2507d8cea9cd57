use serde::{Deserialize, Serialize};

/// Ordered mapping of payload field names to dynamic values.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Delivery metadata attached to an item received from a distributed queue.
///
/// Carries everything needed to acknowledge (delete) the originating message
/// after the item has been processed. Items synthesized locally, e.g. by the
/// backfill engine or by a source, have no delivery metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Backend-assigned message identifier.
    pub message_id: String,
    /// Opaque token required to delete the message.
    pub receipt_handle: String,
    /// Identifier of the queue the message was received from.
    pub queue_id: String,
}

/// Typed unit of data flowing through the pipeline.
///
/// Routing is driven exclusively by `item_type`; the payload shape is never
/// inspected to infer a type. Delivery metadata travels next to the payload,
/// not inside it, so persisted records and transform inputs never contain
/// transport fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Opaque routing key.
    pub item_type: String,
    /// Ordered field map.
    pub payload: Payload,
    /// Present only when the item was dequeued from a distributed queue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<Delivery>,
}

impl Item {
    /// Creates an item with the given type and payload and no delivery
    /// metadata.
    pub fn new(item_type: impl Into<String>, payload: Payload) -> Self {
        Self {
            item_type: item_type.into(),
            payload,
            delivery: None,
        }
    }

    /// Attaches delivery metadata to this item.
    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = Some(delivery);
        self
    }

    /// Returns a copy of this item without delivery metadata.
    ///
    /// Used before handing an item to a transform or a storage stage, which
    /// must never observe transport information.
    pub fn stripped(&self) -> Item {
        Item {
            item_type: self.item_type.clone(),
            payload: self.payload.clone(),
            delivery: None,
        }
    }

    /// Returns the string value of a payload field, if present.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.payload.get(name).and_then(|value| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stripped_removes_delivery_only() {
        let mut payload = Payload::new();
        payload.insert("url".to_owned(), "https://example.com/a".into());

        let item = Item::new("article_reference", payload.clone()).with_delivery(Delivery {
            message_id: "m-1".to_owned(),
            receipt_handle: "r-1".to_owned(),
            queue_id: "q-articles".to_owned(),
        });

        let stripped = item.stripped();
        assert!(stripped.delivery.is_none());
        assert_eq!(stripped.item_type, "article_reference");
        assert_eq!(stripped.payload, payload);
        // The original keeps its delivery handle.
        assert!(item.delivery.is_some());
    }

    #[test]
    fn serialized_item_omits_absent_delivery() {
        let item = Item::new("article_reference", Payload::new());
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("delivery"));
    }
}
