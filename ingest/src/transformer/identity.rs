use async_trait::async_trait;
use ingest_config::shared::TransformerConfig;

use crate::error::{ErrorKind, IngestError, IngestResult};
use crate::ingest_error;
use crate::transformer::base::Transformer;
use crate::types::Item;

/// Passes payloads through unchanged, retyped to the declared output type.
///
/// Useful for wiring a queue of one item type into the storage and filter
/// chains of another without touching the data.
#[derive(Debug)]
pub struct IdentityTransformer {
    input_item_types: Vec<String>,
    output_item_types: Vec<String>,
}

impl IdentityTransformer {
    /// Builds the transformer from its configuration.
    ///
    /// The identity transformer takes no parameters; any provided parameter
    /// is a configuration error surfaced before the transformer runs.
    pub fn from_config(config: &TransformerConfig) -> IngestResult<Self> {
        if let Some((param, _)) = config.params.iter().next() {
            return Err(ingest_error!(
                ErrorKind::ConfigError,
                "Unknown parameter for identity transformer",
                param
            ));
        }

        Ok(Self {
            input_item_types: config.input_item_types.clone(),
            output_item_types: config.output_item_types.clone(),
        })
    }
}

#[async_trait]
impl Transformer for IdentityTransformer {
    fn input_item_types(&self) -> &[String] {
        &self.input_item_types
    }

    fn output_item_types(&self) -> &[String] {
        &self.output_item_types
    }

    async fn transform(&self, item: Item) -> IngestResult<Item> {
        let output_type = self.output_item_types.first().ok_or_else(|| {
            ingest_error!(
                ErrorKind::ConfigError,
                "Identity transformer has no output item type"
            )
        })?;

        Ok(Item::new(output_type.clone(), item.payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Payload;

    fn config(params: serde_json::Value) -> TransformerConfig {
        serde_json::from_value(serde_json::json!({
            "type": "identity",
            "input_item_types": ["article_reference"],
            "output_item_types": ["stored_article"],
            "params": params,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn retypes_items_to_the_declared_output() {
        let transformer = IdentityTransformer::from_config(&config(serde_json::json!({}))).unwrap();

        let mut payload = Payload::new();
        payload.insert("url".to_owned(), "https://example.com/a".into());

        let output = transformer
            .transform(Item::new("article_reference", payload.clone()))
            .await
            .unwrap();

        assert_eq!(output.item_type, "stored_article");
        assert_eq!(output.payload, payload);
    }

    #[test]
    fn rejects_unknown_parameters() {
        let result = IdentityTransformer::from_config(&config(serde_json::json!({
            "unexpected": true,
        })));

        assert_eq!(result.unwrap_err().kind(), ErrorKind::ConfigError);
    }
}
