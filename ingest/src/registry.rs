//! Plugin resolution.
//!
//! Built-in plugins live in static name→constructor tables. Transformer
//! types outside the built-in table, referenced by dotted names such as
//! `custom.ArticleScrape`, must be registered by the embedding application
//! before the first job mentions them; resolution is a pure table lookup,
//! safe to repeat on every job (each job may start a fresh process) and
//! failing fast, with no retry, on names nothing registered.

use std::collections::HashMap;
use std::sync::Arc;

use ingest_config::shared::{FilterConfig, SourceConfig, StorageConfig, TransformerConfig};

use crate::error::{ErrorKind, IngestError, IngestResult};
use crate::filter::base::ItemFilter;
use crate::filter::unique::UniqueKeyFilter;
use crate::ingest_error;
use crate::source::base::Source;
use crate::source::rss::RssFeedSource;
use crate::storage::base::Storage;
use crate::storage::document::DocumentStorage;
use crate::store::base::TableClient;
use crate::transformer::base::Transformer;
use crate::transformer::identity::IdentityTransformer;

/// Constructor for a transformer type.
pub type TransformerConstructor =
    Arc<dyn Fn(&TransformerConfig) -> IngestResult<Box<dyn Transformer>> + Send + Sync>;

/// Resolves configured type names to plugin instances.
pub struct PluginRegistry {
    table_client: Arc<dyn TableClient>,
    transformers: HashMap<String, TransformerConstructor>,
}

impl PluginRegistry {
    /// Creates a registry with the built-in plugin tables and the given
    /// storage backend client for filters and storage stages.
    pub fn new(table_client: Arc<dyn TableClient>) -> Self {
        let mut transformers: HashMap<String, TransformerConstructor> = HashMap::new();
        transformers.insert(
            "identity".to_owned(),
            Arc::new(|config| {
                Ok(Box::new(IdentityTransformer::from_config(config)?) as Box<dyn Transformer>)
            }),
        );

        Self {
            table_client,
            transformers,
        }
    }

    /// Registers a transformer constructor under `name`.
    ///
    /// Dotted names are the convention for application-supplied transformers.
    /// Registering an existing name replaces the previous constructor.
    pub fn register_transformer(
        &mut self,
        name: impl Into<String>,
        constructor: TransformerConstructor,
    ) {
        self.transformers.insert(name.into(), constructor);
    }

    /// Instantiates the source described by `config`.
    pub fn build_source(&self, config: &SourceConfig) -> IngestResult<Box<dyn Source>> {
        match config {
            SourceConfig::RssFeed(params) => Ok(Box::new(RssFeedSource::new(params.clone()))),
        }
    }

    /// Instantiates the transformer described by `config`.
    ///
    /// Fails with a configuration error when the type name is neither a
    /// built-in nor a registered transformer.
    pub fn build_transformer(&self, config: &TransformerConfig) -> IngestResult<Box<dyn Transformer>> {
        let constructor = self.transformers.get(&config.kind).ok_or_else(|| {
            ingest_error!(
                ErrorKind::UnknownPluginType,
                "Unknown transformer type",
                config.kind
            )
        })?;

        constructor(config)
    }

    /// Instantiates the filter described by `config`.
    pub fn build_filter(&self, config: &FilterConfig) -> IngestResult<Box<dyn ItemFilter>> {
        match config {
            FilterConfig::UniqueKey(params) => Ok(Box::new(UniqueKeyFilter::new(
                self.table_client.clone(),
                params.clone(),
            ))),
        }
    }

    /// Instantiates the storage stage described by `config`.
    pub fn build_storage(&self, config: &StorageConfig) -> IngestResult<Box<dyn Storage>> {
        match config {
            StorageConfig::Document(params) => Ok(Box::new(DocumentStorage::new(
                self.table_client.clone(),
                params.clone(),
            ))),
        }
    }

    /// Instantiates a filter chain in configuration order.
    pub fn build_filters(&self, configs: &[FilterConfig]) -> IngestResult<Vec<Box<dyn ItemFilter>>> {
        configs.iter().map(|config| self.build_filter(config)).collect()
    }

    /// Instantiates a storage chain in configuration order.
    pub fn build_storages(&self, configs: &[StorageConfig]) -> IngestResult<Vec<Box<dyn Storage>>> {
        configs.iter().map(|config| self.build_storage(config)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryTableClient;
    use crate::types::Item;

    fn registry() -> PluginRegistry {
        PluginRegistry::new(Arc::new(MemoryTableClient::new()))
    }

    fn transformer_config(kind: &str) -> TransformerConfig {
        serde_json::from_value(serde_json::json!({
            "type": kind,
            "input_item_types": ["a"],
            "output_item_types": ["b"],
        }))
        .unwrap()
    }

    #[test]
    fn unknown_transformer_type_fails_fast() {
        let result = registry().build_transformer(&transformer_config("custom.Missing"));

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownPluginType);
        assert!(err.detail().unwrap().contains("custom.Missing"));
    }

    #[tokio::test]
    async fn registered_transformer_resolves_on_every_lookup() {
        let mut registry = registry();
        registry.register_transformer(
            "custom.Passthrough",
            Arc::new(|config| {
                Ok(Box::new(IdentityTransformer::from_config(config)?) as Box<dyn Transformer>)
            }),
        );

        let config = transformer_config("custom.Passthrough");
        // Each job may start a fresh process; resolution must be repeatable.
        for _ in 0..2 {
            let transformer = registry.build_transformer(&config).unwrap();
            let output = transformer
                .transform(Item::new("a", Default::default()))
                .await
                .unwrap();
            assert_eq!(output.item_type, "b");
        }
    }

    #[test]
    fn built_in_identity_resolves() {
        assert!(registry()
            .build_transformer(&transformer_config("identity"))
            .is_ok());
    }
}
