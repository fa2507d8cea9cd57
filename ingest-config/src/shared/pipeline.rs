use serde::{Deserialize, Serialize};

use crate::shared::{
    ExecutionConfig, FilterConfig, SourceConfig, StorageConfig, TransformerConfig, ValidationError,
};

/// Configuration for an ingestion pipeline.
///
/// Contains all settings required to run a pipeline: project identity,
/// execution mode, the configured sources and transformers, and the filter
/// and storage chains applied at the source stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Project name, used to derive queue and job function names.
    pub project_name: String,
    /// Execution settings.
    #[serde(default)]
    pub execution: ExecutionConfig,
    /// Configured sources, run sequentially within one controller cycle.
    pub sources: Vec<SourceConfig>,
    /// Configured transformers; one worker runs per declared input type.
    pub transformers: Vec<TransformerConfig>,
    /// Filters applied to every source-produced item before storage.
    #[serde(default)]
    pub source_filters: Vec<FilterConfig>,
    /// Storage stages applied to retained source-produced items.
    #[serde(default)]
    pub source_storage: Vec<StorageConfig>,
}

impl PipelineConfig {
    /// Validates pipeline configuration settings.
    ///
    /// Checks project identity, execution limits, and that every transformer
    /// declares its item types.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.project_name.is_empty() {
            return Err(ValidationError::EmptyProjectName);
        }

        if self.execution.worker_deadline_ms == 0 {
            return Err(ValidationError::WorkerDeadlineZero);
        }

        if self.execution.max_deliveries == 0 {
            return Err(ValidationError::MaxDeliveriesZero);
        }

        for transformer in &self.transformers {
            if transformer.input_item_types.is_empty() {
                return Err(ValidationError::NoInputItemTypes(transformer.kind.clone()));
            }
            if transformer.output_item_types.is_empty() {
                return Err(ValidationError::NoOutputItemTypes(transformer.kind.clone()));
            }
        }

        Ok(())
    }

    /// Returns the distinct item types observed anywhere in the transformer
    /// configuration, inputs first.
    ///
    /// This is the set of types the provisioner must create queues for.
    pub fn item_types(&self) -> Vec<String> {
        let mut types = Vec::new();
        for transformer in &self.transformers {
            for item_type in transformer
                .input_item_types
                .iter()
                .chain(transformer.output_item_types.iter())
            {
                if !types.contains(item_type) {
                    types.push(item_type.clone());
                }
            }
        }
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config(transformers: Vec<TransformerConfig>) -> PipelineConfig {
        PipelineConfig {
            project_name: "newsroom".to_owned(),
            execution: ExecutionConfig::default(),
            sources: Vec::new(),
            transformers,
            source_filters: Vec::new(),
            source_storage: Vec::new(),
        }
    }

    fn transformer(kind: &str, inputs: &[&str], outputs: &[&str]) -> TransformerConfig {
        TransformerConfig {
            kind: kind.to_owned(),
            input_item_types: inputs.iter().map(|s| s.to_string()).collect(),
            output_item_types: outputs.iter().map(|s| s.to_string()).collect(),
            filters: Vec::new(),
            storage: Vec::new(),
            params: serde_json::Map::new(),
        }
    }

    #[test]
    fn validate_rejects_empty_project_name() {
        let mut config = minimal_config(Vec::new());
        config.project_name = String::new();

        assert!(matches!(
            config.validate(),
            Err(ValidationError::EmptyProjectName)
        ));
    }

    #[test]
    fn validate_rejects_transformer_without_inputs() {
        let config = minimal_config(vec![transformer("identity", &[], &["b"])]);

        assert!(matches!(
            config.validate(),
            Err(ValidationError::NoInputItemTypes(_))
        ));
    }

    #[test]
    fn item_types_deduplicates_across_transformers() {
        let config = minimal_config(vec![
            transformer("identity", &["a"], &["b"]),
            transformer("identity", &["b"], &["c"]),
        ]);

        assert_eq!(config.item_types(), vec!["a", "b", "c"]);
    }
}
