//! Configuration for model loading and inference

use crate::capability::{Encoder, Scorer};
use crate::driver::{BatchInferenceDriver, DEFAULT_BATCH_SIZE, DEFAULT_MAX_SEQ_LENGTH};
use crate::model_loader::{BertScorer, DeviceType, ModelSource, TokenizerEncoder};
use crate::task::TaskType;
use crate::transform::{DEFAULT_LABEL, DEFAULT_MULTILABEL_THRESHOLD};
use seqcls_core::{LabelMap, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which model to load and how to name its classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model source (where to load from)
    pub source: ModelSource,

    /// JSON object of class index -> label; defaults to `id2label.json`
    /// inside the resolved model directory
    #[serde(default)]
    pub id2label_path: Option<PathBuf>,
}

/// Inference settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default)]
    pub task_type: TaskType,

    /// Device to run on (cpu, cuda[:N], metal[:N])
    #[serde(default)]
    pub device: DeviceType,

    /// Batch size for inference
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum sequence length
    #[serde(default = "default_max_seq_length")]
    pub max_seq_length: usize,

    /// Probability a class must exceed in multilabel mode
    #[serde(default = "default_threshold")]
    pub multilabel_threshold: f32,

    /// Label emitted when no multilabel class is predicted
    #[serde(default = "default_label")]
    pub default_label: String,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_max_seq_length() -> usize {
    DEFAULT_MAX_SEQ_LENGTH
}

fn default_threshold() -> f32 {
    DEFAULT_MULTILABEL_THRESHOLD
}

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            task_type: TaskType::default(),
            device: DeviceType::default(),
            batch_size: default_batch_size(),
            max_seq_length: default_max_seq_length(),
            multilabel_threshold: default_threshold(),
            default_label: default_label(),
        }
    }
}

/// Load the label map, tokenizer and model described by `model`, and build
/// a driver configured by `inference`
pub fn build_driver(model: &ModelConfig, inference: &InferenceConfig) -> Result<BatchInferenceDriver> {
    let model_dir = model.source.resolve()?;

    let id2label_path = model
        .id2label_path
        .clone()
        .unwrap_or_else(|| model_dir.join("id2label.json"));
    let label_map = LabelMap::from_file(&id2label_path)?;
    tracing::info!("Loaded {} labels: {}", label_map.len(), label_map);

    let encoder = TokenizerEncoder::from_dir(&model_dir)?;
    let scorer = BertScorer::load(&model_dir, label_map.len(), inference.device)?;

    with_capabilities(encoder, scorer, label_map, inference)
}

/// Build a driver from already-loaded capabilities
pub fn with_capabilities(
    encoder: impl Encoder + 'static,
    scorer: impl Scorer + 'static,
    label_map: LabelMap,
    inference: &InferenceConfig,
) -> Result<BatchInferenceDriver> {
    BatchInferenceDriver::builder(encoder, scorer, label_map)
        .task(inference.task_type)
        .batch_size(inference.batch_size)
        .max_seq_length(inference.max_seq_length)
        .multilabel_threshold(inference.multilabel_threshold)
        .default_label(inference.default_label.clone())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_defaults() {
        let config: InferenceConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, InferenceConfig::default());
        assert_eq!(config.task_type, TaskType::Multiclass);
        assert_eq!(config.device, DeviceType::Cpu);
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.max_seq_length, 512);
        assert_eq!(config.multilabel_threshold, 0.5);
        assert_eq!(config.default_label, "NONE");
    }

    #[test]
    fn test_parse_inference_config() {
        let yaml = r#"
task_type: multilabel
device: cuda:1
batch_size: 16
max_seq_length: 128
multilabel_threshold: 0.3
default_label: "无"
"#;
        let config: InferenceConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.task_type, TaskType::Multilabel);
        assert_eq!(config.device, DeviceType::Cuda(1));
        assert_eq!(config.batch_size, 16);
        assert_eq!(config.default_label, "无");
    }

    #[test]
    fn test_unknown_task_type_fails_to_parse() {
        let parsed: std::result::Result<InferenceConfig, _> =
            serde_yaml::from_str("task_type: regression");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parse_model_config() {
        let yaml = r#"
source:
  type: local
  path: ./models/bert
id2label_path: ./models/bert/labels.json
"#;
        let config: ModelConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.id2label_path,
            Some(PathBuf::from("./models/bert/labels.json"))
        );
    }
}
