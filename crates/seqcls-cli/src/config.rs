//! Run configuration

use crate::cli::Cli;
use anyhow::Context;
use seqcls_classifiers::{DeviceType, InferenceConfig, ModelConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything one `seqcls` invocation needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub project_name: String,

    #[serde(default = "default_group_name")]
    pub group_name: String,

    #[serde(default = "default_run_name")]
    pub run_name: String,

    /// Root under which `<project>/<group>/<run>/` is created
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    pub model: ModelConfig,

    #[serde(default)]
    pub inference: InferenceConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl RunConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &Path, cli: &Cli) -> anyhow::Result<Self> {
        let mut config: Self = seqcls_io::read_yaml(config_path)
            .with_context(|| format!("failed to load config {}", config_path.display()))?;
        config.apply_overrides(cli)?;
        Ok(config)
    }

    /// Apply CLI overrides on top of file values
    pub fn apply_overrides(&mut self, cli: &Cli) -> anyhow::Result<()> {
        if let Some(input) = &cli.input {
            self.data.input_path = Some(input.clone());
        }

        if let Some(output) = &cli.output {
            self.data.output_path = Some(output.clone());
        }

        if let Some(device) = &cli.device {
            self.inference.device = device.parse::<DeviceType>()?;
        }

        if let Some(batch_size) = cli.batch_size {
            self.inference.batch_size = batch_size;
        }

        Ok(())
    }

    /// Input file, which must be set in the file or on the command line
    pub fn input_path(&self) -> anyhow::Result<&Path> {
        self.data
            .input_path
            .as_deref()
            .context("no input file: set data.input_path or pass --input")
    }

    /// Output file, defaulting to `predictions.jsonl` in the run directory
    pub fn output_path(&self, run_dir: &Path) -> PathBuf {
        self.data
            .output_path
            .clone()
            .unwrap_or_else(|| run_dir.join("predictions.jsonl"))
    }
}

/// Input and output locations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON-lines file of records with a `text` field
    #[serde(default)]
    pub input_path: Option<PathBuf>,

    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

/// Log file settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub rotation: LogRotation,

    /// Level for the `seqcls` crates when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            rotation: LogRotation::default(),
            level: default_level(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    /// Single file, never rotated
    Never,
}

fn default_group_name() -> String {
    "default".to_string()
}

fn default_run_name() -> String {
    "infer".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./outputs")
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use seqcls_classifiers::{ModelSource, TaskType};

    const FULL: &str = r#"
project_name: demo
group_name: sentiment
run_name: run-1
output_dir: /tmp/outputs
model:
  source:
    type: local
    path: ./models/bert
  id2label_path: ./models/bert/id2label.json
inference:
  task_type: multilabel
  device: cpu
  batch_size: 32
  max_seq_length: 256
  multilabel_threshold: 0.4
  default_label: OTHER
data:
  input_path: ./data/test.jsonl
  output_path: ./out/predictions.jsonl
log:
  rotation: hourly
  level: debug
"#;

    #[test]
    fn test_parse_full_config() {
        let config: RunConfig = serde_yaml::from_str(FULL).unwrap();

        assert_eq!(config.project_name, "demo");
        assert_eq!(config.run_name, "run-1");
        assert_eq!(
            config.model.source,
            ModelSource::Local {
                path: PathBuf::from("./models/bert")
            }
        );
        assert_eq!(config.inference.task_type, TaskType::Multilabel);
        assert_eq!(config.inference.batch_size, 32);
        assert_eq!(config.inference.default_label, "OTHER");
        assert_eq!(config.log.rotation, LogRotation::Hourly);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let yaml = r#"
project_name: demo
model:
  source: { type: local, path: ./model }
"#;
        let config: RunConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.group_name, "default");
        assert_eq!(config.run_name, "infer");
        assert_eq!(config.output_dir, PathBuf::from("./outputs"));
        assert_eq!(config.inference, InferenceConfig::default());
        assert_eq!(config.log, LogConfig::default());
        assert!(config.input_path().is_err());
        assert_eq!(
            config.output_path(Path::new("/runs/r")),
            PathBuf::from("/runs/r/predictions.jsonl")
        );
    }

    #[test]
    fn test_unknown_task_type_is_rejected() {
        let yaml = r#"
project_name: demo
model:
  source: { type: local, path: ./model }
inference:
  task_type: regression
"#;
        let err = serde_yaml::from_str::<RunConfig>(yaml).unwrap_err();
        assert!(err.to_string().contains("regression"), "got: {}", err);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config: RunConfig = serde_yaml::from_str(FULL).unwrap();
        let cli = Cli::parse_from([
            "seqcls",
            "--input",
            "other.jsonl",
            "--device",
            "cuda:2",
            "--batch-size",
            "4",
        ]);

        config.apply_overrides(&cli).unwrap();

        assert_eq!(config.input_path().unwrap(), Path::new("other.jsonl"));
        assert_eq!(
            config.data.output_path,
            Some(PathBuf::from("./out/predictions.jsonl"))
        );
        assert_eq!(config.inference.device, DeviceType::Cuda(2));
        assert_eq!(config.inference.batch_size, 4);
    }

    #[test]
    fn test_bad_device_override() {
        let mut config: RunConfig = serde_yaml::from_str(FULL).unwrap();
        let cli = Cli::parse_from(["seqcls", "--device", "tpu"]);
        assert!(config.apply_overrides(&cli).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = RunConfig::load(Path::new("/no/such/run.yaml"), &Cli::default()).unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
    }
}
