//! One inference run: read items, classify, write predictions and logits

use crate::config::RunConfig;
use anyhow::Context;
use seqcls_classifiers::{build_driver, BatchInferenceDriver};
use seqcls_core::{InferenceResult, InputItem};
use seqcls_io::ProjectLayout;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

pub const LOGITS_FILE_NAME: &str = "logits.jsonl";

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub items: usize,
    pub output_path: PathBuf,
    pub logits_path: PathBuf,
    pub elapsed: Duration,
}

/// Load the model described by `config` and run it over the configured input
pub fn run(config: &RunConfig, layout: &ProjectLayout) -> anyhow::Result<RunSummary> {
    seqcls_io::write_yaml(layout.run_dir().join("config.yaml"), config)?;

    info!("Loading model from {:?}", config.model.source);
    let driver = build_driver(&config.model, &config.inference).context("failed to load model")?;
    seqcls_io::write_lines(layout.model_dir().join("labels.txt"), driver.label_map().labels())?;

    let input = config.input_path()?;
    let output = config.output_path(layout.run_dir());
    run_with_driver(&driver, input, &output, &layout.cache_dir())
}

/// Classify every record of `input` and write results
///
/// Predictions go to `output`, one JSON line per input record in input
/// order. Raw logits go to `logits.jsonl` under `cache_dir`.
pub fn run_with_driver(
    driver: &BatchInferenceDriver,
    input: &Path,
    output: &Path,
    cache_dir: &Path,
) -> anyhow::Result<RunSummary> {
    let start = Instant::now();

    let items: Vec<InputItem> = seqcls_io::read_jsonl(input)
        .with_context(|| format!("failed to read input {}", input.display()))?;
    info!("Read {} items from {}", items.len(), input.display());

    let result = driver.infer(&items)?;

    seqcls_io::write_jsonl(output, prediction_records(&items, &result)?)?;
    let logits_path = cache_dir.join(LOGITS_FILE_NAME);
    seqcls_io::write_jsonl(&logits_path, &result.raw_scores)?;

    let elapsed = start.elapsed();
    info!(
        "Classified {} items in {:.2}s, predictions written to {}",
        items.len(),
        elapsed.as_secs_f64(),
        output.display()
    );

    Ok(RunSummary {
        items: items.len(),
        output_path: output.to_path_buf(),
        logits_path,
        elapsed,
    })
}

/// Merge each input record with its `label` and `scores`
///
/// Input fields named `label` or `scores` are replaced by the prediction.
pub fn prediction_records(
    items: &[InputItem],
    result: &InferenceResult,
) -> anyhow::Result<Vec<Value>> {
    anyhow::ensure!(
        items.len() == result.len(),
        "{} inputs but {} predictions",
        items.len(),
        result.len()
    );

    items
        .iter()
        .zip(result.predictions())
        .map(|(item, (label, scores))| {
            let mut record = Map::new();
            record.insert("text".to_string(), Value::String(item.text.clone()));
            record.extend(item.extra.clone());
            record.insert("label".to_string(), Value::String(label.to_string()));
            record.insert("scores".to_string(), serde_json::to_value(scores)?);
            Ok::<_, anyhow::Error>(Value::Object(record))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqcls_core::LabeledScore;

    #[test]
    fn test_prediction_records_keep_fields() {
        let items = vec![
            InputItem::new("good").with_field("id", 1),
            InputItem::new("bad").with_field("label", "gold"),
        ];
        let result = InferenceResult {
            raw_scores: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            list_scores: vec![
                vec![LabeledScore::new("pos", 0.73), LabeledScore::new("neg", 0.27)],
                vec![LabeledScore::new("pos", 0.27), LabeledScore::new("neg", 0.73)],
            ],
            list_labels: vec!["pos".to_string(), "neg".to_string()],
        };

        let records = prediction_records(&items, &result).unwrap();

        assert_eq!(records[0]["text"], "good");
        assert_eq!(records[0]["id"], 1);
        assert_eq!(records[0]["label"], "pos");
        assert_eq!(records[0]["scores"][1]["label"], "neg");
        assert_eq!(records[1]["label"], "neg");
    }

    #[test]
    fn test_prediction_records_length_mismatch() {
        let items = vec![InputItem::new("a")];
        assert!(prediction_records(&items, &InferenceResult::default()).is_err());
    }
}
