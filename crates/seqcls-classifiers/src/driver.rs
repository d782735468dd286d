//! Batched inference driver
//!
//! Splits an input collection into contiguous chunks, runs each chunk through
//! the encoder and scorer strictly in sequence, and hands the concatenated
//! logits to the [`ScoreTransformer`]. Any chunk failure fails the whole call;
//! the driver never returns a partial or reordered result.

use crate::capability::{Encoder, Scorer};
use crate::task::TaskType;
use crate::transform::{ScoreTransformer, DEFAULT_LABEL, DEFAULT_MULTILABEL_THRESHOLD};
use seqcls_core::{Error, InferenceResult, InputItem, LabelMap, RawScoreVector, Result};
use std::time::Instant;
use tracing::{debug, info};

/// Default number of items per forward pass
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Default encoded sequence length
pub const DEFAULT_MAX_SEQ_LENGTH: usize = 512;

/// Runs a classification model over arbitrarily many inputs
pub struct BatchInferenceDriver {
    encoder: Box<dyn Encoder>,
    scorer: Box<dyn Scorer>,
    transformer: ScoreTransformer,
    label_map: LabelMap,
    batch_size: usize,
    max_seq_length: usize,
}

impl BatchInferenceDriver {
    /// Start building a driver around the given capabilities
    pub fn builder(
        encoder: impl Encoder + 'static,
        scorer: impl Scorer + 'static,
        label_map: LabelMap,
    ) -> DriverBuilder {
        DriverBuilder::new(Box::new(encoder), Box::new(scorer), label_map)
    }

    pub fn task(&self) -> TaskType {
        self.transformer.task()
    }

    pub fn label_map(&self) -> &LabelMap {
        &self.label_map
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn max_seq_length(&self) -> usize {
        self.max_seq_length
    }

    /// Classify `items` with the configured batch size and sequence length
    pub fn infer(&self, items: &[InputItem]) -> Result<InferenceResult> {
        self.infer_with(items, self.batch_size, self.max_seq_length)
    }

    /// Classify `items` with explicit batch size and sequence length
    pub fn infer_with(
        &self,
        items: &[InputItem],
        batch_size: usize,
        max_seq_length: usize,
    ) -> Result<InferenceResult> {
        validate_sizes(batch_size, max_seq_length)?;

        if items.is_empty() {
            return Ok(InferenceResult::default());
        }

        let start = Instant::now();
        let num_chunks = items.len().div_ceil(batch_size);
        info!(
            "Classification inference: {} items in {} batches (task={}, scorer={})",
            items.len(),
            num_chunks,
            self.task(),
            self.scorer.name()
        );

        let mut raw_scores: Vec<RawScoreVector> = Vec::with_capacity(items.len());
        for (chunk_index, chunk) in items.chunks(batch_size).enumerate() {
            let logits = self.run_chunk(chunk, max_seq_length)?;
            debug!(
                "Batch {}/{} produced {} score vectors",
                chunk_index + 1,
                num_chunks,
                logits.len()
            );
            raw_scores.extend(logits);
        }

        let (list_scores, list_labels) = self.transformer.transform(&raw_scores, &self.label_map)?;

        metrics::counter!("seqcls_items_total", "task" => self.task().as_str())
            .increment(items.len() as u64);
        info!(
            "Classification inference finished in {} ms",
            start.elapsed().as_millis()
        );

        Ok(InferenceResult {
            raw_scores,
            list_scores,
            list_labels,
        })
    }

    fn run_chunk(&self, chunk: &[InputItem], max_seq_length: usize) -> Result<Vec<RawScoreVector>> {
        let start = Instant::now();
        let texts: Vec<&str> = chunk.iter().map(|item| item.text.as_str()).collect();

        let encoding = self.encoder.encode(&texts, max_seq_length)?;
        if encoding.len() != chunk.len() {
            return Err(Error::encoding(format!(
                "encoder returned {} rows for {} texts",
                encoding.len(),
                chunk.len()
            )));
        }

        let logits = self.scorer.score(&encoding)?;
        if logits.len() != chunk.len() {
            return Err(Error::scoring(format!(
                "scorer '{}' returned {} score vectors for {} inputs",
                self.scorer.name(),
                logits.len(),
                chunk.len()
            )));
        }

        metrics::histogram!("seqcls_batch_latency_us").record(start.elapsed().as_micros() as f64);
        Ok(logits)
    }
}

fn validate_sizes(batch_size: usize, max_seq_length: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(Error::config("batch_size must be at least 1"));
    }
    if max_seq_length == 0 {
        return Err(Error::config("max_seq_length must be at least 1"));
    }
    Ok(())
}

/// Builder for [`BatchInferenceDriver`]
pub struct DriverBuilder {
    encoder: Box<dyn Encoder>,
    scorer: Box<dyn Scorer>,
    label_map: LabelMap,
    task: TaskType,
    batch_size: usize,
    max_seq_length: usize,
    threshold: f32,
    default_label: String,
}

impl DriverBuilder {
    /// Create a builder with default task and sizes
    pub fn new(encoder: Box<dyn Encoder>, scorer: Box<dyn Scorer>, label_map: LabelMap) -> Self {
        Self {
            encoder,
            scorer,
            label_map,
            task: TaskType::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_seq_length: DEFAULT_MAX_SEQ_LENGTH,
            threshold: DEFAULT_MULTILABEL_THRESHOLD,
            default_label: DEFAULT_LABEL.to_string(),
        }
    }

    /// Set the task type
    pub fn task(mut self, task: TaskType) -> Self {
        self.task = task;
        self
    }

    /// Set the task type from a configuration selector
    pub fn task_name(self, task: &str) -> Result<Self> {
        let task = task.parse()?;
        Ok(self.task(task))
    }

    /// Set the number of items per forward pass
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the encoded sequence length
    pub fn max_seq_length(mut self, max_seq_length: usize) -> Self {
        self.max_seq_length = max_seq_length;
        self
    }

    /// Set the multilabel threshold
    pub fn multilabel_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the label used when no multilabel class is predicted
    pub fn default_label(mut self, label: impl Into<String>) -> Self {
        self.default_label = label.into();
        self
    }

    /// Validate the configuration and build the driver
    pub fn build(self) -> Result<BatchInferenceDriver> {
        validate_sizes(self.batch_size, self.max_seq_length)?;

        let transformer = ScoreTransformer::new(self.task)
            .with_threshold(self.threshold)?
            .with_default_label(self.default_label);

        Ok(BatchInferenceDriver {
            encoder: self.encoder,
            scorer: self.scorer,
            transformer,
            label_map: self.label_map,
            batch_size: self.batch_size,
            max_seq_length: self.max_seq_length,
        })
    }
}
