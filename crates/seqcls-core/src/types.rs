//! Core types for seqcls

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unnormalized per-class scores for one input, in class-index order
pub type RawScoreVector = Vec<f32>;

/// A single record submitted for classification
///
/// Only `text` is interpreted; any other fields are carried through untouched
/// so result writers can echo them next to the prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputItem {
    /// Text to classify
    pub text: String,

    /// Remaining fields of the source record
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InputItem {
    /// Create an input item with no extra fields
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: Map::new(),
        }
    }

    /// Attach an extra field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

impl From<&str> for InputItem {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for InputItem {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// A class label paired with its normalized score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledScore {
    pub label: String,

    /// Probability in [0, 1]
    pub score: f32,
}

impl LabeledScore {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Output of one inference call, one entry per input item in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceResult {
    /// Model logits as produced by the scorer
    pub raw_scores: Vec<RawScoreVector>,

    /// Every class with its normalized score
    pub list_scores: Vec<Vec<LabeledScore>>,

    /// Final decision per item: a single label (multiclass) or a
    /// comma-joined label set / default label (multilabel)
    pub list_labels: Vec<String>,
}

impl InferenceResult {
    /// Number of classified items
    pub fn len(&self) -> usize {
        self.list_labels.len()
    }

    /// Whether no item was classified
    pub fn is_empty(&self) -> bool {
        self.list_labels.is_empty()
    }

    /// Iterate over `(label, scores)` per item in input order
    pub fn predictions(&self) -> impl Iterator<Item = (&str, &[LabeledScore])> {
        self.list_labels
            .iter()
            .zip(self.list_scores.iter())
            .map(|(label, scores)| (label.as_str(), scores.as_slice()))
    }
}
