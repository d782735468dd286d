//! Logit post-processing
//!
//! Turns raw score vectors into per-class probabilities and a label decision:
//! - Multiclass: row-wise softmax, argmax label (lowest index wins ties)
//! - Multilabel: element-wise sigmoid, every label strictly above the
//!   threshold joined with `,`, or the default label when none qualifies
//!
//! Everything here is pure; there is no model or I/O dependency.

use crate::task::TaskType;
use seqcls_core::{Error, LabelMap, LabeledScore, RawScoreVector, Result};

/// Default probability a multilabel class must exceed to be predicted
pub const DEFAULT_MULTILABEL_THRESHOLD: f32 = 0.5;

/// Default decision when no multilabel class exceeds the threshold
pub const DEFAULT_LABEL: &str = "NONE";

/// Separator between labels of a multilabel prediction
pub const LABEL_SEPARATOR: &str = ",";

/// Scores and labels for a batch, index-aligned with the input rows
pub type TransformOutput = (Vec<Vec<LabeledScore>>, Vec<String>);

/// Configured score transformer
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTransformer {
    task: TaskType,
    threshold: f32,
    default_label: String,
}

impl ScoreTransformer {
    /// Create a transformer with the default threshold and default label
    pub fn new(task: TaskType) -> Self {
        Self {
            task,
            threshold: DEFAULT_MULTILABEL_THRESHOLD,
            default_label: DEFAULT_LABEL.to_string(),
        }
    }

    /// Set the multilabel threshold; must be a finite value in [0, 1]
    pub fn with_threshold(mut self, threshold: f32) -> Result<Self> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "multilabel threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        self.threshold = threshold;
        Ok(self)
    }

    /// Set the label emitted when no multilabel class is predicted
    pub fn with_default_label(mut self, label: impl Into<String>) -> Self {
        self.default_label = label.into();
        self
    }

    pub fn task(&self) -> TaskType {
        self.task
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn default_label(&self) -> &str {
        &self.default_label
    }

    /// Transform a batch of raw score vectors
    ///
    /// Every row is checked against the label count before any row is
    /// scored, so a mismatch never yields partially labelled output.
    pub fn transform(
        &self,
        raw_scores: &[RawScoreVector],
        label_map: &LabelMap,
    ) -> Result<TransformOutput> {
        check_dimensions(raw_scores, label_map.len())?;

        let mut list_scores = Vec::with_capacity(raw_scores.len());
        let mut list_labels = Vec::with_capacity(raw_scores.len());

        for row in raw_scores {
            let (scores, label) = match self.task {
                TaskType::Multiclass => self.multiclass_row(row, label_map),
                TaskType::Multilabel => self.multilabel_row(row, label_map),
            };
            list_scores.push(scores);
            list_labels.push(label);
        }

        Ok((list_scores, list_labels))
    }

    fn multiclass_row(&self, row: &[f32], label_map: &LabelMap) -> (Vec<LabeledScore>, String) {
        let probs = softmax(row);
        let best = argmax(&probs);
        let label = label_map.get(best).unwrap_or_default().to_string();
        (bind_scores(&probs, label_map), label)
    }

    fn multilabel_row(&self, row: &[f32], label_map: &LabelMap) -> (Vec<LabeledScore>, String) {
        let probs: Vec<f32> = row.iter().map(|&x| sigmoid(x)).collect();

        let predicted: Vec<&str> = label_map
            .iter()
            .zip(probs.iter())
            .filter(|(_, &p)| p > self.threshold)
            .map(|((_, label), _)| label)
            .collect();

        let label = if predicted.is_empty() {
            self.default_label.clone()
        } else {
            predicted.join(LABEL_SEPARATOR)
        };

        (bind_scores(&probs, label_map), label)
    }
}

/// Transform raw scores with explicit parameters
pub fn transform(
    raw_scores: &[RawScoreVector],
    task: TaskType,
    label_map: &LabelMap,
    multilabel_threshold: f32,
    default_label: &str,
) -> Result<TransformOutput> {
    ScoreTransformer::new(task)
        .with_threshold(multilabel_threshold)?
        .with_default_label(default_label)
        .transform(raw_scores, label_map)
}

fn check_dimensions(raw_scores: &[RawScoreVector], expected: usize) -> Result<()> {
    for (index, row) in raw_scores.iter().enumerate() {
        if row.len() != expected {
            return Err(Error::DimensionMismatch {
                index,
                expected,
                actual: row.len(),
            });
        }
    }
    Ok(())
}

fn bind_scores(probs: &[f32], label_map: &LabelMap) -> Vec<LabeledScore> {
    label_map
        .iter()
        .zip(probs.iter())
        .map(|((_, label), &score)| LabeledScore::new(label, score))
        .collect()
}

/// Numerically stable softmax over one row
pub fn softmax(row: &[f32]) -> Vec<f32> {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = row.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Logistic sigmoid, evaluated without overflowing `exp`
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Index of the largest value; the first one wins ties
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (index, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentiment_map() -> LabelMap {
        LabelMap::from_json_str(r#"{"0": "positive", "1": "negative"}"#).unwrap()
    }

    fn abc_map() -> LabelMap {
        LabelMap::new(["A", "B", "C"]).unwrap()
    }

    #[test]
    fn test_multiclass_sentiment_scenario() {
        let (scores, labels) = transform(
            &[vec![2.0, 0.1]],
            TaskType::Multiclass,
            &sentiment_map(),
            0.5,
            "NONE",
        )
        .unwrap();

        assert_eq!(labels, vec!["positive"]);
        assert_eq!(scores[0][0].label, "positive");
        assert!((scores[0][0].score - 0.8699).abs() < 1e-3);
        assert_eq!(scores[0][1].label, "negative");
        assert!((scores[0][1].score - 0.1301).abs() < 1e-3);
    }

    #[test]
    fn test_multiclass_rows_sum_to_one() {
        let transformer = ScoreTransformer::new(TaskType::Multiclass);
        let (scores, _) = transformer
            .transform(
                &[vec![1.0, 2.0, 3.0], vec![-100.0, 0.0, 100.0], vec![0.0, 0.0, 0.0]],
                &abc_map(),
            )
            .unwrap();

        for row in scores {
            let sum: f32 = row.iter().map(|s| s.score).sum();
            assert!((sum - 1.0).abs() < 1e-5, "row sums to {}", sum);
        }
    }

    #[test]
    fn test_multiclass_tie_goes_to_lowest_index() {
        let transformer = ScoreTransformer::new(TaskType::Multiclass);
        let (_, labels) = transformer
            .transform(&[vec![0.3, 1.5, 1.5]], &abc_map())
            .unwrap();
        assert_eq!(labels, vec!["B"]);
    }

    #[test]
    fn test_softmax_survives_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!(probs.iter().all(|p| p.is_finite()));
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_multilabel_all_low_falls_back_to_default() {
        let (scores, labels) = transform(
            &[vec![-5.0, -5.0, -5.0]],
            TaskType::Multilabel,
            &abc_map(),
            0.5,
            "NONE",
        )
        .unwrap();

        assert_eq!(labels, vec!["NONE"]);
        assert!(scores[0].iter().all(|s| s.score > 0.0 && s.score < 0.5));
    }

    #[test]
    fn test_multilabel_joins_in_index_order() {
        let transformer = ScoreTransformer::new(TaskType::Multilabel);
        let (_, labels) = transformer
            .transform(&[vec![3.0, -3.0, 0.5]], &abc_map())
            .unwrap();
        assert_eq!(labels, vec!["A,C"]);
    }

    #[test]
    fn test_multilabel_threshold_is_strict() {
        // sigmoid(0) == 0.5 exactly
        let transformer = ScoreTransformer::new(TaskType::Multilabel).with_default_label("none");
        let (_, labels) = transformer
            .transform(&[vec![0.0, 0.0, 0.0]], &abc_map())
            .unwrap();
        assert_eq!(labels, vec!["none"]);
    }

    #[test]
    fn test_custom_threshold() {
        let transformer = ScoreTransformer::new(TaskType::Multilabel)
            .with_threshold(0.9)
            .unwrap();
        let (_, labels) = transformer
            .transform(&[vec![1.0, 3.0, 5.0]], &abc_map())
            .unwrap();
        // sigmoid(1)=0.73, sigmoid(3)=0.95, sigmoid(5)=0.99
        assert_eq!(labels, vec!["B,C"]);
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        for threshold in [-0.1, 1.5, f32::NAN] {
            let err = ScoreTransformer::new(TaskType::Multilabel)
                .with_threshold(threshold)
                .unwrap_err();
            assert!(matches!(err, Error::Config(_)));
        }
    }

    #[test]
    fn test_short_row_is_dimension_mismatch() {
        let err = ScoreTransformer::new(TaskType::Multiclass)
            .transform(&[vec![0.1, 0.2, 0.3], vec![0.1, 0.2]], &abc_map())
            .unwrap_err();

        match err {
            Error::DimensionMismatch {
                index,
                expected,
                actual,
            } => {
                assert_eq!(index, 1);
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("Expected DimensionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_batch() {
        let (scores, labels) = ScoreTransformer::new(TaskType::Multilabel)
            .transform(&[], &abc_map())
            .unwrap();
        assert!(scores.is_empty());
        assert!(labels.is_empty());
    }

    #[test]
    fn test_sigmoid_extremes() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert!(sigmoid(1000.0) <= 1.0);
        assert!(sigmoid(-1000.0).is_finite());
    }

    #[test]
    fn test_argmax_first_wins() {
        assert_eq!(argmax(&[1.0, 1.0]), 0);
        assert_eq!(argmax(&[0.0, 2.0, 2.0, 1.0]), 1);
        assert_eq!(argmax(&[]), 0);
    }
}
