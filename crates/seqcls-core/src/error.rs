//! Error types for seqcls

/// Result type alias using seqcls's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for seqcls operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Task selector is neither multiclass nor multilabel
    #[error("unsupported task type: '{0}' (expected 'multiclass' or 'multilabel')")]
    UnsupportedTaskType(String),

    /// Raw score vector length does not match the label count
    #[error("dimension mismatch at item {index}: expected {expected} scores (one per label), got {actual}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// Text encoding (tokenization) failed
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Model scoring (forward pass) failed
    #[error("scoring error: {0}")]
    Scoring(String),

    /// id-to-label mapping is malformed
    #[error("label map format error: {0}")]
    LabelMapFormat(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Model or tokenizer artifacts could not be loaded
    #[error("model error: {0}")]
    Model(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a new encoding error
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Create a new scoring error
    pub fn scoring(msg: impl Into<String>) -> Self {
        Self::Scoring(msg.into())
    }

    /// Create a new label map format error
    pub fn label_map(msg: impl Into<String>) -> Self {
        Self::LabelMapFormat(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new model loading error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message_names_lengths() {
        let err = Error::DimensionMismatch {
            index: 3,
            expected: 2,
            actual: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("item 3"));
        assert!(msg.contains("expected 2"));
        assert!(msg.contains("got 1"));
    }

    #[test]
    fn test_unsupported_task_type_message_names_selector() {
        let err = Error::UnsupportedTaskType("regression".to_string());
        assert!(err.to_string().contains("'regression'"));
    }
}
