//! Classification task shapes

use seqcls_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How raw scores are turned into a decision
///
/// Parsed once at configuration time, so an unknown selector never reaches
/// the batch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TaskType {
    /// Mutually exclusive classes: softmax, one label per item
    Multiclass,
    /// Independent classes: sigmoid, thresholded label set per item
    Multilabel,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Multiclass => "multiclass",
            Self::Multilabel => "multilabel",
        }
    }
}

impl Default for TaskType {
    fn default() -> Self {
        Self::Multiclass
    }
}

impl FromStr for TaskType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multiclass" | "multi-class" | "single-label" => Ok(Self::Multiclass),
            "multilabel" | "multi-label" => Ok(Self::Multilabel),
            _ => Err(Error::UnsupportedTaskType(s.to_string())),
        }
    }
}

impl TryFrom<String> for TaskType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TaskType> for String {
    fn from(task: TaskType) -> Self {
        task.as_str().to_string()
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
