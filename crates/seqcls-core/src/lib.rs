//! seqcls Core
//!
//! Core types and utilities shared across seqcls components.
//!
//! This crate provides:
//! - The data model for classification inputs and results
//! - The dense id-to-label mapping
//! - Error types and result handling

pub mod error;
pub mod label_map;
pub mod types;

pub use error::{Error, Result};
pub use label_map::LabelMap;
pub use types::{InferenceResult, InputItem, LabeledScore, RawScoreVector};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::label_map::LabelMap;
    pub use crate::types::{InferenceResult, InputItem, LabeledScore, RawScoreVector};
}
