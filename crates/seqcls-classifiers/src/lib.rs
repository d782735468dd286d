//! seqcls Classifiers
//!
//! Batched sequence-classification inference and logit post-processing.
//!
//! The pipeline has two layers:
//! - [`ScoreTransformer`]: pure softmax/sigmoid post-processing of logits into
//!   labelled scores and a label decision
//! - [`BatchInferenceDriver`]: chunks inputs, drives an injected [`Encoder`]
//!   and [`Scorer`], and hands the logits to the transformer
//!
//! [`model_loader`] provides the Candle/tokenizers implementations of the two
//! capabilities for BERT-family checkpoints.

pub mod capability;
pub mod config;
pub mod driver;
pub mod model_loader;
pub mod task;
pub mod transform;

pub use capability::{Encoder, EncodingBatch, Scorer};
pub use config::{build_driver, with_capabilities, InferenceConfig, ModelConfig};
pub use driver::{BatchInferenceDriver, DriverBuilder};
pub use model_loader::{BertScorer, DeviceType, ModelSource, TokenizerEncoder};
pub use task::TaskType;
pub use transform::{transform, ScoreTransformer};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::capability::{Encoder, EncodingBatch, Scorer};
    pub use crate::driver::{BatchInferenceDriver, DriverBuilder};
    pub use crate::task::TaskType;
    pub use crate::transform::ScoreTransformer;
    pub use seqcls_core::prelude::*;
}
