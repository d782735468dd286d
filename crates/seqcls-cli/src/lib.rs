//! seqcls command-line runner
//!
//! Wires a YAML run configuration to the batch inference driver: creates the
//! run directory, installs logging, loads the model, and writes predictions
//! and logits as JSON lines.

pub mod cli;
pub mod config;
pub mod logging;
pub mod pipeline;

pub use cli::Cli;
pub use config::{DataConfig, LogConfig, LogRotation, RunConfig};
pub use pipeline::{prediction_records, run, run_with_driver, RunSummary};
