//! seqcls I/O
//!
//! File plumbing around batch inference.
//!
//! Provides:
//! - YAML, JSON, JSON-lines and text readers
//! - Matching writers for predictions and run artefacts
//! - The per-run output directory layout

pub mod project;
pub mod reader;
pub mod writer;

pub use project::ProjectLayout;
pub use reader::{read_json, read_jsonl, read_text, read_yaml};
pub use writer::{write_json, write_jsonl, write_lines, write_yaml};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::project::ProjectLayout;
    pub use crate::reader::{read_json, read_jsonl, read_text, read_yaml};
    pub use crate::writer::{write_json, write_jsonl, write_lines, write_yaml};
}
