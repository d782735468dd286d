//! Run directory layout
//!
//! Every run gets `<output_dir>/<project>/<group>/<run>/` with a fixed set of
//! subdirectories for artefacts.

use seqcls_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Subdirectories created under each run directory
pub const RUN_SUBDIRS: [&str; 4] = ["model", "cache", "checkpoints", "onnx"];

/// Paths of an initialised run directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    run_dir: PathBuf,
}

impl ProjectLayout {
    /// Create the run directory and its subdirectories
    ///
    /// Existing directories are reused, so re-running with the same names
    /// writes into the same place.
    pub fn init(
        output_dir: impl AsRef<Path>,
        project: &str,
        group: &str,
        run: &str,
    ) -> Result<Self> {
        for (field, value) in [("project", project), ("group", group), ("run", run)] {
            validate_component(field, value)?;
        }

        let run_dir = output_dir.as_ref().join(project).join(group).join(run);
        for sub in RUN_SUBDIRS {
            std::fs::create_dir_all(run_dir.join(sub))?;
        }

        info!("Initialized run directory {}", run_dir.display());
        Ok(Self { run_dir })
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn model_dir(&self) -> PathBuf {
        self.run_dir.join("model")
    }

    /// Scratch space for logs and intermediate outputs
    pub fn cache_dir(&self) -> PathBuf {
        self.run_dir.join("cache")
    }

    pub fn checkpoints_dir(&self) -> PathBuf {
        self.run_dir.join("checkpoints")
    }

    pub fn onnx_dir(&self) -> PathBuf {
        self.run_dir.join("onnx")
    }
}

// A name must stay a single path component under its parent.
fn validate_component(field: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::config(format!("{} name must not be empty", field)));
    }
    if trimmed == "." || trimmed == ".." || value.contains(['/', '\\']) {
        return Err(Error::config(format!(
            "{} name '{}' must be a single directory name",
            field, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ProjectLayout::init(dir.path(), "demo", "sentiment", "run-1").unwrap();

        assert_eq!(
            layout.run_dir(),
            dir.path().join("demo").join("sentiment").join("run-1")
        );
        for sub in RUN_SUBDIRS {
            assert!(layout.run_dir().join(sub).is_dir(), "missing {}", sub);
        }
        assert_eq!(layout.cache_dir(), layout.run_dir().join("cache"));
    }

    #[test]
    fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let first = ProjectLayout::init(dir.path(), "p", "g", "r").unwrap();
        std::fs::write(first.cache_dir().join("keep.txt"), "x").unwrap();

        let second = ProjectLayout::init(dir.path(), "p", "g", "r").unwrap();
        assert_eq!(first, second);
        assert!(second.cache_dir().join("keep.txt").exists());
    }

    #[test]
    fn test_rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProjectLayout::init(dir.path(), "", "g", "r").is_err());
        assert!(ProjectLayout::init(dir.path(), "p", "..", "r").is_err());
        assert!(ProjectLayout::init(dir.path(), "p", "g", "a/b").is_err());
    }
}
