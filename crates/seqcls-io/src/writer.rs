//! Writers for results and run artefacts
//!
//! All writers create or truncate the target file and write UTF-8 as-is
//! (no ASCII escaping).

use seqcls_core::Result;
use serde::Serialize;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// Write each item on its own line
pub fn write_lines<I, T>(path: impl AsRef<Path>, items: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    let mut writer = create(path.as_ref())?;
    for item in items {
        writeln!(writer, "{}", item)?;
    }
    writer.flush()?;
    Ok(())
}

/// Serialize a value as YAML, keeping field order
pub fn write_yaml<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let mut writer = create(path.as_ref())?;
    serde_yaml::to_writer(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Serialize a value as pretty-printed JSON
pub fn write_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let mut writer = create(path.as_ref())?;
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Serialize each value as one JSON line
pub fn write_jsonl<I, T>(path: impl AsRef<Path>, values: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Serialize,
{
    let path = path.as_ref();
    let mut writer = create(path)?;
    let mut count = 0usize;
    for value in values {
        serde_json::to_writer(&mut writer, &value)?;
        writer.write_all(b"\n")?;
        count += 1;
    }
    writer.flush()?;

    debug!("Wrote {} records to {}", count, path.display());
    Ok(())
}
