//! Readers for configuration and data files

use seqcls_core::{Error, Result};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Deserialize a YAML file
pub fn read_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = File::open(path.as_ref())?;
    Ok(serde_yaml::from_reader(BufReader::new(file))?)
}

/// Deserialize a JSON file
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = File::open(path.as_ref())?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Deserialize a JSON-lines file, one value per non-blank line
///
/// A file with no records is an error, as is any line that fails to parse;
/// the error names the 1-based line number.
pub fn read_jsonl<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = serde_json::from_str(line).map_err(|e| {
            Error::config(format!(
                "{}: invalid JSON at line {}: {}",
                path.display(),
                index + 1,
                e
            ))
        })?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(Error::config(format!(
            "{}: empty JSONL file",
            path.display()
        )));
    }

    debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Read a whole text file, trimmed of surrounding whitespace
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    Ok(contents.trim().to_string())
}
