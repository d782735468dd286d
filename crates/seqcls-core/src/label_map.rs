//! Dense id-to-label mapping

use crate::error::{Error, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Mapping from class index to label name
///
/// Indices are always dense `0..len()`; construction rejects gaps, so every
/// position of a raw score vector has exactly one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    /// Build from labels already in index order
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(Error::label_map("label map is empty"));
        }
        Ok(Self { labels })
    }

    /// Build from `(index, label)` pairs in any order
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        let mut by_index = BTreeMap::new();
        for (index, label) in pairs {
            if by_index.insert(index, label.into()).is_some() {
                return Err(Error::label_map(format!("duplicate index {}", index)));
            }
        }

        for (expected, index) in by_index.keys().enumerate() {
            if *index != expected {
                return Err(Error::label_map(format!(
                    "indices must be contiguous from 0: missing index {}",
                    expected
                )));
            }
        }

        Self::new(by_index.into_values())
    }

    /// Parse a JSON object such as `{"0": "positive", "1": "negative"}`
    ///
    /// Every entry is kept as written, so a repeated key is reported as a
    /// duplicate index rather than silently overwritten.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let RawEntries(entries) = serde_json::from_str(json)
            .map_err(|e| Error::label_map(format!("invalid JSON: {}", e)))?;

        let mut pairs = Vec::with_capacity(entries.len());
        for (key, label) in entries {
            let index: usize = key.trim().parse().map_err(|_| {
                Error::label_map(format!("key '{}' is not a non-negative integer", key))
            })?;
            let label = label.as_str().ok_or_else(|| {
                Error::label_map(format!("label for index {} is not a string", index))
            })?;
            pairs.push((index, label.to_string()));
        }

        Self::from_pairs(pairs)
    }

    /// Load from a JSON file on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::label_map(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&contents).map_err(|e| match e {
            Error::LabelMapFormat(msg) => {
                Error::label_map(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false for a constructed map
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for a class index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    /// Labels in index order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// `(index, label)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().map(String::as_str).enumerate()
    }
}

impl fmt::Display for LabelMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.labels.join(", "))
    }
}

// Object entries in document order, repeats included.
struct RawEntries(Vec<(String, serde_json::Value)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object of index -> label")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<RawEntries, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, serde_json::Value>()? {
                    entries.push(entry);
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

// Written back in the same shape it is read from.
impl Serialize for LabelMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.labels.len()))?;
        for (index, label) in self.iter() {
            map.serialize_entry(&index.to_string(), label)?;
        }
        map.end()
    }
}
