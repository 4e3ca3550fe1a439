//! Shape normalization for flow documents.

use crate::error::{CrewError, Result};
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use std::path::Path;

/// A definition together with its structural lookup key, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<T> {
    pub key: String,
    pub spec: T,
}

/// A definition type that can appear in a flow document.
pub trait DocumentEntry: DeserializeOwned {
    /// Human-readable kind used in error messages ("agent", "task").
    const KIND: &'static str;

    /// Key assigned to an entry of a list-shaped document.
    fn list_key(&self, index: usize) -> String;
}

/// Parse a document into ordered records.
///
/// Accepts a mapping (`key: {...}`) or a list (`- {...}`). Null entries are
/// skipped and an empty or null document yields no records. `path` is only
/// used for error messages.
pub fn parse_records<T: DocumentEntry>(path: &Path, content: &str) -> Result<Vec<Record<T>>> {
    let root: Value = serde_yaml::from_str(content).map_err(|e| CrewError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    match root {
        Value::Null => Ok(Vec::new()),
        Value::Mapping(mapping) => {
            let mut records = Vec::with_capacity(mapping.len());
            for (raw_key, body) in mapping {
                let key = scalar_key(&raw_key).ok_or_else(|| CrewError::Parse {
                    path: path.to_path_buf(),
                    message: format!("{} keys must be strings, found {:?}", T::KIND, raw_key),
                })?;
                if body.is_null() {
                    tracing::debug!(kind = T::KIND, key = %key, "skipping empty definition");
                    continue;
                }
                let spec = decode::<T>(path, &key, body)?;
                records.push(Record { key, spec });
            }
            Ok(records)
        }
        Value::Sequence(items) => {
            let mut records = Vec::with_capacity(items.len());
            for (index, body) in items.into_iter().enumerate() {
                if body.is_null() {
                    tracing::debug!(kind = T::KIND, index, "skipping empty definition");
                    continue;
                }
                let spec = decode::<T>(path, &format!("#{}", index), body)?;
                records.push(Record {
                    key: spec.list_key(index),
                    spec,
                });
            }
            Ok(records)
        }
        other => Err(CrewError::Parse {
            path: path.to_path_buf(),
            message: format!(
                "expected a mapping or a list of {} definitions, found {}",
                T::KIND,
                value_kind(&other)
            ),
        }),
    }
}

fn decode<T: DocumentEntry>(path: &Path, key: &str, body: Value) -> Result<T> {
    serde_yaml::from_value(body).map_err(|e| CrewError::Parse {
        path: path.to_path_buf(),
        message: format!("{} '{}': {}", T::KIND, key, e),
    })
}

/// Mapping keys written as bare numbers or booleans are still usable as keys.
fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
