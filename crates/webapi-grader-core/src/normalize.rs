//! Template chain resolution for authored test cases.

use crate::types::{NormalizedTestCase, Params, RawTestCase};
use serde_json::Value;
use thiserror::Error;

/// Key that links a test case to the fragment it inherits from.
pub const TEMPLATE_KEY: &str = "template";

/// Errors that can occur while normalizing a test case.
#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("template must be a mapping, found {found}")]
    InvalidTemplate { found: &'static str },
    #[error("invalid test case: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Flatten the `template` chain of `raw` into a single mapping.
///
/// Each step removes `template` and copies in the fragment's fields that the
/// accumulated record does not already have, so the record closest to `raw`
/// wins. The merge is shallow: a nested mapping present on the child replaces
/// the fragment's mapping wholesale.
///
/// # Errors
/// Returns `NormalizeError::InvalidTemplate` if a `template` is neither a
/// mapping nor null.
pub fn flatten(raw: &RawTestCase) -> Result<Params, NormalizeError> {
    let mut record = raw.fields().clone();

    while let Some(template) = record.remove(TEMPLATE_KEY) {
        match template {
            Value::Object(fragment) => {
                for (key, value) in fragment {
                    if !record.contains_key(&key) {
                        record.insert(key, value);
                    }
                }
            }
            Value::Null => break,
            other => {
                return Err(NormalizeError::InvalidTemplate {
                    found: value_kind(&other),
                });
            }
        }
    }

    Ok(record)
}

/// Resolve the `template` chain and decode the result into a typed test case.
///
/// # Errors
/// Returns an error if the chain is malformed or a required section
/// (`title`, `generate`, `exec`, `expected`) is missing or has the wrong shape.
pub fn normalize(raw: &RawTestCase) -> Result<NormalizedTestCase, NormalizeError> {
    let record = flatten(raw)?;
    Ok(serde_json::from_value(Value::Object(record))?)
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
