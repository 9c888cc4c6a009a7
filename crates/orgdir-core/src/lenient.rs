//! Tolerant deserializers for CRM payloads.
//!
//! The CRM and the enrichment service are loose about scalar types: the same
//! identifier arrives as `42` from one endpoint and `"42"` from another, and
//! membership lists mix numbers with numeric strings. These helpers are used
//! with `#[serde(deserialize_with = "...")]` and normalise everything to one
//! Rust type.

use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::Value;

/// A string or number identifier, normalised to a string.
pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  match Value::deserialize(deserializer)? {
    Value::String(s) => Ok(s),
    Value::Number(n) => Ok(n.to_string()),
    other => Err(D::Error::custom(format!(
      "expected a string or number identifier, got {other}"
    ))),
  }
}

/// Like [`id`], but `null`, a missing field and `""` all mean "no value".
pub fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  match Value::deserialize(deserializer)? {
    Value::Null => Ok(None),
    Value::String(s) if s.is_empty() => Ok(None),
    Value::String(s) => Ok(Some(s)),
    Value::Number(n) => Ok(Some(n.to_string())),
    other => Err(D::Error::custom(format!(
      "expected a string or number identifier, got {other}"
    ))),
  }
}

/// Any scalar rendered as text; `null` becomes `None`.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Value::deserialize(deserializer)? {
    Value::Null => None,
    Value::String(s) => Some(s),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    other => Some(other.to_string()),
  })
}

/// An integer sent as a number or a numeric string. Unparseable values
/// become `0`.
pub fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Value::deserialize(deserializer)? {
    Value::Number(n) => n.as_i64().unwrap_or_default(),
    Value::String(s) => s.trim().parse().unwrap_or_default(),
    _ => 0,
  })
}

/// A boolean flag: JSON booleans, `"Y"`/`"N"`, `"true"`/`"false"`, `1`/`0`.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Value::deserialize(deserializer)? {
    Value::Bool(b) => b,
    Value::String(s) => matches!(s.as_str(), "Y" | "y" | "true" | "1"),
    Value::Number(n) => n.as_i64().is_some_and(|v| v != 0),
    _ => false,
  })
}

/// A list of numeric department identifiers. Entries that are neither
/// numbers nor numeric strings are skipped; `null` is an empty list.
pub fn department_ids<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
  D: Deserializer<'de>,
{
  let items = match Value::deserialize(deserializer)? {
    Value::Array(items) => items,
    Value::Null => return Ok(Vec::new()),
    single => vec![single],
  };
  Ok(
    items
      .into_iter()
      .filter_map(|item| match item {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
      })
      .collect(),
  )
}
