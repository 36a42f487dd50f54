//! Serde helpers for fields the catalog service does not type consistently.

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Integer(i64),
    Float(f64),
}

/// Accept an identifier sent either as `"7"` or `7`.
pub(crate) fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => Ok(s),
        StringOrNumber::Integer(n) => Ok(n.to_string()),
        StringOrNumber::Float(f) => Ok(f.to_string()),
    }
}

/// Accept a price sent either as a number or as a numeric string.
pub(crate) fn price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::Integer(n) => n as f64,
        StringOrNumber::Float(f) => f,
        StringOrNumber::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid price: {:?}", s)))?,
    };
    if value.is_finite() {
        Ok(value)
    } else {
        Err(de::Error::custom("price must be a finite number"))
    }
}
