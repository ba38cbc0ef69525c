//! Codec property maps and typed lookups

use crate::error::FilmboxError;
use serde::{Deserialize, Serialize};

/// String-keyed codec parameters as supplied by configuration
pub type PropertyMap = hashbrown::HashMap<String, PropertyValue>;

/// A single property value
///
/// Integers may also be given as strings in decimal or `0x` hex, which is how
/// 64-bit polynomials usually appear in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Unsigned integer
    UInt(u64),
    /// Signed integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Boolean flag
    Bool(bool),
    /// Free text
    Str(String),
}

impl PropertyValue {
    /// Interpret as an unsigned 64-bit integer
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PropertyValue::UInt(v) => Some(*v),
            PropertyValue::Int(v) => u64::try_from(*v).ok(),
            PropertyValue::Str(s) => parse_u64(s),
            PropertyValue::Float(_) | PropertyValue::Bool(_) => None,
        }
    }

    /// Interpret as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<u64> for PropertyValue {
    fn from(v: u64) -> Self {
        PropertyValue::UInt(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Str(v.to_string())
    }
}

fn parse_u64(s: &str) -> Option<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16).ok(),
        None => s.replace('_', "").parse().ok(),
    }
}

/// Build a [`PropertyMap`] from key/value pairs
pub fn properties<I, K, V>(pairs: I) -> PropertyMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<PropertyValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Required unsigned property; logs and fails when absent or mistyped
pub fn required_u64(
    props: &PropertyMap,
    codec: &'static str,
    key: &'static str,
) -> Result<u64, FilmboxError> {
    match props.get(key) {
        None => {
            #[cfg(feature = "logging")]
            tracing::error!("Requires property '{}' to be set", key);
            Err(FilmboxError::MissingProperty {
                codec,
                property: key,
            })
        }
        Some(value) => value.as_u64().ok_or_else(|| invalid(key, value)),
    }
}

/// Optional unsigned property with a default
pub fn optional_u64(props: &PropertyMap, key: &str, default: u64) -> Result<u64, FilmboxError> {
    match props.get(key) {
        None => Ok(default),
        Some(value) => value.as_u64().ok_or_else(|| invalid(key, value)),
    }
}

fn invalid(key: &str, value: &PropertyValue) -> FilmboxError {
    FilmboxError::InvalidProperty {
        property: key.to_string(),
        reason: format!("expected an unsigned integer, got {:?}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_forms() {
        assert_eq!(PropertyValue::UInt(5).as_u64(), Some(5));
        assert_eq!(PropertyValue::Int(-1).as_u64(), None);
        assert_eq!(
            PropertyValue::from("0x42F0_E1EB_A9EA_3693").as_u64(),
            Some(0x42F0_E1EB_A9EA_3693)
        );
        assert_eq!(PropertyValue::from("17").as_u64(), Some(17));
        assert_eq!(PropertyValue::Bool(true).as_u64(), None);
    }

    #[test]
    fn test_required_and_optional() {
        let props = properties([("seed", 3u64)]);
        assert_eq!(required_u64(&props, "crc64", "seed").unwrap(), 3);
        assert_eq!(
            required_u64(&props, "crc64", "polynomial").unwrap_err(),
            FilmboxError::MissingProperty {
                codec: "crc64",
                property: "polynomial"
            }
        );
        assert_eq!(optional_u64(&props, "length", 32).unwrap(), 32);
    }

    #[test]
    fn test_untagged_json() {
        let props: PropertyMap =
            serde_json::from_str(r#"{"polynomial": "0x1B", "seed": 0, "gain": 1.5}"#).unwrap();
        assert_eq!(props["polynomial"].as_u64(), Some(0x1B));
        assert_eq!(props["seed"], PropertyValue::UInt(0));
        assert_eq!(props["gain"], PropertyValue::Float(1.5));
    }
}
