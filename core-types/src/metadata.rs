// Copyright (c) James Kassemi, SC, US. All rights reserved.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Diagnostic key/value bag attached to discovered records.
pub type Metadata = BTreeMap<String, MetaValue>;

/// Primitive metadata value. Serialized without a tag so the json stays readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Bool(value) => write!(f, "{value}"),
            MetaValue::Int(value) => write!(f, "{value}"),
            MetaValue::Float(value) => write!(f, "{value}"),
            MetaValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Int(value)
    }
}

impl From<u32> for MetaValue {
    fn from(value: u32) -> Self {
        MetaValue::Int(i64::from(value))
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_values_round_trip_through_json() {
        let mut meta = Metadata::new();
        meta.insert("method".into(), "binary_search".into());
        meta.insert("iterations".into(), 11u32.into());
        meta.insert("elapsed_secs".into(), 12.5.into());
        meta.insert("forced".into(), false.into());

        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(
            json,
            r#"{"elapsed_secs":12.5,"forced":false,"iterations":11,"method":"binary_search"}"#
        );
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
    }
}
