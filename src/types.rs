//! Core value types shared by the store, entries, and projections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A typed setting value.
///
/// Serialized untagged, so the JSON form is the plain value. Variant order
/// matters for decoding: booleans and integers are tried before floats so
/// that `8010` decodes as `Int` and `true` never decodes as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Variant {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Variant>),
    Map(BTreeMap<String, Variant>),
}

impl Variant {
    /// The storage tag for this value.
    pub fn data_type(&self) -> DataType {
        DataType::infer(self)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Variant::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::Float(f) => Some(*f),
            Variant::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Variant]> {
        match self {
            Variant::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Variant>> {
        match self {
            Variant::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Whether every float in the value, nested ones included, is finite.
    ///
    /// JSON has no encoding for NaN or infinities.
    pub fn is_finite(&self) -> bool {
        match self {
            Variant::Float(f) => f.is_finite(),
            Variant::List(items) => items.iter().all(Variant::is_finite),
            Variant::Map(map) => map.values().all(Variant::is_finite),
            _ => true,
        }
    }

    /// Whether this is a string that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        matches!(self, Variant::String(s) if s.trim().is_empty())
    }

    /// Render the value as text: strings verbatim, everything else as JSON.
    pub fn to_text(&self) -> String {
        match self {
            Variant::String(s) => s.clone(),
            Variant::Bool(b) => b.to_string(),
            Variant::Int(i) => i.to_string(),
            Variant::Float(f) => f.to_string(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(value)
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Bool(value)
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Int(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Int(i64::from(value))
    }
}

impl From<u16> for Variant {
    fn from(value: u16) -> Self {
        Variant::Int(i64::from(value))
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::Float(value)
    }
}

impl From<Vec<Variant>> for Variant {
    fn from(value: Vec<Variant>) -> Self {
        Variant::List(value)
    }
}

impl From<BTreeMap<String, Variant>> for Variant {
    fn from(value: BTreeMap<String, Variant>) -> Self {
        Variant::Map(value)
    }
}

/// Storage tag recorded next to each value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Int,
    Float,
    Bool,
    List,
    #[serde(alias = "dict")]
    Map,
}

impl DataType {
    /// Infer the tag for a value.
    ///
    /// Checked in the order bool, int, float, list, map, string.
    pub fn infer(value: &Variant) -> Self {
        match value {
            Variant::Bool(_) => DataType::Bool,
            Variant::Int(_) => DataType::Int,
            Variant::Float(_) => DataType::Float,
            Variant::List(_) => DataType::List,
            Variant::Map(_) => DataType::Map,
            Variant::String(_) => DataType::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::Bool => "bool",
            DataType::List => "list",
            DataType::Map => "map",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "string" | "str" => Some(DataType::String),
            "int" | "integer" => Some(DataType::Int),
            "float" => Some(DataType::Float),
            "bool" | "boolean" => Some(DataType::Bool),
            "list" => Some(DataType::List),
            "map" | "dict" => Some(DataType::Map),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted envelope for one setting.
///
/// Wire shape: `{"value": .., "type": .., "category": .., "path": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub value: Variant,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub category: String,
    pub path: String,
}

impl Record {
    /// Build a record whose category is the first segment of `path`.
    pub fn new(path: impl Into<String>, value: Variant, data_type: DataType) -> Self {
        let path = path.into();
        Self {
            category: category_of(&path).to_string(),
            value,
            data_type,
            path,
        }
    }
}

/// First segment of a dotted path.
pub fn category_of(path: &str) -> &str {
    path.split_once('.').map_or(path, |(head, _)| head)
}
