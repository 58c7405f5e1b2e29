//! Column mapping configuration for the transformer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Dtype a column is cast to during transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetType {
    String,
    Int64,
    Float64,
    Boolean,
    Datetime,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::String => "string",
            TargetType::Int64 => "int64",
            TargetType::Float64 => "float64",
            TargetType::Boolean => "bool",
            TargetType::Datetime => "datetime",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "string" | "str" | "object" => Ok(TargetType::String),
            "int64" | "int" | "integer" => Ok(TargetType::Int64),
            "float64" | "float" | "number" => Ok(TargetType::Float64),
            "bool" | "boolean" => Ok(TargetType::Boolean),
            "datetime" | "datetime64" | "datetime64[ns]" => Ok(TargetType::Datetime),
            _ => Err(ModelError::UnknownTargetType(s.to_string())),
        }
    }
}

impl TryFrom<String> for TargetType {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetType> for String {
    fn from(value: TargetType) -> Self {
        value.as_str().to_string()
    }
}

/// A constant injected as a column on every row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(v) => write!(f, "{v}"),
            MetadataValue::Integer(v) => write!(f, "{v}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Rename, cast and metadata rules applied to every batch.
///
/// Keys are kept in sorted maps so transformation output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    /// Source column name -> target column name.
    #[serde(default)]
    pub column_mappings: BTreeMap<String, String>,
    /// Column name (pre- or post-rename) -> target dtype.
    #[serde(default)]
    pub type_conversions: BTreeMap<String, TargetType>,
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl MappingConfig {
    /// Name a source column carries after renaming.
    pub fn target_column<'a>(&'a self, source: &'a str) -> &'a str {
        self.column_mappings
            .get(source)
            .map_or(source, String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.column_mappings.is_empty()
            && self.type_conversions.is_empty()
            && self.metadata.is_empty()
    }
}
