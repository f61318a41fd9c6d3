//! Stage configuration — literal and item-derived field specs.
//!
//! Every configurable field of a stage is either a literal value, fixed at
//! stage construction, or an item-derived path evaluated once per item. The
//! serialized form is the classic per-field mapping with keys
//! `{value, type, default}`; `type` selects literal coercion (`bool`,
//! `number`, `text`) or marks the field item-derived (`field`).
//!
//! A `StageConfig` is immutable for the stage's lifetime.

use super::item::Item;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Failure to resolve a configured field.
///
/// Dispatch never surfaces this — a per-item resolution failure degrades to
/// pass-through. Strict resolution is reserved for stage-level required
/// config such as a feed URL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("field '{path}' not present on item and no default configured")]
    MissingField { path: String },

    #[error("config entry '{name}' missing or not a literal")]
    MissingEntry { name: String },
}

/// A configured field: a fixed literal or an item-derived expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldSpec {
    /// Use this value for every item.
    Literal(Value),
    /// Evaluate `path` against each item, falling back to `default`.
    Derived {
        path: String,
        default: Option<Value>,
    },
}

impl FieldSpec {
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    pub fn derived(path: impl Into<String>) -> Self {
        Self::Derived {
            path: path.into(),
            default: None,
        }
    }

    pub fn derived_or(path: impl Into<String>, default: impl Into<Value>) -> Self {
        Self::Derived {
            path: path.into(),
            default: Some(default.into()),
        }
    }

    /// Resolve against one item. Literals ignore the item entirely.
    pub fn resolve(&self, item: &Item) -> Result<Value, ResolveError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::Derived { path, default } => item
                .lookup(path)
                .cloned()
                .or_else(|| default.clone())
                .ok_or_else(|| ResolveError::MissingField { path: path.clone() }),
        }
    }
}

/// Serialized per-field form: `{value, type, default}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldConf {
    pub value: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub default: Option<Value>,
}

impl From<FieldConf> for FieldSpec {
    fn from(conf: FieldConf) -> Self {
        match conf.kind.as_deref() {
            Some("field") => FieldSpec::Derived {
                path: conf
                    .value
                    .as_ref()
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                default: conf.default,
            },
            Some("bool") => FieldSpec::Literal(Value::Bool(
                conf.value.as_ref().map(coerce_bool).unwrap_or(false),
            )),
            Some("number") | Some("float") => FieldSpec::Literal(
                conf.value
                    .as_ref()
                    .and_then(coerce_number)
                    .map(Value::from)
                    .unwrap_or(Value::Null),
            ),
            _ => FieldSpec::Literal(conf.value.or(conf.default).unwrap_or(Value::Null)),
        }
    }
}

/// Coerce `"0"`/`"1"`/`"true"`/`"false"`/bool into a bool. Anything else is false.
fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "True"),
        _ => false,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Resolved configuration for one stage instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageConfig {
    fields: BTreeMap<String, FieldSpec>,
}

impl StageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style entry insertion.
    pub fn with(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// The literal value of an entry, if it is a literal.
    pub fn literal(&self, name: &str) -> Option<Value> {
        match self.fields.get(name) {
            Some(FieldSpec::Literal(v)) if !v.is_null() => Some(v.clone()),
            _ => None,
        }
    }

    pub fn literal_str(&self, name: &str) -> Option<String> {
        self.literal(name)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn literal_bool(&self, name: &str) -> bool {
        self.literal(name).as_ref().map(coerce_bool).unwrap_or(false)
    }

    /// Strict lookup for required stage-level config.
    pub fn require_str(&self, name: &str) -> Result<String, ResolveError> {
        self.literal_str(name).ok_or_else(|| ResolveError::MissingEntry {
            name: name.to_string(),
        })
    }

    /// Parse from the serialized `{field: {value, type, default}}` form.
    pub fn from_json(raw: Value) -> Result<Self, serde_json::Error> {
        let raw: BTreeMap<String, FieldConf> = serde_json::from_value(raw)?;
        Ok(raw
            .into_iter()
            .map(|(name, conf)| (name, FieldSpec::from(conf)))
            .collect())
    }

    /// Parse a TOML stage manifest in the same per-field form.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        let raw: BTreeMap<String, FieldConf> = toml::from_str(raw)?;
        Ok(raw
            .into_iter()
            .map(|(name, conf)| (name, FieldSpec::from(conf)))
            .collect())
    }
}

impl FromIterator<(String, FieldSpec)> for StageConfig {
    fn from_iter<I: IntoIterator<Item = (String, FieldSpec)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
