//! Records as returned by the remote inventory API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{"value": [...]}` envelope used by provider list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListEnvelope {
    #[serde(default)]
    pub value: Vec<RawRecord>,
}

/// A resource group or resource record as fetched from the provider.
///
/// Loosely typed on purpose: `properties`, `tags` and `sku` are kept as raw JSON and
/// normalized through the accessor methods, so a malformed bag never fails the decode
/// of the whole list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub properties: Value,
    #[serde(default)]
    pub tags: Value,
    #[serde(default)]
    pub sku: Value,
    #[serde(default)]
    pub kind: Value,
}

impl RawRecord {
    /// The natural key: the provider id, lowercased.
    pub fn normalized_id(&self) -> String {
        self.id.to_lowercase()
    }

    /// The `properties` bag, or an empty object when missing or not an object.
    pub fn metas(&self) -> Value {
        match &self.properties {
            Value::Object(map) => Value::Object(map.clone()),
            _ => Value::Object(Map::new()),
        }
    }

    /// Tags as name/value pairs. Anything that is not an object yields no tags;
    /// non-string values are kept in their JSON text form.
    pub fn tags(&self) -> BTreeMap<String, String> {
        match &self.tags {
            Value::Object(map) => map
                .iter()
                .map(|(name, value)| {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (name.clone(), value)
                })
                .collect(),
            _ => BTreeMap::new(),
        }
    }

    /// The `sku` value when the record carries a non-empty one.
    pub fn sku(&self) -> Option<Value> {
        is_present(&self.sku).then(|| self.sku.clone())
    }

    /// The `kind` value when the record carries a non-empty one.
    pub fn kind(&self) -> Option<String> {
        if !is_present(&self.kind) {
            return None;
        }
        match &self.kind {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}
