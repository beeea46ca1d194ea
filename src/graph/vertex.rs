#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::types::{EdgeId, VertexId};

/// Label carried by vertices that represent one line of code.
pub const CODE_LABEL: &str = "code";
/// Label carried by vertices that represent a source file.
pub const FILE_LABEL: &str = "file";

/// One entry of a multi-valued vertex property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexProperty {
    /// Raw property payload.
    pub value: JsonValue,
}

/// Raw vertex record as listed by the graph store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Store-assigned identifier.
    pub id: VertexId,
    /// Vertex label (`code`, `file`, ...).
    pub label: String,
    /// Multi-valued properties keyed by name.
    #[serde(default)]
    pub properties: BTreeMap<String, Vec<VertexProperty>>,
}

impl Vertex {
    /// Creates a vertex without properties.
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id: VertexId(id),
            label: label.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Appends a property value, keeping earlier values for the same name.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.properties
            .entry(name.into())
            .or_default()
            .push(VertexProperty {
                value: value.into(),
            });
        self
    }

    /// First value of the named property.
    pub fn property(&self, name: &str) -> Option<&JsonValue> {
        self.properties
            .get(name)
            .and_then(|values| values.first())
            .map(|prop| &prop.value)
    }

    /// First value of the named property rendered as text.
    ///
    /// Strings are returned verbatim; other scalars use their JSON form.
    pub fn property_text(&self, name: &str) -> Option<String> {
        self.property(name).map(|value| match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Raw edge record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Store-assigned identifier.
    pub id: EdgeId,
    /// Edge label.
    pub label: String,
    /// Tail vertex.
    #[serde(rename = "outV")]
    pub out_v: VertexId,
    /// Head vertex.
    #[serde(rename = "inV")]
    pub in_v: VertexId,
    /// Single-valued edge properties.
    #[serde(default)]
    pub properties: BTreeMap<String, JsonValue>,
}

impl Edge {
    /// Creates an edge from `out_v` to `in_v`.
    pub fn new(id: u64, label: impl Into<String>, out_v: u64, in_v: u64) -> Self {
        Self {
            id: EdgeId(id),
            label: label.into(),
            out_v: VertexId(out_v),
            in_v: VertexId(in_v),
            properties: BTreeMap::new(),
        }
    }
}
