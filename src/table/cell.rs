#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use crate::graph::{FlowPath, ValueExt, ValueRef};

/// Single table cell.
#[derive(Clone, Debug, Default)]
pub enum Cell {
    /// Padding or missing data.
    #[default]
    Null,
    /// Semantic value.
    Value(ValueRef),
    /// Literal text.
    Text(String),
    /// Flow result.
    Path(FlowPath),
}

/// One table row keyed by column name.
pub type Row = BTreeMap<String, Cell>;

impl Cell {
    /// `true` for [`Cell::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Value payload.
    pub fn as_value(&self) -> Option<&ValueRef> {
        match self {
            Cell::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Path payload.
    pub fn as_path(&self) -> Option<&FlowPath> {
        match self {
            Cell::Path(path) => Some(path),
            _ => None,
        }
    }
}

/// Values compare by identity, paths step by step.
impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Null, Cell::Null) => true,
            (Cell::Value(a), Cell::Value(b)) => a.same_as(b),
            (Cell::Text(a), Cell::Text(b)) => a == b,
            (Cell::Path(a), Cell::Path(b)) => a.same_as(b),
            _ => false,
        }
    }
}

impl From<ValueRef> for Cell {
    fn from(value: ValueRef) -> Self {
        Cell::Value(value)
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::Text(text)
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

impl From<FlowPath> for Cell {
    fn from(path: FlowPath) -> Self {
        Cell::Path(path)
    }
}
