#![forbid(unsafe_code)]

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::OutputStyle;
use crate::graph::Context;
use crate::table::{Cell, Table};
use crate::types::{QvogError, Result};

/// Headers and rendered rows of a result table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    /// Column names in order.
    pub headers: Vec<String>,
    /// Rendered cells, one vector per row.
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    /// View without rows.
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Appends a row; its length must match the headers.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.headers.len() {
            return Err(QvogError::Configuration(format!(
                "row has {} cells but the table has {} headers",
                row.len(),
                self.headers.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Renders every cell of `table`, resolving nodes through `graph`.
    pub fn from_table(table: &Table, graph: &Context) -> Result<Self> {
        let mut view = TableView::new(table.headers().into_iter().map(String::from).collect());
        for index in 0..table.row_count() {
            let row = table
                .row_without_header(index)?
                .iter()
                .map(|cell| render_cell(cell, graph))
                .collect();
            view.push_row(row)?;
        }
        Ok(view)
    }
}

/// Text form of one cell.
///
/// Values print as their node, paths as their line chain, text verbatim,
/// and nulls as the empty string. A value whose node is no longer
/// registered, for example after eviction from a bounded registry, prints
/// as its syntax kind.
pub fn render_cell(cell: &Cell, graph: &Context) -> String {
    match cell {
        Cell::Null => String::new(),
        Cell::Value(value) => match graph.get_node(value) {
            Ok(node) => node.to_string(),
            Err(err) => {
                warn!(identifier = value.identifier(), error = %err, "render.node.missing");
                value.identifier().to_string()
            }
        },
        Cell::Text(text) => text.clone(),
        Cell::Path(path) => path.describe(graph),
    }
}

/// Renders a [`TableView`] in one [`OutputStyle`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TablePrettifier {
    style: OutputStyle,
}

impl TablePrettifier {
    /// Prettifier for `style`.
    pub fn new(style: OutputStyle) -> Self {
        Self { style }
    }

    /// Rendered table.
    pub fn format(&self, view: &TableView) -> Result<String> {
        match self.style {
            OutputStyle::Markdown => Ok(markdown(view)),
            OutputStyle::Json => to_json(view, false),
            OutputStyle::JsonMin => to_json(view, true),
        }
    }
}

fn markdown(view: &TableView) -> String {
    let mut out = String::from("\n|");
    for header in &view.headers {
        let _ = write!(out, " {header} |");
    }
    out.push_str("\n|");
    for _ in &view.headers {
        out.push_str(" --- |");
    }
    out.push('\n');
    for row in &view.rows {
        out.push('|');
        for cell in row {
            let _ = write!(out, " {cell} |");
        }
        out.push('\n');
    }
    out
}

/// Serializes `value` compactly or with four-space indentation.
pub(crate) fn to_json<T: Serialize>(value: &T, minify: bool) -> Result<String> {
    if minify {
        return Ok(serde_json::to_string(value)?);
    }
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|err| QvogError::Parse(err.to_string()))
}
