#![forbid(unsafe_code)]

//! Predicates used by from, filter, and flow stages.
//!
//! Filters dispatch on the closed [`FilterPredicate`] sum instead of
//! inspecting predicate types at runtime.

use std::fmt;
use std::sync::Arc;

use crate::graph::{CodeProperty, Context, FlowPath, GraphNode, ValueExt, ValueRef};
use crate::table::Row;

type ValueTest = dyn Fn(&ValueRef) -> bool + Send + Sync;
type RowTest = dyn Fn(&Row) -> bool + Send + Sync;
type FlowTest = dyn Fn(&FlowPath) -> bool + Send + Sync;

/// Test applied to a single value.
#[derive(Clone)]
pub struct ValuePredicate(Arc<ValueTest>);

impl ValuePredicate {
    /// Wraps a closure.
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&ValueRef) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(test))
    }

    /// Accepts every value.
    pub fn any() -> Self {
        Self::new(|_| true)
    }

    /// Rejects every value.
    pub fn none() -> Self {
        Self::new(|_| false)
    }

    /// Matches values of one syntax kind.
    pub fn identifier(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self::new(move |value| value.identifier() == kind)
    }

    /// Matches values with at least one descendant (or self) accepted by `inner`.
    pub fn contains(inner: ValuePredicate) -> Self {
        Self::new(move |value| value.stream().any(|child| inner.test(&child)))
    }

    /// Tests the node a value was resolved from.
    ///
    /// Values whose node is not registered in `context` are rejected.
    pub fn node<F>(context: Arc<Context>, test: F) -> Self
    where
        F: Fn(&GraphNode) -> bool + Send + Sync + 'static,
    {
        Self::new(move |value| {
            context
                .get_node(value)
                .map(|node| test(&node))
                .unwrap_or(false)
        })
    }

    /// Tests the code-line metadata of the node a value was resolved from.
    pub fn code<F>(context: Arc<Context>, test: F) -> Self
    where
        F: Fn(&CodeProperty) -> bool + Send + Sync + 'static,
    {
        Self::node(context, move |node| node.as_code().map_or(false, &test))
    }

    /// Evaluates the predicate.
    pub fn test(&self, value: &ValueRef) -> bool {
        (self.0)(value)
    }

    /// Both predicates hold.
    pub fn and(self, other: ValuePredicate) -> Self {
        Self::new(move |value| self.test(value) && other.test(value))
    }

    /// Either predicate holds.
    pub fn or(self, other: ValuePredicate) -> Self {
        Self::new(move |value| self.test(value) || other.test(value))
    }

    /// Negation.
    pub fn not(self) -> Self {
        Self::new(move |value| !self.test(value))
    }
}

impl fmt::Debug for ValuePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValuePredicate")
    }
}

/// Test applied to a whole row.
#[derive(Clone)]
pub struct RowPredicate(Arc<RowTest>);

impl RowPredicate {
    /// Wraps a closure.
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&Row) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(test))
    }

    /// Evaluates the predicate.
    pub fn test(&self, row: &Row) -> bool {
        (self.0)(row)
    }
}

impl fmt::Debug for RowPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RowPredicate")
    }
}

/// Test applied to a path-valued cell.
#[derive(Clone)]
pub struct FlowPredicate(Arc<FlowTest>);

impl FlowPredicate {
    /// Wraps a closure.
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&FlowPath) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(test))
    }

    /// Accepts every path.
    pub fn any() -> Self {
        Self::new(|_| true)
    }

    /// Evaluates the predicate.
    pub fn test(&self, path: &FlowPath) -> bool {
        (self.0)(path)
    }
}

impl fmt::Debug for FlowPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FlowPredicate")
    }
}

/// Predicate accepted by a filter stage.
#[derive(Clone, Debug)]
pub enum FilterPredicate {
    /// Tested against the value in the filtered column.
    Value(ValuePredicate),
    /// Tested against the whole row.
    Row(RowPredicate),
    /// Tested against the path in the filtered column.
    Flow(FlowPredicate),
}

impl FilterPredicate {
    /// Evaluates the predicate on `row`, reading `column` for value and
    /// flow predicates. Missing or mismatched cells are rejected.
    pub fn test_row(&self, column: &str, row: &Row) -> bool {
        match self {
            FilterPredicate::Value(predicate) => row
                .get(column)
                .and_then(|cell| cell.as_value())
                .map_or(false, |value| predicate.test(value)),
            FilterPredicate::Row(predicate) => predicate.test(row),
            FilterPredicate::Flow(predicate) => row
                .get(column)
                .and_then(|cell| cell.as_path())
                .map_or(false, |path| predicate.test(path)),
        }
    }
}

impl From<ValuePredicate> for FilterPredicate {
    fn from(predicate: ValuePredicate) -> Self {
        FilterPredicate::Value(predicate)
    }
}

impl From<RowPredicate> for FilterPredicate {
    fn from(predicate: RowPredicate) -> Self {
        FilterPredicate::Row(predicate)
    }
}

impl From<FlowPredicate> for FilterPredicate {
    fn from(predicate: FlowPredicate) -> Self {
        FilterPredicate::Flow(predicate)
    }
}
