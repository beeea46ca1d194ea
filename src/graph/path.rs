#![forbid(unsafe_code)]

use crate::graph::context::Context;
use crate::graph::value::{ValueExt, ValueRef};

/// Ordered values along a flow from a source to a sink.
#[derive(Clone, Debug, Default)]
pub struct FlowPath {
    steps: Vec<ValueRef>,
}

impl FlowPath {
    /// Empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    pub fn push(&mut self, value: ValueRef) {
        self.steps.push(value);
    }

    /// Steps from source to sink.
    pub fn steps(&self) -> &[ValueRef] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// `true` for a path without steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// First step.
    pub fn source(&self) -> Option<&ValueRef> {
        self.steps.first()
    }

    /// Last step.
    pub fn sink(&self) -> Option<&ValueRef> {
        self.steps.last()
    }

    /// Whether any step is `value`.
    pub fn contains(&self, value: &ValueRef) -> bool {
        self.steps.iter().any(|step| step.same_as(value))
    }

    /// `12 -> 14 -> 20`, using each step's line number or file path.
    ///
    /// Steps whose node is no longer registered render as `?`.
    pub fn describe(&self, context: &Context) -> String {
        self.steps
            .iter()
            .map(|step| {
                context
                    .get_node(step)
                    .map(|node| node.location())
                    .unwrap_or_else(|_| "?".to_string())
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Identity comparison step by step.
    pub fn same_as(&self, other: &FlowPath) -> bool {
        self.steps.len() == other.steps.len()
            && self
                .steps
                .iter()
                .zip(&other.steps)
                .all(|(a, b)| a.same_as(b))
    }
}

impl FromIterator<ValueRef> for FlowPath {
    fn from_iter<I: IntoIterator<Item = ValueRef>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}
