#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::app::AppContext;
use crate::graph::{FlowPath, ValueRef};
use crate::query::flow::{FlowAlgorithm, FlowResult};
use crate::table::{Cell, Column};
use crate::types::{Result, VertexId};

/// Shortest-path reachability along outgoing store edges.
///
/// Starting from the vertex of the current source value, vertices are
/// visited breadth first. A vertex whose value the barrier accepts is
/// neither reported nor expanded. Every other reached vertex whose value
/// the sink accepts yields one row, carrying the path through which it was
/// first reached. The start vertex itself is never reported.
///
/// Vertices missing from the registry are fetched from the store and
/// registered; those that cannot be resolved are not traversed.
#[derive(Clone, Debug)]
pub struct ReachabilityFlow {
    app: Arc<AppContext>,
    edge_label: Option<String>,
    max_depth: Option<usize>,
}

impl ReachabilityFlow {
    /// Follows every edge without a depth limit.
    pub fn new(app: Arc<AppContext>) -> Self {
        Self {
            app,
            edge_label: None,
            max_depth: None,
        }
    }

    /// Only follows edges with `label`.
    pub fn with_edge_label(mut self, label: impl Into<String>) -> Self {
        self.edge_label = Some(label.into());
        self
    }

    /// Stops expanding after `depth` edges.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    async fn value_of(&self, id: VertexId) -> Result<Option<ValueRef>> {
        let graph = self.app.graph();
        if graph.contains(id) {
            return graph.get_value(id).map(Some);
        }
        let Some(vertex) = self.app.store().vertex(id).await? else {
            return Ok(None);
        };
        match graph.get_value(&vertex) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                debug!(vertex = %id, error = %err, "flow.vertex.unresolved");
                Ok(None)
            }
        }
    }
}

fn path_to(
    target: VertexId,
    parents: &FxHashMap<VertexId, VertexId>,
    values: &FxHashMap<VertexId, ValueRef>,
) -> FlowPath {
    let mut ids = vec![target];
    let mut cursor = target;
    while let Some(&parent) = parents.get(&cursor) {
        ids.push(parent);
        cursor = parent;
    }
    ids.iter()
        .rev()
        .filter_map(|id| values.get(id).cloned())
        .collect()
}

#[async_trait]
impl FlowAlgorithm for ReachabilityFlow {
    async fn exists(
        &self,
        current: &ValueRef,
        _source: &Column,
        sink: &Column,
        barrier: &Column,
        result: &mut FlowResult,
    ) -> Result<()> {
        let start = current.id()?;
        let mut visited = FxHashSet::default();
        let mut parents = FxHashMap::default();
        let mut values = FxHashMap::default();
        let mut queue = VecDeque::new();

        visited.insert(start);
        values.insert(start, Arc::clone(current));
        queue.push_back((start, 0usize));

        while let Some((vertex, depth)) = queue.pop_front() {
            if let Some(limit) = self.max_depth {
                if depth >= limit {
                    continue;
                }
            }

            let edges = self
                .app
                .store()
                .out_edges(vertex, self.edge_label.as_deref())
                .await?;
            for edge in edges {
                let target = edge.in_v;
                if !visited.insert(target) {
                    continue;
                }
                let Some(value) = self.value_of(target).await? else {
                    continue;
                };
                let cell = Cell::Value(Arc::clone(&value));
                if barrier.contains_value(&cell) {
                    trace!(vertex = %target, "flow.barrier.hit");
                    continue;
                }
                parents.insert(target, vertex);
                values.insert(target, Arc::clone(&value));
                if sink.contains_value(&cell) {
                    let path = path_to(target, &parents, &values);
                    result.emit(current, &value, path)?;
                }
                queue.push_back((target, depth + 1));
            }
        }
        Ok(())
    }
}
