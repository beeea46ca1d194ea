#![forbid(unsafe_code)]

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::graph::{Edge, Vertex};
use crate::store::GraphStore;
use crate::types::{QvogError, Result, VertexId};

/// Serialized graph: vertices and edges.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDump {
    /// Vertex records in listing order.
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    /// Edge records.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Graph held entirely in memory.
///
/// Vertices are listed in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    vertices: Vec<Vertex>,
    positions: FxHashMap<VertexId, usize>,
    out: FxHashMap<VertexId, Vec<Edge>>,
}

impl InMemoryGraphStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the contents of `dump`.
    pub fn from_dump(dump: GraphDump) -> Result<Self> {
        let mut store = Self::new();
        for vertex in dump.vertices {
            store.add_vertex(vertex)?;
        }
        for edge in dump.edges {
            store.add_edge(edge)?;
        }
        Ok(store)
    }

    /// Parses a JSON dump.
    pub fn from_json(input: &str) -> Result<Self> {
        let dump: GraphDump = serde_json::from_str(input)?;
        Self::from_dump(dump)
    }

    /// Loads a JSON dump from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Adds a vertex; ids must be unique.
    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<()> {
        if self.positions.contains_key(&vertex.id) {
            return Err(QvogError::duplicate("vertex", vertex.id.to_string()));
        }
        self.positions.insert(vertex.id, self.vertices.len());
        self.vertices.push(vertex);
        Ok(())
    }

    /// Adds an edge between two known vertices.
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        for end in [edge.out_v, edge.in_v] {
            if !self.positions.contains_key(&end) {
                return Err(QvogError::not_found("vertex", end.to_string()));
            }
        }
        self.out.entry(edge.out_v).or_default().push(edge);
        Ok(())
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn vertices(&self, offset: usize, limit: usize) -> Result<Vec<Vertex>> {
        Ok(self
            .vertices
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn vertex(&self, id: VertexId) -> Result<Option<Vertex>> {
        Ok(self
            .positions
            .get(&id)
            .map(|&pos| self.vertices[pos].clone()))
    }

    async fn out_edges(&self, id: VertexId, label: Option<&str>) -> Result<Vec<Edge>> {
        let edges = self.out.get(&id).map(Vec::as_slice).unwrap_or_default();
        Ok(edges
            .iter()
            .filter(|edge| label.map_or(true, |label| edge.label == label))
            .cloned()
            .collect())
    }
}
