#![forbid(unsafe_code)]

//! Graph store access.
//!
//! The engine only reads from the store. Scans page through the vertex space
//! with [`GraphStore::vertices`]; flow algorithms walk outgoing edges.

use async_trait::async_trait;

use crate::graph::{Edge, Vertex};
use crate::types::{Result, VertexId};

/// In-memory store backed by a graph dump.
pub mod memory;

pub use memory::{GraphDump, InMemoryGraphStore};

/// Read-only view of a property graph.
///
/// Implementations report transport failures as
/// [`QvogError::Fetch`](crate::types::QvogError::Fetch).
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Vertices in a stable order, skipping `offset` and returning at most
    /// `limit`. An empty page marks the end of the vertex space.
    async fn vertices(&self, offset: usize, limit: usize) -> Result<Vec<Vertex>>;

    /// Single vertex by id.
    async fn vertex(&self, id: VertexId) -> Result<Option<Vertex>>;

    /// Outgoing edges of `id`, optionally restricted to one label.
    async fn out_edges(&self, id: VertexId, label: Option<&str>) -> Result<Vec<Edge>>;
}
