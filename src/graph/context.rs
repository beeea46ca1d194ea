#![forbid(unsafe_code)]

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;
use tracing::{error, trace};

use crate::config::CacheOptions;
use crate::graph::node::{CodeNode, CodeProperty, FileNode, FileProperty, GraphNode};
use crate::graph::spec::{AstJson, LanguageSpecification, ValueFactory};
use crate::graph::value::{InvalidValue, ValueExt, ValueRef};
use crate::graph::vertex::{Vertex, CODE_LABEL, FILE_LABEL};
use crate::types::{QvogError, Result, VertexId};

/// Whether a resolution is kept in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CachePolicy {
    /// Register the resolved pair.
    Store,
    /// Build the pair without registering it.
    Bypass,
}

/// A resolved vertex: its node view and root value.
#[derive(Clone, Debug)]
pub struct Registration {
    /// Node view of the vertex.
    pub node: Arc<GraphNode>,
    /// Root value of the vertex's AST.
    pub value: ValueRef,
}

/// Anything that identifies a registered vertex.
#[derive(Clone, Copy, Debug)]
pub enum NodeKey<'a> {
    /// Raw vertex; registered on first encounter.
    Vertex(&'a Vertex),
    /// Vertex id.
    Id(VertexId),
    /// Previously resolved node.
    Node(&'a GraphNode),
    /// Previously resolved value.
    Value(&'a ValueRef),
}

impl<'a> From<&'a Vertex> for NodeKey<'a> {
    fn from(vertex: &'a Vertex) -> Self {
        NodeKey::Vertex(vertex)
    }
}

impl From<VertexId> for NodeKey<'_> {
    fn from(id: VertexId) -> Self {
        NodeKey::Id(id)
    }
}

impl<'a> From<&'a GraphNode> for NodeKey<'a> {
    fn from(node: &'a GraphNode) -> Self {
        NodeKey::Node(node)
    }
}

impl<'a> From<&'a ValueRef> for NodeKey<'a> {
    fn from(value: &'a ValueRef) -> Self {
        NodeKey::Value(value)
    }
}

/// Registry of resolved vertices for one application context.
///
/// Maps vertex ids to their `(GraphNode, Value)` pair. Registration is
/// idempotent and keyed by vertex id. With a capacity configured the least
/// recently used entries are evicted; lookups of evicted ids fail like any
/// other unknown id.
///
/// Pairs built with [`CachePolicy::Bypass`] can be [staged](Self::stage):
/// lookups see them until the returned guard drops, without the registry
/// keeping them.
pub struct Context {
    factory: ValueFactory,
    registry: Mutex<LruCache<VertexId, Registration>>,
    staged: Mutex<FxHashMap<VertexId, Registration>>,
}

/// Keeps a staged registration visible to lookups. Unstages on drop.
#[must_use = "the registration is unstaged when the guard drops"]
pub struct StagedRegistration<'a> {
    context: &'a Context,
    id: VertexId,
}

impl Drop for StagedRegistration<'_> {
    fn drop(&mut self) {
        self.context.staged.lock().remove(&self.id);
    }
}

impl Context {
    /// Creates a registry building values with `spec`.
    pub fn new(spec: LanguageSpecification, cache: &CacheOptions) -> Self {
        let registry = match cache.capacity.and_then(NonZeroUsize::new) {
            Some(capacity) => LruCache::new(capacity),
            None => LruCache::unbounded(),
        };
        Self {
            factory: ValueFactory::new(spec),
            registry: Mutex::new(registry),
            staged: Mutex::new(FxHashMap::default()),
        }
    }

    /// Factory used for value construction.
    pub fn factory(&self) -> &ValueFactory {
        &self.factory
    }

    /// Root value for `key`, registering raw vertices on first encounter.
    pub fn get_value<'a>(&self, key: impl Into<NodeKey<'a>>) -> Result<ValueRef> {
        self.lookup(key.into()).map(|registration| registration.value)
    }

    /// Node view for `key`, registering raw vertices on first encounter.
    pub fn get_node<'a>(&self, key: impl Into<NodeKey<'a>>) -> Result<Arc<GraphNode>> {
        self.lookup(key.into()).map(|registration| registration.node)
    }

    /// Full registration for `key`.
    pub fn lookup(&self, key: NodeKey<'_>) -> Result<Registration> {
        let id = match key {
            NodeKey::Vertex(vertex) => {
                if let Some(found) = self.cached(vertex.id) {
                    return Ok(found);
                }
                return self.resolve(vertex, CachePolicy::Store);
            }
            NodeKey::Id(id) => id,
            NodeKey::Node(node) => node.id(),
            NodeKey::Value(value) => value.id()?,
        };
        self.cached(id)
            .or_else(|| self.staged.lock().get(&id).cloned())
            .ok_or_else(|| QvogError::not_found("node", id.to_string()))
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: VertexId) -> bool {
        self.registry.lock().contains(&id)
    }

    /// Number of registered vertices.
    pub fn len(&self) -> usize {
        self.registry.lock().len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every registration.
    pub fn clear(&self) {
        self.registry.lock().clear();
    }

    /// Inserts a pair built with [`CachePolicy::Bypass`]. Existing entries win.
    pub fn register(&self, registration: Registration) -> Registration {
        let id = registration.node.id();
        let mut registry = self.registry.lock();
        if let Some(existing) = registry.get(&id) {
            return existing.clone();
        }
        registry.put(id, registration.clone());
        trace!(vertex = %id, "context.node.registered");
        registration
    }

    /// Makes an unregistered pair visible to lookups while the guard lives.
    ///
    /// Registered entries still take precedence.
    pub fn stage(&self, registration: &Registration) -> StagedRegistration<'_> {
        let id = registration.node.id();
        self.staged.lock().insert(id, registration.clone());
        StagedRegistration { context: self, id }
    }

    /// Builds the node and value for `vertex`.
    ///
    /// Every value in the resulting tree is bound to the vertex id.
    pub fn resolve(&self, vertex: &Vertex, policy: CachePolicy) -> Result<Registration> {
        let registration = match vertex.label.as_str() {
            CODE_LABEL => self.build_code(vertex)?,
            FILE_LABEL => build_file(vertex),
            other => {
                return Err(QvogError::Configuration(format!(
                    "unsupported vertex label '{other}' on vertex {}",
                    vertex.id
                )))
            }
        };
        for value in registration.value.stream() {
            value.bind(vertex.id);
        }
        match policy {
            CachePolicy::Store => Ok(self.register(registration)),
            CachePolicy::Bypass => Ok(registration),
        }
    }

    fn cached(&self, id: VertexId) -> Option<Registration> {
        self.registry.lock().get(&id).cloned()
    }

    fn build_code(&self, vertex: &Vertex) -> Result<Registration> {
        let raw = vertex.property("json").ok_or_else(|| {
            QvogError::Parse(format!("code vertex {} has no json property", vertex.id))
        })?;
        let parsed = match raw {
            JsonValue::String(text) => serde_json::from_str::<JsonValue>(text).map_err(|err| {
                error!(vertex = %vertex.id, error = %err, ast = %text, "context.ast.parse_failed");
            }),
            JsonValue::Object(_) => Ok(raw.clone()),
            other => {
                error!(vertex = %vertex.id, ast = %other, "context.ast.parse_failed");
                Err(())
            }
        };
        let (json, value) = match parsed {
            Ok(json) => {
                let json = AstJson::new(json);
                let value = self.factory.build_value(&json);
                (json, value)
            }
            Err(()) => (AstJson::invalid(), InvalidValue::placeholder()),
        };
        let property = CodeProperty {
            lineno: vertex
                .property_text("lineno")
                .and_then(|text| text.trim().parse().ok())
                .unwrap_or(0),
            code: vertex.property_text("code").unwrap_or_default(),
            file: vertex.property_text("file").unwrap_or_default(),
            json,
            function_def_name: vertex.property_text("functionDefName"),
        };
        Ok(Registration {
            node: Arc::new(GraphNode::Code(CodeNode {
                vertex: vertex.clone(),
                property,
            })),
            value,
        })
    }
}

fn build_file(vertex: &Vertex) -> Registration {
    let property = FileProperty {
        path: vertex.property_text("file").unwrap_or_default(),
    };
    Registration {
        node: Arc::new(GraphNode::File(FileNode {
            vertex: vertex.clone(),
            property,
        })),
        value: Arc::new(InvalidValue::new(FILE_LABEL)),
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("language", &self.factory.specification().name())
            .field("registered", &self.len())
            .finish()
    }
}
