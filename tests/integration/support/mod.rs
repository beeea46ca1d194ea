#![allow(dead_code, missing_docs)]

use std::any::Any;
use std::io::{self, Write};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};

use qvog::config::DatabaseOptions;
use qvog::graph::{
    AstJson, Edge, LanguageSpecification, Value, ValueHeader, ValueRef, ValueRule, Vertex,
    CODE_LABEL, FILE_LABEL,
};
use qvog::query::ValuePredicate;
use qvog::store::{GraphStore, InMemoryGraphStore};
use qvog::types::{QvogError, Result, VertexId};
use qvog::AppContext;

pub const FILE: &str = "main.toy";

/// Writer the test can read back after the writer is gone.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
pub const FLOW_LABEL: &str = "flow";

/// Generic AST node of the toy language.
#[derive(Debug)]
pub struct ToyNode {
    header: ValueHeader,
    name: Option<String>,
    children: Vec<ValueRef>,
}

impl ToyNode {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Value for ToyNode {
    fn header(&self) -> &ValueHeader {
        &self.header
    }

    fn children(&self) -> Vec<ValueRef> {
        self.children.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn build_node(json: &AstJson, factory: &qvog::graph::ValueFactory) -> Option<ValueRef> {
    let mut children = Vec::new();
    for field in ["target", "value", "func"] {
        if let Some(child) = json.child(field) {
            children.push(factory.build_value(&child));
        }
    }
    for child in json.children("args") {
        children.push(factory.build_value(&child));
    }
    let name = json
        .str_field("id")
        .or_else(|| json.str_field("name"))
        .map(str::to_string);
    Some(Arc::new(ToyNode {
        header: ValueHeader::new(json.identifier()),
        name,
        children,
    }))
}

/// Every kind maps to [`ToyNode`].
pub fn toy_language() -> LanguageSpecification {
    LanguageSpecification::new("toy").value_rule(ValueRule::new("*", build_node))
}

pub fn name(id: &str) -> JsonValue {
    json!({ "_type": "Name", "id": id })
}

pub fn call(func: &str, args: Vec<JsonValue>) -> JsonValue {
    json!({ "_type": "Call", "func": name(func), "args": args })
}

pub fn assign(target: &str, value: JsonValue) -> JsonValue {
    json!({ "_type": "Assign", "target": name(target), "value": value })
}

pub fn expr(value: JsonValue) -> JsonValue {
    json!({ "_type": "Expr", "value": value })
}

/// Code vertex storing `ast` as a JSON string, as graph databases do.
pub fn code_vertex(id: u64, lineno: u32, code: &str, ast: &JsonValue) -> Vertex {
    Vertex::new(id, CODE_LABEL)
        .with_property("lineno", lineno.to_string())
        .with_property("code", code)
        .with_property("file", FILE)
        .with_property("json", ast.to_string())
}

pub fn file_vertex(id: u64, path: &str) -> Vertex {
    Vertex::new(id, FILE_LABEL).with_property("file", path)
}

/// Value kind `kind` somewhere in the tree whose name is `id`.
pub fn named(kind: &'static str, id: &'static str) -> ValuePredicate {
    ValuePredicate::new(move |value| {
        value.identifier() == kind
            && value
                .downcast_ref::<ToyNode>()
                .and_then(ToyNode::name)
                == Some(id)
    })
}

/// Call whose callee is `func`.
pub fn calls(func: &'static str) -> ValuePredicate {
    ValuePredicate::new(move |value| {
        value.identifier() == "Call"
            && value.children().iter().any(|child| {
                child
                    .downcast_ref::<ToyNode>()
                    .and_then(ToyNode::name)
                    == Some(func)
            })
    })
}

pub fn app_with(store: Arc<dyn GraphStore>) -> Result<Arc<AppContext>> {
    AppContext::new(DatabaseOptions::default(), store, toy_language())
}

pub fn app_with_batch(store: Arc<dyn GraphStore>, batch_size: usize) -> Result<Arc<AppContext>> {
    let mut options = DatabaseOptions::default();
    options.gremlin.batch_size = batch_size;
    AppContext::new(options, store, toy_language())
}

/// Three statements: `x = source()`, `y = x`, `sink(y)`, connected by
/// flow edges 1 -> 2 -> 3, plus the file vertex.
pub fn taint_store() -> Result<InMemoryGraphStore> {
    let mut store = InMemoryGraphStore::new();
    store.add_vertex(code_vertex(1, 1, "x = source()", &assign("x", call("source", vec![]))))?;
    store.add_vertex(code_vertex(2, 2, "y = x", &assign("y", name("x"))))?;
    store.add_vertex(code_vertex(3, 3, "sink(y)", &expr(call("sink", vec![name("y")]))))?;
    store.add_vertex(file_vertex(4, FILE))?;
    store.add_edge(Edge::new(10, FLOW_LABEL, 1, 2))?;
    store.add_edge(Edge::new(11, FLOW_LABEL, 2, 3))?;
    Ok(store)
}

/// `count` assignments `v<i> = f()`, one per line.
pub fn numbered_store(count: u64) -> Result<InMemoryGraphStore> {
    let mut store = InMemoryGraphStore::new();
    for id in 1..=count {
        let target = format!("v{id}");
        let ast = assign(&target, call("f", vec![]));
        store.add_vertex(code_vertex(id, id as u32, &format!("{target} = f()"), &ast))?;
    }
    Ok(store)
}

/// Store wrapper recording every page request.
#[derive(Debug)]
pub struct RecordingStore {
    inner: InMemoryGraphStore,
    requests: Mutex<Vec<(usize, usize)>>,
    fail_at: Option<usize>,
}

impl RecordingStore {
    pub fn new(inner: InMemoryGraphStore) -> Self {
        Self {
            inner,
            requests: Mutex::new(Vec::new()),
            fail_at: None,
        }
    }

    /// Rejects the page request starting at `offset`.
    pub fn failing_at(inner: InMemoryGraphStore, offset: usize) -> Self {
        Self {
            fail_at: Some(offset),
            ..Self::new(inner)
        }
    }

    /// `(offset, returned)` pairs in request order.
    pub fn requests(&self) -> Vec<(usize, usize)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl GraphStore for RecordingStore {
    async fn vertices(&self, offset: usize, limit: usize) -> Result<Vec<Vertex>> {
        if self.fail_at == Some(offset) {
            self.requests.lock().push((offset, 0));
            return Err(QvogError::Fetch(format!("page at {offset} rejected")));
        }
        let page = self.inner.vertices(offset, limit).await?;
        self.requests.lock().push((offset, page.len()));
        Ok(page)
    }

    async fn vertex(&self, id: VertexId) -> Result<Option<Vertex>> {
        self.inner.vertex(id).await
    }

    async fn out_edges(&self, id: VertexId, label: Option<&str>) -> Result<Vec<Edge>> {
        self.inner.out_edges(id, label).await
    }
}
