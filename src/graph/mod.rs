#![forbid(unsafe_code)]

//! Semantic layer over raw graph vertices.
//!
//! Raw [`Vertex`] records are turned into a [`GraphNode`] view plus a typed
//! [`Value`] tree built by per-language rules. The [`Context`] memoizes
//! these pairs by vertex id.

/// Vertex registry and resolution.
pub mod context;
/// Code and file node views.
pub mod node;
/// Value paths produced by flows.
pub mod path;
/// Language specifications and the value factory.
pub mod spec;
/// Semantic types.
pub mod ty;
/// Semantic values and value streams.
pub mod value;
/// Raw vertex and edge records.
pub mod vertex;

pub use context::{CachePolicy, Context, NodeKey, Registration, StagedRegistration};
pub use node::{CodeNode, CodeProperty, FileNode, FileProperty, GraphNode};
pub use path::FlowPath;
pub use spec::{AstJson, LanguageSpecification, RuleTypes, TypeRule, ValueFactory, ValueRule};
pub use ty::{InvalidType, NamedType, Origin, Type, TypeRef, INVALID_IDENTIFIER};
pub use value::{InvalidValue, Value, ValueExt, ValueHeader, ValueRef, ValueStream};
pub use vertex::{Edge, Vertex, VertexProperty, CODE_LABEL, FILE_LABEL};
