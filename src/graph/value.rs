#![forbid(unsafe_code)]

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::graph::ty::{InvalidType, Type, TypeRef, INVALID_IDENTIFIER};
use crate::types::{QvogError, Result, VertexId};

/// Attributes shared by every [`Value`].
pub struct ValueHeader {
    id: OnceLock<VertexId>,
    identifier: String,
    ty: TypeRef,
    supported: bool,
}

impl ValueHeader {
    /// Header for a supported value of the given syntax kind.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            id: OnceLock::new(),
            identifier: identifier.into(),
            ty: InvalidType::placeholder(),
            supported: true,
        }
    }

    /// Header for a placeholder value.
    pub fn unsupported(identifier: impl Into<String>) -> Self {
        Self {
            supported: false,
            ..Self::new(identifier)
        }
    }

    /// Sets the semantic type.
    pub fn with_type(mut self, ty: TypeRef) -> Self {
        self.ty = ty;
        self
    }
}

impl fmt::Debug for ValueHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueHeader")
            .field("id", &self.id.get())
            .field("identifier", &self.identifier)
            .field("type", &self.ty.name())
            .field("supported", &self.supported)
            .finish()
    }
}

/// Typed semantic interpretation of one AST node.
///
/// Implementations are supplied by language specifications. Only
/// [`header`](Value::header) and [`as_any`](Value::as_any) are required;
/// composite nodes override [`children`](Value::children) so that
/// [`ValueExt::stream`] can reach their descendants.
pub trait Value: fmt::Debug + Send + Sync + 'static {
    /// Shared attributes.
    fn header(&self) -> &ValueHeader;

    /// Direct children in source order.
    fn children(&self) -> Vec<ValueRef> {
        Vec::new()
    }

    /// Downcasting hook.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a [`Value`].
pub type ValueRef = Arc<dyn Value>;

impl dyn Value {
    /// Vertex the value was built from.
    pub fn id(&self) -> Result<VertexId> {
        self.bound_id().ok_or_else(|| QvogError::UnboundValue {
            identifier: self.identifier().to_string(),
        })
    }

    /// Vertex id, if bound.
    pub fn bound_id(&self) -> Option<VertexId> {
        self.header().id.get().copied()
    }

    /// Syntax-kind identifier.
    pub fn identifier(&self) -> &str {
        &self.header().identifier
    }

    /// Semantic type; an invalid placeholder unless a rule set one.
    pub fn ty(&self) -> &TypeRef {
        &self.header().ty
    }

    /// `false` only for placeholders.
    pub fn is_supported(&self) -> bool {
        self.header().supported
    }

    /// Returns the concrete value if it is a `T`.
    pub fn downcast_ref<T: Value>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Binds the value to a vertex. The first binding wins; returns whether
    /// the value now carries `id`.
    pub(crate) fn bind(&self, id: VertexId) -> bool {
        match self.header().id.set(id) {
            Ok(()) => true,
            Err(_) => self.bound_id() == Some(id),
        }
    }
}

/// Placeholder produced when no rule matches or the AST is unreadable.
#[derive(Debug)]
pub struct InvalidValue {
    header: ValueHeader,
}

impl InvalidValue {
    /// Placeholder remembering the identifier that failed to resolve.
    pub fn new(identifier: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let ty: TypeRef = Arc::new(InvalidType::new(identifier.clone()));
        Self {
            header: ValueHeader::unsupported(identifier).with_type(ty),
        }
    }

    /// Placeholder with the generic invalid identifier.
    pub fn placeholder() -> ValueRef {
        Arc::new(InvalidValue::new(INVALID_IDENTIFIER))
    }
}

impl Value for InvalidValue {
    fn header(&self) -> &ValueHeader {
        &self.header
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Lazy pre-order walk over a value and its descendants.
pub struct ValueStream {
    stack: Vec<ValueRef>,
}

impl ValueStream {
    /// Starts a walk rooted at `root`.
    pub fn new(root: ValueRef) -> Self {
        Self { stack: vec![root] }
    }
}

impl Iterator for ValueStream {
    type Item = ValueRef;

    fn next(&mut self) -> Option<ValueRef> {
        let next = self.stack.pop()?;
        let children = next.children();
        self.stack.extend(children.into_iter().rev());
        Some(next)
    }
}

/// Stream helpers on shared values.
pub trait ValueExt {
    /// Fresh walk over this value and its descendants.
    fn stream(&self) -> ValueStream;

    /// Identity comparison: same bound vertex, or the same allocation.
    fn same_as(&self, other: &ValueRef) -> bool;
}

impl ValueExt for ValueRef {
    fn stream(&self) -> ValueStream {
        ValueStream::new(Arc::clone(self))
    }

    fn same_as(&self, other: &ValueRef) -> bool {
        match (self.bound_id(), other.bound_id()) {
            (Some(a), Some(b)) => a == b,
            _ => Arc::ptr_eq(self, other),
        }
    }
}
