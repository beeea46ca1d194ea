#![forbid(unsafe_code)]

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Identifier carried by placeholder values and types.
pub const INVALID_IDENTIFIER: &str = "__invalid__";

/// How a type was determined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Declared or resolved by the analyzer.
    Resolved,
    /// Inferred from usage.
    Inferred,
    /// Not known.
    #[default]
    Unknown,
}

/// Language-agnostic semantic type.
pub trait Type: fmt::Debug + Send + Sync + 'static {
    /// Syntax-kind identifier of the AST node the type was built from.
    fn identifier(&self) -> &str;

    /// Display name of the type.
    fn name(&self) -> &str;

    /// How the type was determined.
    fn origin(&self) -> Origin {
        Origin::Unknown
    }

    /// `false` only for placeholders.
    fn is_supported(&self) -> bool {
        true
    }

    /// Downcasting hook.
    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a [`Type`].
pub type TypeRef = Arc<dyn Type>;

impl dyn Type {
    /// Returns the concrete type if it is a `T`.
    pub fn downcast_ref<T: Type>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Placeholder type used when no rule matches.
#[derive(Clone, Debug)]
pub struct InvalidType {
    identifier: String,
}

impl InvalidType {
    /// Placeholder remembering the identifier that failed to resolve.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }

    /// Shared placeholder with the generic invalid identifier.
    pub fn placeholder() -> TypeRef {
        Arc::new(InvalidType::new(INVALID_IDENTIFIER))
    }
}

impl Type for InvalidType {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn name(&self) -> &str {
        "invalid"
    }

    fn is_supported(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Ready-made type for language rules that only need a name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedType {
    identifier: String,
    name: String,
    origin: Origin,
}

impl NamedType {
    /// Creates a type with [`Origin::Unknown`].
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            origin: Origin::Unknown,
        }
    }

    /// Sets the origin.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }
}

impl Type for NamedType {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Origin {
        self.origin
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
