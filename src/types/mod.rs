#![forbid(unsafe_code)]

//! Shared identifiers and the crate-wide error type.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a vertex in the graph store.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VertexId(pub u64);

/// Identifier of an edge in the graph store.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub u64);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for VertexId {
    fn from(value: u64) -> Self {
        VertexId(value)
    }
}

impl From<VertexId> for u64 {
    fn from(value: VertexId) -> Self {
        value.0
    }
}

impl From<u64> for EdgeId {
    fn from(value: u64) -> Self {
        EdgeId(value)
    }
}

/// Broad error categories surfaced to callers and result records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required context or option was missing or misused.
    Configuration,
    /// An alias, column, or id could not be resolved.
    Lookup,
    /// The operation is not available on the target.
    UnsupportedOperation,
    /// A naming or cardinality invariant was violated.
    Structural,
    /// Input could not be decoded.
    Parse,
    /// The graph store rejected a request.
    Fetch,
    /// Underlying I/O failed.
    Io,
}

/// Errors raised by the query engine.
#[derive(Debug, Error)]
pub enum QvogError {
    /// `require` was called while the slot already held an entry.
    #[error("{slot} context in use")]
    ContextInUse {
        /// Slot that rejected the request.
        slot: &'static str,
    },
    /// `release` was called on an empty slot.
    #[error("{slot} context not in use")]
    ContextNotInUse {
        /// Slot that rejected the request.
        slot: &'static str,
    },
    /// The slot was read while empty.
    #[error("{slot} context not set")]
    ContextNotSet {
        /// Slot that rejected the request.
        slot: &'static str,
    },
    /// Invalid or inconsistent configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Named entity does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Entity category (table, column, node, ...).
        kind: &'static str,
        /// Requested name or id.
        name: String,
    },
    /// A value has not been bound to a vertex yet.
    #[error("value '{identifier}' is not bound to a vertex")]
    UnboundValue {
        /// Syntax-kind identifier of the value.
        identifier: String,
    },
    /// Operation is not supported by the receiver.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// Description of the rejected operation.
        operation: &'static str,
    },
    /// A name was registered twice.
    #[error("duplicate {kind} name '{name}'")]
    DuplicateName {
        /// Entity category.
        kind: &'static str,
        /// Offending name.
        name: String,
    },
    /// Exactly one entry was required.
    #[error("expected exactly one {kind}, found {found}")]
    NotExactlyOne {
        /// Entity category.
        kind: &'static str,
        /// Number of entries present.
        found: usize,
    },
    /// Query stage called out of order.
    #[error("'{stage}' is not allowed at this stage of the query")]
    InvalidStage {
        /// Rejected stage.
        stage: &'static str,
    },
    /// Malformed input.
    #[error("parse error: {0}")]
    Parse(String),
    /// The graph store rejected a request.
    #[error("fetch failed: {0}")]
    Fetch(String),
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, QvogError>;

impl QvogError {
    /// Builds a [`QvogError::NotFound`].
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        QvogError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Builds a [`QvogError::DuplicateName`].
    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        QvogError::DuplicateName {
            kind,
            name: name.into(),
        }
    }

    /// Builds a [`QvogError::Unsupported`].
    pub fn unsupported(operation: &'static str) -> Self {
        QvogError::Unsupported { operation }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QvogError::ContextInUse { .. }
            | QvogError::ContextNotInUse { .. }
            | QvogError::ContextNotSet { .. }
            | QvogError::Configuration(_) => ErrorKind::Configuration,
            QvogError::NotFound { .. } | QvogError::UnboundValue { .. } => ErrorKind::Lookup,
            QvogError::Unsupported { .. } => ErrorKind::UnsupportedOperation,
            QvogError::DuplicateName { .. }
            | QvogError::NotExactlyOne { .. }
            | QvogError::InvalidStage { .. } => ErrorKind::Structural,
            QvogError::Parse(_) => ErrorKind::Parse,
            QvogError::Fetch(_) => ErrorKind::Fetch,
            QvogError::Io(_) => ErrorKind::Io,
        }
    }

    /// Stable code for logs and result records.
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Configuration => "ConfigurationError",
            ErrorKind::Lookup => "LookupError",
            ErrorKind::UnsupportedOperation => "UnsupportedOperationError",
            ErrorKind::Structural => "StructuralError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Fetch => "FetchError",
            ErrorKind::Io => "IoError",
        }
    }
}

impl From<serde_json::Error> for QvogError {
    fn from(err: serde_json::Error) -> Self {
        QvogError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for QvogError {
    fn from(err: toml::de::Error) -> Self {
        QvogError::Parse(err.to_string())
    }
}
