#![forbid(unsafe_code)]

//! Process-wide guard for imperative queries.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::trace;

use crate::query::descriptor::QueryDescriptor;
use crate::query::from::FromDescriptorBuilder;
use crate::types::{QvogError, Result};

/// Query descriptor shared between an imperative query body and its helpers.
pub type SharedQuery = Arc<tokio::sync::Mutex<QueryDescriptor>>;

/// Single-entry slot with strict acquire/release pairing.
///
/// `require` on an occupied slot fails, even when the entry is the same;
/// `release` on an empty slot fails; `get` on an empty slot fails.
#[derive(Debug)]
pub struct ContextSlot<T> {
    name: &'static str,
    entry: Mutex<Option<T>>,
}

impl<T: Clone> ContextSlot<T> {
    /// Empty slot reported as `name` in errors.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entry: Mutex::new(None),
        }
    }

    /// Occupies the slot with `value`.
    pub fn require(&self, value: T) -> Result<()> {
        let mut entry = self.entry.lock();
        if entry.is_some() {
            return Err(QvogError::ContextInUse { slot: self.name });
        }
        *entry = Some(value);
        trace!(slot = self.name, "context.slot.required");
        Ok(())
    }

    /// Empties the slot, returning its entry.
    pub fn release(&self) -> Result<T> {
        let released = self
            .entry
            .lock()
            .take()
            .ok_or(QvogError::ContextNotInUse { slot: self.name })?;
        trace!(slot = self.name, "context.slot.released");
        Ok(released)
    }

    /// Current entry.
    pub fn get(&self) -> Result<T> {
        self.entry
            .lock()
            .clone()
            .ok_or(QvogError::ContextNotSet { slot: self.name })
    }

    /// Whether the slot is occupied.
    pub fn is_in_use(&self) -> bool {
        self.entry.lock().is_some()
    }
}

/// Slots for the running imperative query and its from-builder.
///
/// At most one imperative query runs per context at a time.
#[derive(Debug)]
pub struct QueryContext {
    query: ContextSlot<SharedQuery>,
    from: ContextSlot<FromDescriptorBuilder>,
}

static GLOBAL_CONTEXT: OnceLock<QueryContext> = OnceLock::new();

impl QueryContext {
    /// Context with both slots empty.
    pub fn new() -> Self {
        Self {
            query: ContextSlot::new("query"),
            from: ContextSlot::new("from"),
        }
    }

    /// Context used by the imperative helpers.
    pub fn global() -> &'static QueryContext {
        GLOBAL_CONTEXT.get_or_init(QueryContext::new)
    }

    /// Marks `query` as the running query.
    pub fn require_query(&self, query: SharedQuery) -> Result<()> {
        self.query.require(query)
    }

    /// Clears the running query.
    pub fn release_query(&self) -> Result<SharedQuery> {
        self.query.release()
    }

    /// Running query.
    pub fn query(&self) -> Result<SharedQuery> {
        self.query.get()
    }

    /// Whether a query is running.
    pub fn has_query(&self) -> bool {
        self.query.is_in_use()
    }

    /// Claims the from-builder.
    pub fn require_from(&self, builder: FromDescriptorBuilder) -> Result<()> {
        self.from.require(builder)
    }

    /// Returns the from-builder.
    pub fn release_from(&self) -> Result<FromDescriptorBuilder> {
        self.from.release()
    }

    /// Claimed from-builder.
    pub fn from_builder(&self) -> Result<FromDescriptorBuilder> {
        self.from.get()
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new()
    }
}
