#![forbid(unsafe_code)]

//! Application context shared by every query of one engine instance.

use std::fmt;
use std::sync::Arc;

use crate::config::DatabaseOptions;
use crate::graph::{Context, LanguageSpecification};
use crate::store::GraphStore;
use crate::types::Result;

/// Store handle, vertex registry, and database options.
///
/// Built once and passed by `Arc` into scans, descriptors, and the engine.
/// Independent instances never share state.
pub struct AppContext {
    options: DatabaseOptions,
    store: Arc<dyn GraphStore>,
    graph: Arc<Context>,
}

impl AppContext {
    /// Validates `options` and builds the vertex registry for `spec`.
    pub fn new(
        options: DatabaseOptions,
        store: Arc<dyn GraphStore>,
        spec: LanguageSpecification,
    ) -> Result<Arc<Self>> {
        options.validate()?;
        let graph = Arc::new(Context::new(spec, &options.cache));
        Ok(Arc::new(Self {
            options,
            store,
            graph,
        }))
    }

    /// Database options.
    pub fn options(&self) -> &DatabaseOptions {
        &self.options
    }

    /// Scan page size.
    pub fn batch_size(&self) -> usize {
        self.options.gremlin.batch_size
    }

    /// Graph store.
    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Vertex registry.
    pub fn graph(&self) -> &Arc<Context> {
        &self.graph
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("options", &self.options)
            .field("graph", &self.graph)
            .finish_non_exhaustive()
    }
}
