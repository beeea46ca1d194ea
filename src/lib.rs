//! Query engine for code property graphs.
//!
//! Source code lives in a property graph: one vertex per line of code with
//! its AST as JSON, plus one vertex per file. A [`LanguageSpecification`]
//! turns those ASTs into typed [`Value`](graph::Value) trees, and queries
//! select, filter, and connect values through a fixed
//! `from → where* → select` pipeline over columnar [`Table`](table::Table)s.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use futures::FutureExt;
//! use qvog::config::DatabaseOptions;
//! use qvog::engine::{pattern, Engine};
//! use qvog::graph::LanguageSpecification;
//! use qvog::query::ValuePredicate;
//! use qvog::store::InMemoryGraphStore;
//! use qvog::AppContext;
//!
//! # async fn run() -> qvog::Result<()> {
//! let store = Arc::new(InMemoryGraphStore::load("graph.json")?);
//! let app = AppContext::new(DatabaseOptions::default(), store, LanguageSpecification::new("python"))?;
//! let mut engine = Engine::new(app);
//! engine
//!     .execute(&pattern("calls", |q| {
//!         async move {
//!             q.from_clause(|f| f.with_data(ValuePredicate::identifier("Call")).r#as("c"))?;
//!             q.select(&["c"]).await?;
//!             Ok(())
//!         }
//!         .boxed()
//!     }))
//!     .await?;
//! engine.close()
//! # }
//! ```

#![warn(missing_docs)]

/// Application context shared by queries.
pub mod app;
/// Engine, database, output, and logging options.
pub mod config;
/// Query runner and output formatting.
pub mod engine;
/// Semantic layer: vertices, nodes, values, types, and the registry.
pub mod graph;
/// Tracing subscriber setup.
pub mod logging;
/// Query descriptors, stages, and execution.
pub mod query;
/// Graph store access.
pub mod store;
/// Tables, columns, and cells.
pub mod table;
/// Identifiers and errors.
pub mod types;

pub use app::AppContext;
pub use graph::LanguageSpecification;
pub use types::{QvogError, Result};
