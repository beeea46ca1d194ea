#![forbid(unsafe_code)]

//! Flow stages: path existence between two tables that avoids a third.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::graph::{FlowPath, ValueRef};
use crate::query::predicate::ValuePredicate;
use crate::table::{AnyColumn, Cell, Column, DataColumn, PredicateColumn, Row, Table};
use crate::types::Result;

/// Breadth-first reachability over store edges.
pub mod reachability;

pub use reachability::ReachabilityFlow;

const NO_BARRIER: &str = "__no_barrier__";

/// Aliases of the tables a flow stage consumes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowProperty {
    /// Table whose values start paths.
    pub source: String,
    /// Table whose values end paths.
    pub sink: String,
    /// Table whose values no path may cross.
    pub barrier: Option<String>,
}

/// Path search run once per source value.
///
/// Implementations decide whether `current` reaches any value accepted by
/// `sink` without crossing a value accepted by `barrier`, and emit one row
/// per finding into `result`. `barrier` is always present; a stage without
/// a barrier passes a predicate column that accepts nothing.
#[async_trait]
pub trait FlowAlgorithm: Send + Sync {
    /// Emits the flows starting at `current`.
    async fn exists(
        &self,
        current: &ValueRef,
        source: &Column,
        sink: &Column,
        barrier: &Column,
        result: &mut FlowResult,
    ) -> Result<()>;
}

/// Result table of one flow stage.
///
/// Columns are the source alias, the sink alias, the barrier alias when one
/// was given, and the stage alias holding the path.
#[derive(Debug)]
pub struct FlowResult {
    table: Table,
    source: String,
    sink: String,
    barrier: Option<String>,
    alias: String,
}

impl FlowResult {
    /// Empty result with the stage's columns.
    pub fn new(alias: &str, property: &FlowProperty) -> Result<Self> {
        let mut table = Table::new(alias);
        table.add_column(DataColumn::new(property.source.clone(), true))?;
        table.add_column(DataColumn::new(property.sink.clone(), true))?;
        if let Some(barrier) = &property.barrier {
            table.add_column(AnyColumn::new(barrier.clone()))?;
        }
        table.add_column(AnyColumn::new(alias))?;
        Ok(Self {
            table,
            source: property.source.clone(),
            sink: property.sink.clone(),
            barrier: property.barrier.clone(),
            alias: alias.to_string(),
        })
    }

    /// Adds one `source -> sink` finding.
    pub fn emit(&mut self, source: &ValueRef, sink: &ValueRef, path: FlowPath) -> Result<()> {
        let mut row = Row::new();
        row.insert(self.source.clone(), Cell::Value(Arc::clone(source)));
        row.insert(self.sink.clone(), Cell::Value(Arc::clone(sink)));
        if let Some(barrier) = &self.barrier {
            row.insert(barrier.clone(), Cell::Null);
        }
        row.insert(self.alias.clone(), Cell::Path(path));
        self.table.add_row(row)
    }

    /// Rows emitted so far.
    pub fn len(&self) -> usize {
        self.table.row_count()
    }

    /// `true` before the first emit.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The finished table.
    pub fn into_table(self) -> Table {
        self.table
    }
}

/// A flow stage: algorithm plus the aliases it reads and writes.
#[derive(Clone)]
pub struct FlowDescriptor {
    alias: String,
    property: FlowProperty,
    algorithm: Arc<dyn FlowAlgorithm>,
}

impl FlowDescriptor {
    /// Result alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Consumed aliases.
    pub fn property(&self) -> &FlowProperty {
        &self.property
    }

    /// Collapses each table to its single column and runs the algorithm
    /// for every value of the source column.
    ///
    /// Cells of the source column that hold no value are skipped.
    pub async fn apply(&self, source: Table, sink: Table, barrier: Option<Table>) -> Result<Table> {
        let source = source.into_column()?;
        let sink = sink.into_column()?;
        let barrier = match barrier {
            Some(table) => table.into_column()?,
            None => PredicateColumn::new(NO_BARRIER, ValuePredicate::none()).into(),
        };
        let mut result = FlowResult::new(&self.alias, &self.property)?;
        for cell in source.cells()? {
            if let Cell::Value(current) = cell {
                self.algorithm
                    .exists(current, &source, &sink, &barrier, &mut result)
                    .await?;
            }
        }
        debug!(alias = %self.alias, rows = result.len(), "flow.applied");
        Ok(result.into_table())
    }
}

impl fmt::Debug for FlowDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowDescriptor")
            .field("alias", &self.alias)
            .field("property", &self.property)
            .finish_non_exhaustive()
    }
}

/// Entry point of the flow-clause builder.
///
/// `source`, then an optional `barrier`, then `sink`, then `as`; only the
/// last state offers `build`.
#[derive(Clone)]
pub struct FlowDescriptorBuilder {
    algorithm: Arc<dyn FlowAlgorithm>,
}

impl FlowDescriptorBuilder {
    /// Builder for a stage run by `algorithm`.
    pub fn new(algorithm: Arc<dyn FlowAlgorithm>) -> Self {
        Self { algorithm }
    }

    /// Table whose values start paths.
    pub fn source(self, alias: impl Into<String>) -> FlowWithSource {
        FlowWithSource {
            algorithm: self.algorithm,
            source: alias.into(),
        }
    }
}

/// Builder state once the source is chosen.
#[derive(Clone)]
pub struct FlowWithSource {
    algorithm: Arc<dyn FlowAlgorithm>,
    source: String,
}

impl FlowWithSource {
    /// Table whose values block paths.
    pub fn barrier(self, alias: impl Into<String>) -> FlowWithBarrier {
        FlowWithBarrier {
            algorithm: self.algorithm,
            source: self.source,
            barrier: alias.into(),
        }
    }

    /// Table whose values end paths.
    pub fn sink(self, alias: impl Into<String>) -> FlowWithSink {
        FlowWithSink {
            algorithm: self.algorithm,
            property: FlowProperty {
                source: self.source,
                sink: alias.into(),
                barrier: None,
            },
        }
    }
}

/// Builder state once the barrier is chosen.
#[derive(Clone)]
pub struct FlowWithBarrier {
    algorithm: Arc<dyn FlowAlgorithm>,
    source: String,
    barrier: String,
}

impl FlowWithBarrier {
    /// Table whose values end paths.
    pub fn sink(self, alias: impl Into<String>) -> FlowWithSink {
        FlowWithSink {
            algorithm: self.algorithm,
            property: FlowProperty {
                source: self.source,
                sink: alias.into(),
                barrier: Some(self.barrier),
            },
        }
    }
}

/// Builder state once the sink is chosen.
#[derive(Clone)]
pub struct FlowWithSink {
    algorithm: Arc<dyn FlowAlgorithm>,
    property: FlowProperty,
}

impl FlowWithSink {
    /// Names the result table.
    pub fn r#as(self, alias: impl Into<String>) -> FlowReady {
        FlowReady {
            algorithm: self.algorithm,
            property: self.property,
            alias: alias.into(),
        }
    }
}

/// Complete flow clause.
#[derive(Clone)]
pub struct FlowReady {
    algorithm: Arc<dyn FlowAlgorithm>,
    property: FlowProperty,
    alias: String,
}

impl FlowReady {
    /// Finishes the descriptor.
    pub fn build(self) -> FlowDescriptor {
        FlowDescriptor {
            alias: self.alias,
            property: self.property,
            algorithm: self.algorithm,
        }
    }
}

impl From<FlowReady> for FlowDescriptor {
    fn from(ready: FlowReady) -> Self {
        ready.build()
    }
}
