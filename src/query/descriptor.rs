#![forbid(unsafe_code)]

//! The from → where* → select pipeline of one query.

use std::sync::Arc;

use tracing::{debug, info};

use crate::app::AppContext;
use crate::config::OutputStyle;
use crate::engine::pretty::{TablePrettifier, TableView};
use crate::query::filter::{FilterDescriptor, FilterDescriptorBuilder, FilterReady};
use crate::query::flow::{FlowAlgorithm, FlowDescriptor, FlowDescriptorBuilder, FlowReady};
use crate::query::from::{FromDescriptor, FromDescriptorBuilder, FromReady};
use crate::query::profile::{profile_timer, record_profile_timer, QueryProfileKind};
use crate::query::scan::GraphFilter;
use crate::table::{AnyColumn, Cell, Table, TableSet};
use crate::types::{QvogError, Result};

/// A where-stage: either a filter or a flow.
#[derive(Clone, Debug)]
pub enum WhereDescriptor {
    /// Replaces one table by a filtered copy.
    Filter(FilterDescriptor),
    /// Replaces source, sink, and barrier tables by the flow result.
    Flow(FlowDescriptor),
}

impl From<FilterDescriptor> for WhereDescriptor {
    fn from(descriptor: FilterDescriptor) -> Self {
        WhereDescriptor::Filter(descriptor)
    }
}

impl From<FilterReady> for WhereDescriptor {
    fn from(ready: FilterReady) -> Self {
        WhereDescriptor::Filter(ready.build())
    }
}

impl From<FlowDescriptor> for WhereDescriptor {
    fn from(descriptor: FlowDescriptor) -> Self {
        WhereDescriptor::Flow(descriptor)
    }
}

impl From<FlowReady> for WhereDescriptor {
    fn from(ready: FlowReady) -> Self {
        WhereDescriptor::Flow(ready.build())
    }
}

/// Builds and runs one query.
///
/// `from` only records what to fetch. The first `where` or `select`
/// prepares the query: one scan materializes every data-mode table, and
/// predicate-mode tables join the set unscanned. Each later stage consumes
/// tables by alias and puts its output back, so an alias never appears
/// twice. `select` needs the set to have collapsed into a single table.
///
/// ```no_run
/// # async fn run(app: std::sync::Arc<qvog::AppContext>) -> qvog::Result<()> {
/// use qvog::query::{QueryDescriptor, RowPredicate, ValuePredicate};
///
/// let mut query = QueryDescriptor::new(app);
/// query.from_clause(|f| f.with_data(ValuePredicate::identifier("Call")).r#as("calls"))?;
/// query
///     .where_clause(|w| w.on("calls").r#where(RowPredicate::new(|_| true)))
///     .await?
///     .select(&["calls"])
///     .await?;
/// println!("{}", query.render(Default::default())?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct QueryDescriptor {
    app: Arc<AppContext>,
    filter: GraphFilter,
    pending: TableSet,
    tables: TableSet,
    aliases: Vec<String>,
    prepared: bool,
    result: Option<Table>,
}

impl QueryDescriptor {
    /// Empty query against `app`.
    pub fn new(app: Arc<AppContext>) -> Self {
        let filter = GraphFilter::new(Arc::clone(&app));
        Self {
            app,
            filter,
            pending: TableSet::new(),
            tables: TableSet::new(),
            aliases: Vec::new(),
            prepared: false,
            result: None,
        }
    }

    /// Application context the query runs against.
    pub fn app(&self) -> &Arc<AppContext> {
        &self.app
    }

    /// Registers a source table. No I/O happens here.
    pub fn from(&mut self, descriptor: impl Into<FromDescriptor>) -> Result<&mut Self> {
        if self.prepared {
            return Err(QvogError::InvalidStage { stage: "from" });
        }
        let descriptor = descriptor.into();
        let alias = descriptor.alias();
        if self.aliases.iter().any(|known| known == alias) {
            return Err(QvogError::duplicate("table", alias));
        }
        descriptor.apply(&mut self.filter, &mut self.pending)?;
        debug!(alias, data = descriptor.is_data(), "query.from.registered");
        self.aliases.push(alias.to_string());
        Ok(self)
    }

    /// [`from`](Self::from) with a builder.
    pub fn from_clause<F>(&mut self, clause: F) -> Result<&mut Self>
    where
        F: FnOnce(FromDescriptorBuilder) -> FromReady,
    {
        let descriptor = clause(FromDescriptorBuilder::new()).build();
        self.from(descriptor)
    }

    /// Applies a filter or flow stage, preparing the query first if needed.
    pub async fn r#where(&mut self, descriptor: impl Into<WhereDescriptor>) -> Result<&mut Self> {
        let descriptor = descriptor.into();
        self.prepare().await?;
        match descriptor {
            WhereDescriptor::Filter(filter) => {
                let timer = profile_timer();
                let table = self.tables.remove_table(filter.alias())?;
                let filtered = filter.apply(table)?;
                debug!(alias = filter.alias(), rows = filtered.row_count(), "query.filter.applied");
                self.tables.add_table(filtered)?;
                record_profile_timer(QueryProfileKind::Filter, timer);
            }
            WhereDescriptor::Flow(flow) => {
                let timer = profile_timer();
                let property = flow.property();
                let aliases = [Some(&property.source), Some(&property.sink), property.barrier.as_ref()];
                for alias in aliases.into_iter().flatten() {
                    self.tables.table(alias)?;
                }
                let source = self.tables.remove_table(&property.source)?;
                let sink = self.tables.remove_table(&property.sink)?;
                let barrier = match &property.barrier {
                    Some(alias) => Some(self.tables.remove_table(alias)?),
                    None => None,
                };
                let result = flow.apply(source, sink, barrier).await?;
                self.tables.add_table(result.renamed(flow.alias()))?;
                record_profile_timer(QueryProfileKind::Flow, timer);
            }
        }
        Ok(self)
    }

    /// [`where`](Self::where) with a filter builder.
    pub async fn where_clause<F>(&mut self, clause: F) -> Result<&mut Self>
    where
        F: FnOnce(FilterDescriptorBuilder) -> FilterReady,
    {
        let descriptor = clause(FilterDescriptorBuilder::new()).build();
        self.r#where(descriptor).await
    }

    /// Applies a flow stage.
    pub async fn exists(&mut self, flow: impl Into<FlowDescriptor>) -> Result<&mut Self> {
        let flow = flow.into();
        self.r#where(flow).await
    }

    /// [`exists`](Self::exists) with a flow builder for `algorithm`.
    pub async fn exists_clause<F>(
        &mut self,
        algorithm: Arc<dyn FlowAlgorithm>,
        clause: F,
    ) -> Result<&mut Self>
    where
        F: FnOnce(FlowDescriptorBuilder) -> FlowReady,
    {
        let flow = clause(FlowDescriptorBuilder::new(algorithm)).build();
        self.r#where(flow).await
    }

    /// Projects the single remaining table into the result.
    ///
    /// Each name copies the column of that name, or else becomes a column
    /// repeating the name itself on every row.
    pub async fn select(&mut self, columns: &[&str]) -> Result<&mut Self> {
        self.prepare().await?;
        let timer = profile_timer();
        self.tables.as_table()?;
        let table = std::mem::take(&mut self.tables).into_table()?;
        let mut result = Table::new(table.name());
        for &name in columns {
            match table.column(name) {
                Ok(column) => result.add_column(column.clone())?,
                Err(_) => result.add_column(AnyColumn::filled(
                    name,
                    Cell::from(name),
                    table.row_count(),
                ))?,
            }
        }
        info!(table = table.name(), rows = result.row_count(), "query.selected");
        self.result = Some(result);
        record_profile_timer(QueryProfileKind::Select, timer);
        Ok(self)
    }

    /// Live tables by alias.
    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    /// Whether the scan already ran.
    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    /// Alias of the most recent `from`.
    pub fn last_alias(&self) -> Option<&str> {
        self.aliases.last().map(String::as_str)
    }

    /// The selected table.
    pub fn result(&self) -> Result<&Table> {
        self.result
            .as_ref()
            .ok_or(QvogError::InvalidStage { stage: "result" })
    }

    /// Headers and rendered rows of the result.
    pub fn output(&self) -> Result<TableView> {
        TableView::from_table(self.result()?, self.app.graph())
    }

    /// The result rendered in `style`.
    pub fn render(&self, style: OutputStyle) -> Result<String> {
        TablePrettifier::new(style).format(&self.output()?)
    }

    /// Moves the query out, leaving an empty one against the same context.
    pub fn take(&mut self) -> QueryDescriptor {
        std::mem::replace(self, QueryDescriptor::new(Arc::clone(&self.app)))
    }

    async fn prepare(&mut self) -> Result<()> {
        if self.prepared {
            return Ok(());
        }
        let mut tables = if self.filter.is_empty() {
            TableSet::new()
        } else {
            self.filter.filter().await?
        };
        tables.merge(std::mem::take(&mut self.pending))?;
        self.tables.merge(tables)?;
        self.prepared = true;
        info!(tables = self.tables.len(), "query.prepared");
        Ok(())
    }
}
