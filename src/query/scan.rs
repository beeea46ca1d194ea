#![forbid(unsafe_code)]

//! Batched graph scan with fan-out classification.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::app::AppContext;
use crate::graph::CachePolicy;
use crate::query::predicate::ValuePredicate;
use crate::query::profile::{profile_timer, record_profile_timer, QueryProfileKind};
use crate::table::{Cell, DataColumn, Table, TableSet};
use crate::types::{QvogError, Result};

#[derive(Clone, Debug)]
struct FilterAction {
    alias: String,
    predicate: ValuePredicate,
}

/// One linear pass over the store's vertex space.
///
/// Every registered `(alias, predicate)` action is tested against every
/// scanned vertex; a vertex lands in each column whose predicate accepts
/// it. Pages are fetched one at a time and fully classified before the
/// next request.
#[derive(Clone, Debug)]
pub struct GraphFilter {
    app: Arc<AppContext>,
    batch_size: usize,
    actions: Vec<FilterAction>,
}

impl GraphFilter {
    /// Scan using the configured batch size.
    pub fn new(app: Arc<AppContext>) -> Self {
        let batch_size = app.batch_size();
        Self {
            app,
            batch_size,
            actions: Vec::new(),
        }
    }

    /// Overrides the page size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Page size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Registers an output column. Aliases must be unique.
    pub fn add_action(&mut self, alias: impl Into<String>, predicate: ValuePredicate) -> Result<()> {
        let alias = alias.into();
        if self.has_action(&alias) {
            return Err(QvogError::duplicate("table", alias));
        }
        self.actions.push(FilterAction { alias, predicate });
        Ok(())
    }

    /// Whether `alias` is registered.
    pub fn has_action(&self, alias: &str) -> bool {
        self.actions.iter().any(|action| action.alias == alias)
    }

    /// `true` without actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Runs the scan and returns one table per action.
    ///
    /// A rejected page is logged and ends the scan; the tables then hold
    /// whatever was classified before it. Vertices that cannot be resolved
    /// are skipped. While its predicates run, a vertex is staged in the
    /// context so node-based predicates can see it. Matching vertices are
    /// registered so that later node lookups succeed; the rest are not kept.
    pub async fn filter(&self) -> Result<TableSet> {
        let mut columns: Vec<DataColumn> = self
            .actions
            .iter()
            .map(|action| DataColumn::new(action.alias.clone(), true))
            .collect();
        let store = self.app.store();
        let graph = self.app.graph();
        let mut offset = 0usize;
        let mut matched = Vec::with_capacity(self.actions.len());

        loop {
            let timer = profile_timer();
            let page = match store.vertices(offset, self.batch_size).await {
                Ok(page) => page,
                Err(err) => {
                    error!(offset, error = %err, "scan.page.rejected");
                    break;
                }
            };
            record_profile_timer(QueryProfileKind::Fetch, timer);
            if page.is_empty() {
                break;
            }

            let timer = profile_timer();
            for vertex in &page {
                let registration = match graph.resolve(vertex, CachePolicy::Bypass) {
                    Ok(registration) => registration,
                    Err(err) => {
                        warn!(vertex = %vertex.id, error = %err, "scan.vertex.skipped");
                        continue;
                    }
                };
                let staged = graph.stage(&registration);
                matched.clear();
                matched.extend(
                    self.actions
                        .iter()
                        .enumerate()
                        .filter(|(_, action)| action.predicate.test(&registration.value))
                        .map(|(pos, _)| pos),
                );
                drop(staged);
                if matched.is_empty() {
                    continue;
                }
                let value = graph.register(registration).value;
                for &pos in &matched {
                    columns[pos].add_value(Cell::Value(Arc::clone(&value)));
                }
            }
            record_profile_timer(QueryProfileKind::Classify(page.len() as u64), timer);

            offset += page.len();
            debug!(offset, page = page.len(), "scan.page.classified");
        }

        let mut tables = TableSet::new();
        for column in columns {
            let alias = column.name().to_string();
            tables.add_table(Table::with_column(alias, column))?;
        }
        Ok(tables)
    }
}
