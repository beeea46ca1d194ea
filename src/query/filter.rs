#![forbid(unsafe_code)]

//! Filter-stage descriptors.

use std::fmt;
use std::sync::Arc;

use crate::query::predicate::FilterPredicate;
use crate::table::Table;
use crate::types::Result;

type TableTransform = dyn Fn(Table) -> Result<Table> + Send + Sync;

/// Replaces the table under `alias` with a transformed copy.
#[derive(Clone)]
pub struct FilterDescriptor {
    alias: String,
    transform: Arc<TableTransform>,
}

impl FilterDescriptor {
    /// Keeps the rows of `alias` accepted by `predicate`.
    pub fn new(alias: impl Into<String>, predicate: impl Into<FilterPredicate>) -> Self {
        let alias = alias.into();
        let predicate = predicate.into();
        let column = alias.clone();
        Self::custom(alias, move |table| retain_rows(table, &column, &predicate))
    }

    /// Arbitrary transform of the table under `alias`.
    pub fn custom<F>(alias: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Table) -> Result<Table> + Send + Sync + 'static,
    {
        Self {
            alias: alias.into(),
            transform: Arc::new(transform),
        }
    }

    /// Filtered table alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Runs the transform; the output keeps the alias.
    pub fn apply(&self, table: Table) -> Result<Table> {
        (self.transform)(table).map(|table| table.renamed(self.alias.clone()))
    }
}

impl fmt::Debug for FilterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDescriptor")
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

/// Same schema, only the rows where `predicate` holds for `column`.
fn retain_rows(table: Table, column: &str, predicate: &FilterPredicate) -> Result<Table> {
    let mut kept = table.duplicate(true);
    for row in table.rows() {
        let row = row?;
        if predicate.test_row(column, &row) {
            kept.add_row(row)?;
        }
    }
    Ok(kept)
}

/// Entry point of the where-clause builder.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilterDescriptorBuilder;

impl FilterDescriptorBuilder {
    /// Fresh builder.
    pub fn new() -> Self {
        Self
    }

    /// Table to filter.
    pub fn on(self, alias: impl Into<String>) -> FilterOn {
        FilterOn {
            alias: alias.into(),
        }
    }
}

/// Builder state once the table is chosen.
#[derive(Clone, Debug)]
pub struct FilterOn {
    alias: String,
}

impl FilterOn {
    /// Row condition.
    pub fn r#where(self, predicate: impl Into<FilterPredicate>) -> FilterReady {
        FilterReady {
            alias: self.alias,
            predicate: predicate.into(),
        }
    }
}

/// Complete where-clause.
#[derive(Clone, Debug)]
pub struct FilterReady {
    alias: String,
    predicate: FilterPredicate,
}

impl FilterReady {
    /// Finishes the descriptor.
    pub fn build(self) -> FilterDescriptor {
        FilterDescriptor::new(self.alias, self.predicate)
    }
}

impl From<FilterReady> for FilterDescriptor {
    fn from(ready: FilterReady) -> Self {
        ready.build()
    }
}
