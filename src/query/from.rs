#![forbid(unsafe_code)]

//! From-clause descriptors and their builder.

use crate::query::predicate::ValuePredicate;
use crate::query::scan::GraphFilter;
use crate::table::{PredicateColumn, Table, TableSet};
use crate::types::Result;

/// Where the rows of a from-table come from.
#[derive(Clone, Debug)]
pub enum FromSource {
    /// Materialized by the graph scan: every vertex accepted by the
    /// predicate becomes a row.
    Data(ValuePredicate),
    /// Never materialized; the table answers membership with the predicate.
    Predicate(ValuePredicate),
}

/// A named source table of a query.
#[derive(Clone, Debug)]
pub struct FromDescriptor {
    alias: String,
    source: FromSource,
}

impl FromDescriptor {
    /// Table alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Row source.
    pub fn source(&self) -> &FromSource {
        &self.source
    }

    /// `true` when the table is filled by the scan.
    pub fn is_data(&self) -> bool {
        matches!(self.source, FromSource::Data(_))
    }

    /// Data sources register a scan action; predicate sources add a
    /// single predicate column table to `tables` right away.
    pub(crate) fn apply(&self, filter: &mut GraphFilter, tables: &mut TableSet) -> Result<()> {
        match &self.source {
            FromSource::Data(predicate) => filter.add_action(self.alias.clone(), predicate.clone()),
            FromSource::Predicate(predicate) => tables.add_table(Table::with_column(
                self.alias.clone(),
                PredicateColumn::new(self.alias.clone(), predicate.clone()),
            )),
        }
    }
}

/// Entry point of the from-clause builder.
///
/// ```
/// use qvog::query::{FromDescriptorBuilder, ValuePredicate};
///
/// let from = FromDescriptorBuilder::new()
///     .with_data(ValuePredicate::identifier("Call"))
///     .r#as("calls")
///     .build();
/// assert_eq!(from.alias(), "calls");
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct FromDescriptorBuilder;

impl FromDescriptorBuilder {
    /// Fresh builder.
    pub fn new() -> Self {
        Self
    }

    /// Rows are the scanned vertices accepted by `predicate`.
    pub fn with_data(self, predicate: ValuePredicate) -> FromWithSource {
        FromWithSource {
            source: FromSource::Data(predicate),
        }
    }

    /// Membership is answered by `predicate`; nothing is scanned.
    pub fn with_predicate(self, predicate: ValuePredicate) -> FromWithSource {
        FromWithSource {
            source: FromSource::Predicate(predicate),
        }
    }
}

/// Builder state once the source is chosen.
#[derive(Clone, Debug)]
pub struct FromWithSource {
    source: FromSource,
}

impl FromWithSource {
    /// Names the table.
    pub fn r#as(self, alias: impl Into<String>) -> FromReady {
        FromReady {
            alias: alias.into(),
            source: self.source,
        }
    }
}

/// Complete from-clause.
#[derive(Clone, Debug)]
pub struct FromReady {
    alias: String,
    source: FromSource,
}

impl FromReady {
    /// Finishes the descriptor.
    pub fn build(self) -> FromDescriptor {
        FromDescriptor {
            alias: self.alias,
            source: self.source,
        }
    }
}

impl From<FromReady> for FromDescriptor {
    fn from(ready: FromReady) -> Self {
        ready.build()
    }
}
