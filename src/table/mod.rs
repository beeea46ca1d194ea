#![forbid(unsafe_code)]

//! Columnar data model for query intermediates.
//!
//! Each from-stage produces one [`Table`] registered under its alias in a
//! [`TableSet`]; filter and flow stages replace tables under the same or a
//! new alias; `select` collapses the set into the result table.

/// Table cells and rows.
pub mod cell;
/// Data, predicate, and generic columns.
pub mod column;
/// Tables and table sets.
pub mod table;

pub use cell::{Cell, Row};
pub use column::{AnyColumn, Column, DataColumn, PredicateColumn, PREDICATE_SIZE};
pub use table::{Table, TableSet};
