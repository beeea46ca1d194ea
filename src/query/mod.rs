#![forbid(unsafe_code)]

//! Query construction and execution.
//!
//! A query is a fixed pipeline: one or more `from` stages, any number of
//! `where` stages (filters and flows), and one `select`. Descriptors for
//! each stage are built with typestate builders, so a stage cannot be built
//! before its required parts are given. [`QueryDescriptor`] runs the
//! pipeline; [`imperative`] offers the same stages as free functions.

/// Process-wide slots guarding imperative queries.
pub mod context;

/// The query pipeline.
pub mod descriptor;

/// Filter stages.
pub mod filter;

/// Flow stages and algorithms.
pub mod flow;

/// From stages.
pub mod from;

/// Free-function query helpers.
pub mod imperative;

/// Value, row, and flow predicates.
pub mod predicate;

/// Stage timing collected when `QVOG_PROFILE` is set.
pub mod profile;

/// Batched graph scan.
pub mod scan;

pub use context::{ContextSlot, QueryContext, SharedQuery};
pub use descriptor::{QueryDescriptor, WhereDescriptor};
pub use filter::{FilterDescriptor, FilterDescriptorBuilder, FilterOn, FilterReady};
pub use flow::{
    FlowAlgorithm, FlowDescriptor, FlowDescriptorBuilder, FlowProperty, FlowReady, FlowResult,
    FlowWithBarrier, FlowWithSink, FlowWithSource, ReachabilityFlow,
};
pub use from::{FromDescriptor, FromDescriptorBuilder, FromReady, FromSource, FromWithSource};
pub use predicate::{FilterPredicate, FlowPredicate, RowPredicate, ValuePredicate};
pub use profile::{profile_snapshot, QueryProfileSnapshot};
pub use scan::GraphFilter;
