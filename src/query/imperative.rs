#![forbid(unsafe_code)]

//! Free-function query style backed by [`QueryContext::global`].
//!
//! ```no_run
//! use qvog::query::imperative::{nodes, query, report};
//! use qvog::query::ValuePredicate;
//!
//! let calls = query("calls", || async {
//!     nodes(ValuePredicate::identifier("Call"), Some("c")).await?;
//!     report(&["c"]).await
//! });
//! # let _ = calls;
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;

use crate::engine::Queryable;
use crate::query::context::{QueryContext, SharedQuery};
use crate::query::descriptor::QueryDescriptor;
use crate::query::filter::FilterDescriptor;
use crate::query::flow::{FlowAlgorithm, FlowDescriptorBuilder};
use crate::query::from::FromDescriptorBuilder;
use crate::query::predicate::{FilterPredicate, ValuePredicate};
use crate::types::Result;

const ALIAS_LEN: usize = 8;

/// Wraps `action` as a query that runs against the global context.
///
/// The engine's descriptor is handed to the helpers for the duration of
/// `action` and returned afterwards, also when `action` fails.
pub fn query<F, Fut>(name: impl Into<String>, action: F) -> Queryable
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let action = Arc::new(action);
    Queryable::new(name, move |descriptor: &mut QueryDescriptor| {
        let action = Arc::clone(&action);
        async move {
            let context = QueryContext::global();
            let shared: SharedQuery = Arc::new(tokio::sync::Mutex::new(descriptor.take()));
            if let Err(err) = context.require_query(Arc::clone(&shared)) {
                *descriptor = reclaim(shared).await;
                return Err(err);
            }
            let outcome = action().await;
            let released = context.release_query();
            *descriptor = reclaim(shared).await;
            outcome?;
            released.map(|_| ())
        }
        .boxed()
    })
}

async fn reclaim(shared: SharedQuery) -> QueryDescriptor {
    match Arc::try_unwrap(shared) {
        Ok(descriptor) => descriptor.into_inner(),
        Err(shared) => shared.lock().await.take(),
    }
}

fn random_alias() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ALIAS_LEN)
        .map(char::from)
        .collect()
}

fn alias_or_random(alias: Option<&str>) -> String {
    alias.map_or_else(random_alias, str::to_string)
}

fn current() -> Result<SharedQuery> {
    QueryContext::global().query()
}

/// Data-mode source of every vertex with a value accepted by `predicate`
/// anywhere in its tree. Returns the alias.
pub async fn nodes(predicate: ValuePredicate, alias: Option<&str>) -> Result<String> {
    let alias = alias_or_random(alias);
    let shared = current()?;
    let descriptor = with_from_builder(|builder| {
        builder
            .with_data(ValuePredicate::contains(predicate))
            .r#as(alias.clone())
            .build()
    })?;
    shared.lock().await.from(descriptor)?;
    debug!(alias = %alias, "imperative.nodes");
    Ok(alias)
}

/// Predicate-mode source holding every value with a part accepted by
/// `predicate` anywhere in its tree. Returns the alias.
pub async fn predicate(predicate: ValuePredicate, alias: Option<&str>) -> Result<String> {
    let alias = alias_or_random(alias);
    let shared = current()?;
    let descriptor = with_from_builder(|builder| {
        builder
            .with_predicate(ValuePredicate::contains(predicate))
            .r#as(alias.clone())
            .build()
    })?;
    shared.lock().await.from(descriptor)?;
    Ok(alias)
}

fn with_from_builder<T>(build: impl FnOnce(FromDescriptorBuilder) -> T) -> Result<T> {
    let context = QueryContext::global();
    context.require_from(FromDescriptorBuilder::new())?;
    let built = context.from_builder().map(build);
    context.release_from()?;
    built
}

/// Keeps the rows of `alias` accepted by `predicate`.
pub async fn filter(alias: &str, predicate: impl Into<FilterPredicate>) -> Result<()> {
    let descriptor = FilterDescriptor::new(alias, predicate);
    let shared = current()?;
    let mut query = shared.lock().await;
    query.r#where(descriptor).await?;
    Ok(())
}

/// Flow from `source` to `sink` avoiding `barrier`. Returns the alias of
/// the result table.
pub async fn exists(
    algorithm: Arc<dyn FlowAlgorithm>,
    source: &str,
    sink: &str,
    barrier: Option<&str>,
    alias: Option<&str>,
) -> Result<String> {
    let alias = alias_or_random(alias);
    let builder = FlowDescriptorBuilder::new(algorithm).source(source);
    let flow = match barrier {
        Some(barrier) => builder.barrier(barrier).sink(sink),
        None => builder.sink(sink),
    }
    .r#as(alias.clone())
    .build();
    let shared = current()?;
    let mut query = shared.lock().await;
    query.exists(flow).await?;
    Ok(alias)
}

/// Selects `columns` as the query result.
pub async fn report(columns: &[&str]) -> Result<()> {
    let shared = current()?;
    let mut query = shared.lock().await;
    query.select(columns).await?;
    Ok(())
}
