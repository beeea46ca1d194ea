#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// A snapshot of query execution profiling metrics.
///
/// Profiling is enabled via the `QVOG_PROFILE` environment variable and
/// tracks time spent in each query stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryProfileSnapshot {
    /// Total nanoseconds spent waiting for scan pages.
    pub fetch_ns: u64,
    /// Number of pages fetched.
    pub fetch_count: u64,
    /// Total nanoseconds spent classifying scanned vertices.
    pub classify_ns: u64,
    /// Number of vertices classified.
    pub classify_count: u64,
    /// Total nanoseconds spent applying filter stages.
    pub filter_ns: u64,
    /// Number of filter stages applied.
    pub filter_count: u64,
    /// Total nanoseconds spent applying flow stages.
    pub flow_ns: u64,
    /// Number of flow stages applied.
    pub flow_count: u64,
    /// Total nanoseconds spent building result tables.
    pub select_ns: u64,
    /// Number of result tables built.
    pub select_count: u64,
}

#[derive(Default)]
struct QueryProfileCounters {
    fetch_ns: AtomicU64,
    fetch_count: AtomicU64,
    classify_ns: AtomicU64,
    classify_count: AtomicU64,
    filter_ns: AtomicU64,
    filter_count: AtomicU64,
    flow_ns: AtomicU64,
    flow_count: AtomicU64,
    select_ns: AtomicU64,
    select_count: AtomicU64,
}

static PROFILE_ENABLED: OnceLock<bool> = OnceLock::new();
static PROFILE_COUNTERS: OnceLock<QueryProfileCounters> = OnceLock::new();

fn profiling_enabled() -> bool {
    *PROFILE_ENABLED.get_or_init(|| std::env::var_os("QVOG_PROFILE").is_some())
}

fn counters() -> Option<&'static QueryProfileCounters> {
    profiling_enabled().then(|| PROFILE_COUNTERS.get_or_init(QueryProfileCounters::default))
}

pub(crate) fn profile_timer() -> Option<Instant> {
    profiling_enabled().then(Instant::now)
}

pub(crate) enum QueryProfileKind {
    /// One page request.
    Fetch,
    /// Classification of `n` vertices.
    Classify(u64),
    /// One filter stage.
    Filter,
    /// One flow stage.
    Flow,
    /// One select.
    Select,
}

pub(crate) fn record_profile_timer(kind: QueryProfileKind, start: Option<Instant>) {
    let Some(start) = start else {
        return;
    };
    let Some(counters) = counters() else {
        return;
    };
    let nanos = start.elapsed().as_nanos().min(u64::MAX as u128) as u64;
    let (ns, count, n) = match kind {
        QueryProfileKind::Fetch => (&counters.fetch_ns, &counters.fetch_count, 1),
        QueryProfileKind::Classify(n) => (&counters.classify_ns, &counters.classify_count, n),
        QueryProfileKind::Filter => (&counters.filter_ns, &counters.filter_count, 1),
        QueryProfileKind::Flow => (&counters.flow_ns, &counters.flow_count, 1),
        QueryProfileKind::Select => (&counters.select_ns, &counters.select_count, 1),
    };
    ns.fetch_add(nanos, Ordering::Relaxed);
    count.fetch_add(n, Ordering::Relaxed);
}

/// Retrieves a snapshot of current query profiling metrics.
///
/// # Arguments
///
/// * `reset` - If `true`, resets all counters to zero after reading them.
///
/// # Returns
///
/// Returns `Some(QueryProfileSnapshot)` if profiling is enabled via the
/// `QVOG_PROFILE` environment variable, or `None` if profiling is disabled.
///
/// # Example
///
/// ```no_run
/// use qvog::query::profile::profile_snapshot;
///
/// if let Some(snapshot) = profile_snapshot(true) {
///     println!("pages fetched: {}", snapshot.fetch_count);
/// }
/// ```
pub fn profile_snapshot(reset: bool) -> Option<QueryProfileSnapshot> {
    let counters = counters()?;
    let load = |counter: &AtomicU64| {
        if reset {
            counter.swap(0, Ordering::Relaxed)
        } else {
            counter.load(Ordering::Relaxed)
        }
    };
    Some(QueryProfileSnapshot {
        fetch_ns: load(&counters.fetch_ns),
        fetch_count: load(&counters.fetch_count),
        classify_ns: load(&counters.classify_ns),
        classify_count: load(&counters.classify_count),
        filter_ns: load(&counters.filter_ns),
        filter_count: load(&counters.filter_count),
        flow_ns: load(&counters.flow_ns),
        flow_count: load(&counters.flow_count),
        select_ns: load(&counters.select_ns),
        select_count: load(&counters.select_count),
    })
}
