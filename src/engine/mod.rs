#![forbid(unsafe_code)]

//! Sequential query runner and result output.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::AppContext;
use crate::config::{EngineOptions, OutputStyle, OutputTarget};
use crate::query::QueryDescriptor;
use crate::types::Result;

/// Per-query result record formatters.
pub mod format;
/// Result table rendering.
pub mod pretty;

pub use format::{
    formatter_for, ConsoleJsonResultFormatter, DefaultResultFormatter, JsonResultFormatter,
    ResultFormatter,
};
pub use pretty::{render_cell, TablePrettifier, TableView};

type QueryFn =
    dyn for<'a> Fn(&'a mut QueryDescriptor) -> BoxFuture<'a, Result<()>> + Send + Sync;

/// A named query body.
///
/// The body receives a fresh [`QueryDescriptor`] and is expected to end
/// with `select`.
pub struct Queryable {
    name: String,
    query: Box<QueryFn>,
}

impl Queryable {
    /// Query `name` running `query`.
    pub fn new<F>(name: impl Into<String>, query: F) -> Self
    where
        F: for<'a> Fn(&'a mut QueryDescriptor) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            query: Box::new(query),
        }
    }

    /// Query name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the body against `descriptor`.
    pub async fn run(&self, descriptor: &mut QueryDescriptor) -> Result<()> {
        (self.query)(descriptor).await
    }
}

impl fmt::Debug for Queryable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queryable")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Fluent query: `query` builds the pipeline on the descriptor it is given.
///
/// ```no_run
/// use futures::FutureExt;
/// use qvog::engine::pattern;
/// use qvog::query::ValuePredicate;
///
/// let calls = pattern("calls", |q| {
///     async move {
///         q.from_clause(|f| f.with_data(ValuePredicate::identifier("Call")).r#as("c"))?;
///         q.select(&["c"]).await?;
///         Ok(())
///     }
///     .boxed()
/// });
/// assert_eq!(calls.name(), "calls");
/// ```
pub fn pattern<F>(name: impl Into<String>, query: F) -> Queryable
where
    F: for<'a> Fn(&'a mut QueryDescriptor) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
{
    Queryable::new(name, query)
}

/// Outcome of one query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Query name.
    pub name: String,
    /// Rendered result table, or the error message.
    pub result: String,
    /// Wall time in milliseconds.
    pub milliseconds: u64,
    /// Whether `result` is an error message.
    pub failed: bool,
}

/// Runs queries one after another and writes formatted results.
///
/// A failing query does not stop the engine: its error becomes the result
/// text and later queries still run.
pub struct Engine {
    app: Arc<AppContext>,
    style: OutputStyle,
    formatter: Box<dyn ResultFormatter>,
    output: Box<dyn Write + Send>,
    total: Duration,
    executed: usize,
}

impl Engine {
    /// Engine writing JSON tables through the default formatter to stdout.
    pub fn new(app: Arc<AppContext>) -> Self {
        Self {
            app,
            style: OutputStyle::default(),
            formatter: Box::new(DefaultResultFormatter),
            output: Box::new(io::stdout()),
            total: Duration::ZERO,
            executed: 0,
        }
    }

    /// Engine configured by `options`; file targets are created or truncated.
    pub fn from_options(app: Arc<AppContext>, options: &EngineOptions) -> Result<Self> {
        let output: Box<dyn Write + Send> = match &options.output {
            OutputTarget::Stdout => Box::new(io::stdout()),
            OutputTarget::File(path) => Box::new(BufWriter::new(File::create(path)?)),
        };
        Ok(Self::new(app)
            .with_style(options.style)
            .with_formatter(formatter_for(options.formatter))
            .with_output(output))
    }

    /// Table rendering style.
    pub fn with_style(mut self, style: OutputStyle) -> Self {
        self.style = style;
        self
    }

    /// Result record formatter.
    pub fn with_formatter(mut self, formatter: Box<dyn ResultFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Output sink.
    pub fn with_output(mut self, output: Box<dyn Write + Send>) -> Self {
        self.output = output;
        self
    }

    /// Runs one query and writes its record.
    ///
    /// Only output failures are returned as errors.
    pub async fn execute(&mut self, query: &Queryable) -> Result<QueryResult> {
        let start = Instant::now();
        let mut descriptor = QueryDescriptor::new(Arc::clone(&self.app));
        let outcome = match query.run(&mut descriptor).await {
            Ok(()) => descriptor.render(self.style),
            Err(err) => Err(err),
        };
        let elapsed = start.elapsed();
        let milliseconds = elapsed.as_millis().min(u64::MAX as u128) as u64;
        let result = match outcome {
            Ok(text) => {
                info!(query = query.name(), milliseconds, "engine.query.completed");
                QueryResult {
                    name: query.name().to_string(),
                    result: text,
                    milliseconds,
                    failed: false,
                }
            }
            Err(err) => {
                warn!(query = query.name(), code = err.code(), error = %err, "engine.query.failed");
                QueryResult {
                    name: query.name().to_string(),
                    result: format!("Error executing query \"{}\": {err}", query.name()),
                    milliseconds,
                    failed: true,
                }
            }
        };
        self.total += elapsed;
        self.executed += 1;
        writeln!(self.output, "{}", self.formatter.format(&result))?;
        self.output.flush()?;
        Ok(result)
    }

    /// Runs every query in order.
    pub async fn submit(&mut self, queries: &[Queryable]) -> Result<Vec<QueryResult>> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            results.push(self.execute(query).await?);
        }
        Ok(results)
    }

    /// Accumulated query time.
    pub fn total_time(&self) -> Duration {
        self.total
    }

    /// Number of queries run.
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Writes the total time and flushes the output.
    pub fn close(mut self) -> Result<()> {
        let milliseconds = self.total.as_millis().min(u64::MAX as u128) as u64;
        writeln!(self.output, "{}", self.formatter.format_total_time(milliseconds))?;
        self.output.flush()?;
        info!(queries = self.executed, milliseconds, "engine.closed");
        Ok(())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("style", &self.style)
            .field("total", &self.total)
            .field("executed", &self.executed)
            .finish_non_exhaustive()
    }
}
