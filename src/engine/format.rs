#![forbid(unsafe_code)]

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::config::FormatterKind;
use crate::engine::pretty::to_json;
use crate::engine::QueryResult;

#[derive(Serialize)]
struct Record<'a, R: Serialize> {
    name: &'a str,
    result: R,
    milliseconds: u64,
}

impl<R: Serialize> Record<'_, R> {
    fn render(&self, minify: bool) -> String {
        to_json(self, minify).unwrap_or_default()
    }
}

#[derive(Serialize)]
struct TotalTime {
    total_milliseconds: u64,
}

fn total_time_record(milliseconds: u64, minify: bool) -> String {
    to_json(
        &TotalTime {
            total_milliseconds: milliseconds,
        },
        minify,
    )
    .unwrap_or_default()
}

/// Wraps each query result with descriptive information.
pub trait ResultFormatter: Send {
    /// Record written after a query ran.
    fn format(&self, result: &QueryResult) -> String;

    /// Line written when the engine closes.
    fn format_total_time(&self, milliseconds: u64) -> String;
}

/// Plain text: a header line followed by the rendered result.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultResultFormatter;

impl ResultFormatter for DefaultResultFormatter {
    fn format(&self, result: &QueryResult) -> String {
        format!(
            "Query {} executed in {}ms ({}s)\n{}\n",
            result.name,
            result.milliseconds,
            result.milliseconds as f64 / 1000.0,
            result.result
        )
    }

    fn format_total_time(&self, milliseconds: u64) -> String {
        format!("Total time: {milliseconds}ms")
    }
}

/// JSON record with the result as a string.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonResultFormatter {
    minify: bool,
}

impl JsonResultFormatter {
    /// Pretty output unless `minify`.
    pub fn new(minify: bool) -> Self {
        Self { minify }
    }
}

impl ResultFormatter for JsonResultFormatter {
    fn format(&self, result: &QueryResult) -> String {
        Record {
            name: &result.name,
            result: &result.result,
            milliseconds: result.milliseconds,
        }
        .render(self.minify)
    }

    fn format_total_time(&self, milliseconds: u64) -> String {
        total_time_record(milliseconds, self.minify)
    }
}

/// Pretty JSON record that nests JSON results instead of quoting them.
///
/// Results that are not JSON, such as markdown tables or error messages,
/// are kept as strings.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleJsonResultFormatter;

impl ResultFormatter for ConsoleJsonResultFormatter {
    fn format(&self, result: &QueryResult) -> String {
        let nested = serde_json::from_str::<JsonValue>(&result.result)
            .unwrap_or_else(|_| JsonValue::String(result.result.clone()));
        Record {
            name: &result.name,
            result: nested,
            milliseconds: result.milliseconds,
        }
        .render(false)
    }

    fn format_total_time(&self, milliseconds: u64) -> String {
        total_time_record(milliseconds, false)
    }
}

/// Formatter selected by configuration.
pub fn formatter_for(kind: FormatterKind) -> Box<dyn ResultFormatter> {
    match kind {
        FormatterKind::Default => Box::new(DefaultResultFormatter),
        FormatterKind::Json => Box::new(JsonResultFormatter::new(false)),
        FormatterKind::JsonMin => Box::new(JsonResultFormatter::new(true)),
        FormatterKind::ConsoleJson => Box::new(ConsoleJsonResultFormatter),
    }
}
