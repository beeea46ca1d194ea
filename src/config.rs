#![forbid(unsafe_code)]

//! Engine and database configuration.
//!
//! Options deserialize from TOML or JSON; the format is picked from the file
//! extension when loading from disk.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{QvogError, Result};

/// Page size used by graph scans unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8182
}

/// Connection settings for the Gremlin-speaking graph store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GremlinOptions {
    /// Host name of the graph server.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port of the graph server.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of vertices requested per page during scans.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for GremlinOptions {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl GremlinOptions {
    /// WebSocket endpoint a wire client should connect to.
    pub fn endpoint(&self) -> String {
        format!("ws://{}:{}/gremlin", self.host, self.port)
    }
}

/// Sizing of the vertex registry owned by a [`Context`](crate::graph::Context).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheOptions {
    /// Maximum number of registered vertices; `None` keeps every entry.
    #[serde(default)]
    pub capacity: Option<usize>,
}

/// Database section of the configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseOptions {
    /// Graph store connection.
    #[serde(default)]
    pub gremlin: GremlinOptions,
    /// Vertex registry sizing.
    #[serde(default)]
    pub cache: CacheOptions,
}

impl DatabaseOptions {
    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.gremlin.batch_size == 0 {
            return Err(QvogError::Configuration(
                "gremlin.batchSize must be greater than zero".into(),
            ));
        }
        if self.cache.capacity == Some(0) {
            return Err(QvogError::Configuration(
                "cache.capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// How result tables are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputStyle {
    /// Pipe-delimited table.
    Markdown,
    /// Pretty-printed `{headers, rows}` object.
    #[default]
    Json,
    /// Compact `{headers, rows}` object.
    JsonMin,
}

impl FromStr for OutputStyle {
    type Err = QvogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "markdown" => Ok(OutputStyle::Markdown),
            "json" => Ok(OutputStyle::Json),
            "json-min" => Ok(OutputStyle::JsonMin),
            other => Err(QvogError::Configuration(format!(
                "unknown output style '{other}'"
            ))),
        }
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputStyle::Markdown => "markdown",
            OutputStyle::Json => "json",
            OutputStyle::JsonMin => "json-min",
        };
        f.write_str(name)
    }
}

/// How per-query result records are formatted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatterKind {
    /// Human-readable header followed by the rendered table.
    #[default]
    Default,
    /// Pretty JSON record.
    Json,
    /// Compact JSON record.
    JsonMin,
    /// Pretty JSON record with JSON results embedded as values.
    ConsoleJson,
}

/// Destination of engine output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output.
    #[default]
    Stdout,
    /// A file, truncated on open.
    File(PathBuf),
}

impl Serialize for OutputTarget {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            OutputTarget::Stdout => serializer.serialize_str("stdout"),
            OutputTarget::File(path) => serializer.serialize_str(&path.to_string_lossy()),
        }
    }
}

impl<'de> Deserialize<'de> for OutputTarget {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "" | "stdout" | "-" => OutputTarget::Stdout,
            path => OutputTarget::File(PathBuf::from(path)),
        })
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// Log filtering for [`logging::init`](crate::logging::init).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingOptions {
    /// Level applied to every target without an explicit entry.
    #[serde(default = "default_level")]
    pub level: String,
    /// Per-target levels, e.g. `qvog::query::scan = "trace"`.
    #[serde(default)]
    pub targets: BTreeMap<String, String>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: default_level(),
            targets: BTreeMap::new(),
        }
    }
}

impl LoggingOptions {
    /// Renders the options as an `EnvFilter` directive string.
    pub fn directives(&self) -> String {
        let mut out = self.level.clone();
        for (target, level) in &self.targets {
            out.push(',');
            out.push_str(target);
            out.push('=');
            out.push_str(level);
        }
        out
    }
}

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Graph store and registry settings.
    #[serde(default)]
    pub database: DatabaseOptions,
    /// Result record formatter.
    #[serde(default)]
    pub formatter: FormatterKind,
    /// Result table style.
    #[serde(default)]
    pub style: OutputStyle,
    /// Where records are written.
    #[serde(default)]
    pub output: OutputTarget,
    /// Log filtering.
    #[serde(default)]
    pub logging: LoggingOptions,
}

impl EngineOptions {
    /// Parses TOML options.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let options: EngineOptions = toml::from_str(input)?;
        options.database.validate()?;
        Ok(options)
    }

    /// Parses JSON options.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let options: EngineOptions = serde_json::from_str(input)?;
        options.database.validate()?;
        Ok(options)
    }

    /// Loads options from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&raw),
            Some("json") => Self::from_json_str(&raw),
            _ => Err(QvogError::Configuration(format!(
                "unsupported config file '{}'",
                path.display()
            ))),
        }
    }
}
