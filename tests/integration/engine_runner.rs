#![allow(missing_docs)]

mod support;

use std::fs;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value as JsonValue;

use qvog::config::{EngineOptions, FormatterKind, OutputStyle, OutputTarget};
use qvog::engine::{pattern, ConsoleJsonResultFormatter, Engine, JsonResultFormatter, Queryable};
use qvog::query::ValuePredicate;
use qvog::types::{QvogError, Result};

use support::{app_with, calls, taint_store, SharedBuffer};

fn sources() -> Queryable {
    pattern("sources", |q| {
        async move {
            q.from_clause(|f| f.with_data(ValuePredicate::contains(calls("source"))).r#as("s"))?;
            q.select(&["s"]).await?;
            Ok(())
        }
        .boxed()
    })
}

fn no_sources() -> Queryable {
    pattern("broken", |q| {
        async move {
            q.select(&["a"]).await?;
            Ok(())
        }
        .boxed()
    })
}

#[tokio::test]
async fn failing_query_does_not_stop_the_engine() -> Result<()> {
    let app = app_with(Arc::new(taint_store()?))?;
    let buffer = SharedBuffer::default();
    let mut engine = Engine::new(app)
        .with_style(OutputStyle::Markdown)
        .with_output(Box::new(buffer.clone()));

    let results = engine.submit(&[no_sources(), sources()]).await?;
    assert_eq!(results.len(), 2);
    assert!(results[0].failed);
    assert_eq!(
        results[0].result,
        "Error executing query \"broken\": expected exactly one table, found 0"
    );
    assert!(!results[1].failed);
    assert_eq!(results[1].result, "\n| s |\n| --- |\n| (main.toy:1) x = source() |\n");
    assert_eq!(engine.executed(), 2);
    engine.close()?;

    let written = buffer.contents();
    assert!(written.starts_with("Query broken executed in "));
    assert!(written.contains("Query sources executed in "));
    assert!(written.trim_end().lines().last().is_some_and(|line| line.starts_with("Total time: ")));
    Ok(())
}

#[tokio::test]
async fn json_formatters_wrap_each_record() -> Result<()> {
    let app = app_with(Arc::new(taint_store()?))?;
    let buffer = SharedBuffer::default();
    let mut engine = Engine::new(app.clone())
        .with_style(OutputStyle::JsonMin)
        .with_formatter(Box::new(JsonResultFormatter::new(true)))
        .with_output(Box::new(buffer.clone()));
    engine.execute(&sources()).await?;

    let line = buffer.contents();
    let record: JsonValue = serde_json::from_str(line.trim_end()).expect("json record");
    assert_eq!(record["name"], "sources");
    let table: JsonValue =
        serde_json::from_str(record["result"].as_str().expect("quoted result")).expect("table");
    assert_eq!(table["headers"][0], "s");

    let buffer = SharedBuffer::default();
    let mut engine = Engine::new(app)
        .with_style(OutputStyle::Json)
        .with_formatter(Box::new(ConsoleJsonResultFormatter))
        .with_output(Box::new(buffer.clone()));
    engine.execute(&sources()).await?;
    engine.execute(&no_sources()).await?;
    engine.close()?;

    let written = buffer.contents();
    assert!(written.contains("\"headers\": ["));
    assert!(written.contains("\"result\": \"Error executing query \\\"broken\\\""));
    let total = written.rfind("{\n    \"total_milliseconds\"").expect("total record");
    let record: JsonValue = serde_json::from_str(&written[total..]).expect("total json");
    assert!(record["total_milliseconds"].is_u64());
    Ok(())
}

#[tokio::test]
async fn file_target_is_created_from_options() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("results.txt");
    fs::write(&path, "stale")?;
    let options = EngineOptions {
        formatter: FormatterKind::Default,
        style: OutputStyle::Markdown,
        output: OutputTarget::File(path.clone()),
        ..EngineOptions::default()
    };

    let app = app_with(Arc::new(taint_store()?))?;
    let mut engine = Engine::from_options(app, &options)?;
    engine.execute(&sources()).await?;
    engine.close()?;

    let written = fs::read_to_string(&path)?;
    assert!(!written.contains("stale"));
    assert!(written.contains("| (main.toy:1) x = source() |"));
    assert!(written.contains("Total time: "));
    Ok(())
}

#[tokio::test]
async fn unwritable_target_is_an_io_error() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let options = EngineOptions {
        output: OutputTarget::File(dir.path().join("missing").join("results.txt")),
        ..EngineOptions::default()
    };
    let app = app_with(Arc::new(taint_store()?))?;
    let err = Engine::from_options(app, &options).expect_err("parent directory missing");
    assert!(matches!(err, QvogError::Io(_)));
    Ok(())
}
