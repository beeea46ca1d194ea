#![allow(missing_docs)]

mod support;

use std::io;
use std::sync::Arc;

use qvog::config::OutputStyle;
use qvog::engine::{Engine, TableView};
use qvog::query::imperative::{exists, filter, nodes, predicate, query, report};
use qvog::query::{QueryContext, QueryDescriptor, ReachabilityFlow, RowPredicate, ValuePredicate};
use qvog::types::{QvogError, Result};
use qvog::AppContext;

use support::{app_with, calls, named, taint_store, FLOW_LABEL};

fn quiet_engine(app: Arc<AppContext>) -> Engine {
    Engine::new(app)
        .with_style(OutputStyle::JsonMin)
        .with_output(Box::new(io::sink()))
}

#[test]
fn second_require_is_rejected_until_release() -> Result<()> {
    let app = app_with(Arc::new(taint_store()?))?;
    let context = QueryContext::new();
    let first = Arc::new(tokio::sync::Mutex::new(QueryDescriptor::new(app.clone())));
    let second = Arc::new(tokio::sync::Mutex::new(QueryDescriptor::new(app)));

    context.require_query(first.clone())?;
    let err = context.require_query(second.clone()).expect_err("slot taken");
    assert!(matches!(err, QvogError::ContextInUse { slot: "query" }));
    assert!(Arc::ptr_eq(&context.query()?, &first));

    let released = context.release_query()?;
    assert!(Arc::ptr_eq(&released, &first));
    assert!(matches!(context.release_query(), Err(QvogError::ContextNotInUse { .. })));
    context.require_query(second)?;
    Ok(())
}

// Every scenario below shares the process-wide context, so they run in
// sequence inside one test.
#[tokio::test]
async fn imperative_queries_share_the_global_context() -> Result<()> {
    let app = app_with(Arc::new(taint_store()?))?;
    let mut engine = quiet_engine(app.clone());

    let outside = nodes(ValuePredicate::any(), None).await.expect_err("no query");
    assert!(matches!(outside, QvogError::ContextNotSet { slot: "query" }));

    let flow_app = app.clone();
    let taint = query("taint", move || {
        let app = flow_app.clone();
        async move {
            let src = nodes(calls("source"), None).await?;
            let snk = nodes(calls("sink"), Some("snk")).await?;
            let never = predicate(ValuePredicate::none(), None).await?;
            let algorithm = Arc::new(ReachabilityFlow::new(app).with_edge_label(FLOW_LABEL));
            let flow = exists(algorithm, &src, &snk, Some(&never), Some("taint")).await?;
            filter(&flow, RowPredicate::new(|_| true)).await?;
            report(&[flow.as_str(), "marker"]).await?;
            Ok(())
        }
    });
    let result = engine.execute(&taint).await?;
    assert!(!result.failed, "{}", result.result);
    let view: TableView = serde_json::from_str(&result.result).expect("json-min table");
    assert_eq!(view.headers, vec!["taint", "marker"]);
    assert_eq!(view.rows, vec![vec!["1 -> 2 -> 3".to_string(), "marker".to_string()]]);
    assert!(!QueryContext::global().has_query());

    let barrier_app = app.clone();
    let blocked = query("blocked", move || {
        let app = barrier_app.clone();
        async move {
            let src = nodes(calls("source"), None).await?;
            let snk = nodes(calls("sink"), None).await?;
            let through_y = predicate(named("Name", "y"), None).await?;
            let algorithm = Arc::new(ReachabilityFlow::new(app).with_edge_label(FLOW_LABEL));
            let flow = exists(algorithm, &src, &snk, Some(&through_y), None).await?;
            report(&[flow.as_str()]).await?;
            Ok(())
        }
    });
    let result = engine.execute(&blocked).await?;
    assert!(!result.failed, "{}", result.result);
    let view: TableView = serde_json::from_str(&result.result).expect("json-min table");
    assert!(view.rows.is_empty(), "nested name in the barrier blocks the flow");

    let nested = query("nested", || async {
        nodes(named("Name", "x"), Some("x")).await?;
        let inner = query("inner", || async { Ok(()) });
        let app = QueryContext::global().query()?.lock().await.app().clone();
        let mut descriptor = QueryDescriptor::new(app);
        inner.run(&mut descriptor).await
    });
    let result = engine.execute(&nested).await?;
    assert!(result.failed);
    assert!(result.result.starts_with("Error executing query \"nested\""));
    assert!(result.result.contains("context in use"));
    assert!(!QueryContext::global().has_query());

    let unfinished = query("unfinished", || async {
        nodes(ValuePredicate::any(), Some("all")).await?;
        Ok(())
    });
    let result = engine.execute(&unfinished).await?;
    assert!(result.failed);
    assert!(!QueryContext::global().has_query());

    let random = query("random", || async {
        let alias = nodes(ValuePredicate::identifier("Assign"), None).await?;
        assert_eq!(alias.len(), 8);
        report(&[alias.as_str()]).await?;
        Ok(())
    });
    let result = engine.execute(&random).await?;
    assert!(!result.failed, "{}", result.result);
    let view: TableView = serde_json::from_str(&result.result).expect("json-min table");
    assert_eq!(view.rows.len(), 2);
    assert_eq!(engine.executed(), 5);
    Ok(())
}
