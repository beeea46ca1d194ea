#![allow(missing_docs)]

mod support;

use std::sync::Arc;

use qvog::config::{DatabaseOptions, OutputStyle};
use qvog::engine::TableView;
use qvog::query::{
    FilterDescriptorBuilder, FlowAlgorithm, FlowDescriptorBuilder, QueryDescriptor,
    ReachabilityFlow, RowPredicate, ValuePredicate,
};
use qvog::table::Cell;
use qvog::types::{QvogError, Result};
use qvog::AppContext;

use support::{
    app_with, calls, named, taint_store, toy_language, RecordingStore, SharedBuffer, FILE,
    FLOW_LABEL,
};

fn taint_app() -> Result<Arc<AppContext>> {
    app_with(Arc::new(taint_store()?))
}

fn reachability(app: &Arc<AppContext>) -> Arc<dyn FlowAlgorithm> {
    Arc::new(ReachabilityFlow::new(Arc::clone(app)).with_edge_label(FLOW_LABEL))
}

fn sources_and_sinks(query: &mut QueryDescriptor) -> Result<()> {
    query
        .from_clause(|f| f.with_data(ValuePredicate::contains(calls("source"))).r#as("src"))?
        .from_clause(|f| f.with_data(ValuePredicate::contains(calls("sink"))).r#as("snk"))?;
    Ok(())
}

#[tokio::test]
async fn reachable_pair_yields_one_row() -> Result<()> {
    let app = taint_app()?;
    let mut query = QueryDescriptor::new(app.clone());
    sources_and_sinks(&mut query)?;
    query
        .exists_clause(reachability(&app), |flow| flow.source("src").sink("snk").r#as("f"))
        .await?
        .select(&["f"])
        .await?;

    let result = query.result()?;
    assert_eq!(result.name(), "f");
    assert_eq!(result.size(), 1);

    let output = query.output()?;
    assert_eq!(output.headers, vec!["f"]);
    assert_eq!(output.rows, vec![vec!["1 -> 2 -> 3".to_string()]]);
    Ok(())
}

#[tokio::test]
async fn absent_barrier_equals_never_matching_barrier() -> Result<()> {
    let app = taint_app()?;

    let mut plain = QueryDescriptor::new(app.clone());
    sources_and_sinks(&mut plain)?;
    plain
        .exists_clause(reachability(&app), |flow| flow.source("src").sink("snk").r#as("f"))
        .await?
        .select(&["src", "snk", "f"])
        .await?;

    let mut guarded = QueryDescriptor::new(app.clone());
    sources_and_sinks(&mut guarded)?;
    guarded.from_clause(|f| f.with_predicate(ValuePredicate::none()).r#as("never"))?;
    guarded
        .exists_clause(reachability(&app), |flow| {
            flow.source("src").barrier("never").sink("snk").r#as("f")
        })
        .await?
        .select(&["src", "snk", "f"])
        .await?;

    assert_eq!(plain.output()?, guarded.output()?);
    Ok(())
}

#[tokio::test]
async fn barrier_on_the_path_blocks_the_flow() -> Result<()> {
    let app = taint_app()?;
    let mut query = QueryDescriptor::new(app.clone());
    sources_and_sinks(&mut query)?;
    query.from_clause(|f| f.with_data(ValuePredicate::contains(named("Name", "y"))).r#as("y"))?;
    query
        .exists_clause(reachability(&app), |flow| {
            flow.source("src").barrier("y").sink("snk").r#as("f")
        })
        .await?
        .select(&["f"])
        .await?;
    assert_eq!(query.result()?.size(), 0);
    Ok(())
}

#[tokio::test]
async fn literal_columns_repeat_their_name() -> Result<()> {
    let app = taint_app()?;
    let mut query = QueryDescriptor::new(app);
    query.from_clause(|f| f.with_data(ValuePredicate::identifier("Assign")).r#as("assigns"))?;
    query.select(&["assigns", "literal"]).await?;

    let result = query.result()?;
    assert_eq!(result.size(), 2);
    let literal = result.column("literal")?;
    assert_eq!(literal.size(), 2);
    assert!(literal.cells()?.iter().all(|cell| *cell == Cell::from("literal")));

    let output = query.output()?;
    assert_eq!(output.rows[0][0], format!("({FILE}:1) x = source()"));
    assert_eq!(output.rows[1][1], "literal");
    Ok(())
}

#[tokio::test]
async fn filters_replace_the_table_in_place() -> Result<()> {
    let app = taint_app()?;
    let mut query = QueryDescriptor::new(app.clone());
    query.from_clause(|f| f.with_data(ValuePredicate::identifier("Assign")).r#as("a"))?;
    let graph = Arc::clone(app.graph());
    query
        .where_clause(|w| {
            w.on("a").r#where(ValuePredicate::node(graph, |node| {
                node.as_code().map_or(false, |code| code.lineno > 1)
            }))
        })
        .await?;
    assert_eq!(query.tables().table("a")?.size(), 1);

    query
        .r#where(
            FilterDescriptorBuilder::new()
                .on("a")
                .r#where(RowPredicate::new(|row| row.contains_key("a"))),
        )
        .await?
        .select(&["a"])
        .await?;
    let rendered = query.render(OutputStyle::Markdown)?;
    assert_eq!(rendered, format!("\n| a |\n| --- |\n| ({FILE}:2) y = x |\n"));
    Ok(())
}

#[tokio::test]
async fn predicate_sources_skip_the_scan() -> Result<()> {
    let store = Arc::new(RecordingStore::new(taint_store()?));
    let app = support::app_with(store.clone())?;
    let mut query = QueryDescriptor::new(app);
    query.from_clause(|f| f.with_predicate(ValuePredicate::any()).r#as("p"))?;
    query.select(&["p"]).await?;

    assert!(store.requests().is_empty());
    assert!(query.result()?.columns()[0].is_predicate());
    assert_eq!(query.output()?, TableView::new(vec!["p".into()]));
    Ok(())
}

#[tokio::test]
async fn stages_enforce_pipeline_shape() -> Result<()> {
    let app = taint_app()?;
    let mut query = QueryDescriptor::new(app.clone());
    query.from_clause(|f| f.with_data(ValuePredicate::any()).r#as("a"))?;

    let duplicate = query
        .from_clause(|f| f.with_predicate(ValuePredicate::any()).r#as("a"))
        .expect_err("alias reused across modes");
    assert!(matches!(duplicate, QvogError::DuplicateName { .. }));

    query.from_clause(|f| f.with_predicate(ValuePredicate::any()).r#as("b"))?;
    assert!(query.result().is_err());

    let two_tables = query.select(&["a"]).await.expect_err("two tables remain");
    assert!(matches!(two_tables, QvogError::NotExactlyOne { kind: "table", found: 2 }));
    assert!(query.is_prepared());
    assert_eq!(query.tables().len(), 2);

    let late = query
        .from_clause(|f| f.with_data(ValuePredicate::any()).r#as("c"))
        .expect_err("from after prepare");
    assert!(matches!(late, QvogError::InvalidStage { stage: "from" }));

    let missing = query
        .r#where(FilterDescriptorBuilder::new().on("nope").r#where(ValuePredicate::any()))
        .await
        .expect_err("unknown alias");
    assert!(matches!(missing, QvogError::NotFound { kind: "table", .. }));

    let flow = FlowDescriptorBuilder::new(reachability(&app))
        .source("a")
        .sink("b")
        .r#as("f")
        .build();
    query.exists(flow).await?;
    assert_eq!(query.tables().aliases().collect::<Vec<_>>(), vec!["f"]);
    assert_eq!(query.tables().table("f")?.size(), 3);
    Ok(())
}

#[tokio::test]
async fn unknown_flow_alias_leaves_the_tables_intact() -> Result<()> {
    let app = taint_app()?;
    let mut query = QueryDescriptor::new(app.clone());
    sources_and_sinks(&mut query)?;
    let err = query
        .exists_clause(reachability(&app), |flow| {
            flow.source("src").barrier("missing").sink("snk").r#as("f")
        })
        .await
        .expect_err("barrier alias unknown");
    assert!(matches!(err, QvogError::NotFound { kind: "table", .. }));
    assert!(query.tables().has_table("src"));
    assert!(query.tables().has_table("snk"));

    query
        .exists_clause(reachability(&app), |flow| flow.source("src").sink("snk").r#as("f"))
        .await?
        .select(&["f"])
        .await?;
    assert_eq!(query.output()?.rows.len(), 1);
    Ok(())
}

#[tokio::test]
async fn evicted_nodes_render_as_their_kind() -> Result<()> {
    let logs = SharedBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _logging = tracing::subscriber::set_default(subscriber);

    let mut options = DatabaseOptions::default();
    options.cache.capacity = Some(1);
    let app = AppContext::new(options, Arc::new(taint_store()?), toy_language())?;
    let mut query = QueryDescriptor::new(app);
    query.from_clause(|f| f.with_data(ValuePredicate::identifier("Assign")).r#as("a"))?;
    query.select(&["a"]).await?;

    let output = query.output()?;
    assert_eq!(
        output.rows,
        vec![vec!["Assign".to_string()], vec![format!("({FILE}:2) y = x")]]
    );
    assert!(logs.contents().contains("render.node.missing"));
    Ok(())
}

#[tokio::test]
async fn take_leaves_an_empty_query() -> Result<()> {
    let app = taint_app()?;
    let mut query = QueryDescriptor::new(app);
    query.from_clause(|f| f.with_data(ValuePredicate::any()).r#as("a"))?;
    let mut moved = query.take();
    assert_eq!(moved.last_alias(), Some("a"));
    assert_eq!(query.last_alias(), None);
    moved.select(&["a"]).await?;
    assert_eq!(moved.result()?.size(), 4);
    Ok(())
}
