#![allow(missing_docs)]

mod support;

use std::sync::Arc;

use qvog::graph::{ValueExt, Vertex, CODE_LABEL, INVALID_IDENTIFIER};
use qvog::query::{GraphFilter, ValuePredicate};
use qvog::store::InMemoryGraphStore;
use qvog::types::{QvogError, Result, VertexId};

use support::{
    app_with, app_with_batch, calls, code_vertex, named, numbered_store, taint_store,
    RecordingStore, SharedBuffer, FILE,
};

#[tokio::test]
async fn pages_through_the_vertex_space() -> Result<()> {
    let store = Arc::new(RecordingStore::new(numbered_store(2500)?));
    let app = app_with_batch(store.clone(), 1000)?;
    let mut filter = GraphFilter::new(app);
    filter.add_action("all", ValuePredicate::any())?;

    let tables = filter.filter().await?;
    assert_eq!(
        store.requests(),
        vec![(0, 1000), (1000, 1000), (2000, 500), (2500, 0)]
    );
    assert_eq!(tables.table("all")?.size(), 2500);
    Ok(())
}

#[tokio::test]
async fn one_vertex_can_land_in_several_tables() -> Result<()> {
    let app = app_with(Arc::new(taint_store()?))?;
    let mut filter = GraphFilter::new(app.clone());
    filter.add_action("sources", ValuePredicate::contains(calls("source")))?;
    filter.add_action("assigns", ValuePredicate::identifier("Assign"))?;
    filter.add_action("x", ValuePredicate::contains(named("Name", "x")))?;

    let tables = filter.filter().await?;
    assert_eq!(tables.len(), 3);
    assert_eq!(tables.table("sources")?.size(), 1);
    assert_eq!(tables.table("assigns")?.size(), 2);
    assert_eq!(tables.table("x")?.size(), 2);

    let source = tables.table("sources")?.as_column()?.value(0)?.clone();
    let value = source.as_value().expect("value cell");
    assert_eq!(value.id()?, VertexId(1));
    assert!(tables.table("assigns")?.as_column()?.contains_value(&source));
    Ok(())
}

#[tokio::test]
async fn only_matching_vertices_are_registered() -> Result<()> {
    let app = app_with(Arc::new(taint_store()?))?;
    let mut filter = GraphFilter::new(app.clone());
    filter.add_action("sinks", ValuePredicate::contains(calls("sink")))?;
    filter.filter().await?;

    let graph = app.graph();
    assert_eq!(graph.len(), 1);
    assert!(graph.contains(VertexId(3)));
    assert!(!graph.contains(VertexId(1)));
    Ok(())
}

#[tokio::test]
async fn node_predicates_see_the_vertex_being_scanned() -> Result<()> {
    let app = app_with(Arc::new(taint_store()?))?;
    let mut filter = GraphFilter::new(app.clone());
    filter.add_action(
        "line1",
        ValuePredicate::code(Arc::clone(app.graph()), |code| code.lineno == 1),
    )?;
    filter.add_action(
        "code",
        ValuePredicate::node(Arc::clone(app.graph()), |node| node.as_code().is_some()),
    )?;
    filter.add_action(
        "in_main",
        ValuePredicate::code(Arc::clone(app.graph()), |code| code.file == FILE)
            .and(ValuePredicate::contains(calls("sink"))),
    )?;

    let tables = filter.filter().await?;
    assert_eq!(tables.table("line1")?.size(), 1);
    assert_eq!(tables.table("code")?.size(), 3);
    assert_eq!(tables.table("in_main")?.size(), 1);
    assert_eq!(app.graph().len(), 3, "file vertex matched nothing");
    Ok(())
}

#[tokio::test]
async fn rejected_page_ends_the_scan() -> Result<()> {
    let store = Arc::new(RecordingStore::failing_at(numbered_store(2500)?, 1000));
    let app = app_with_batch(store.clone(), 1000)?;
    let mut filter = GraphFilter::new(app);
    filter.add_action("all", ValuePredicate::any())?;

    let tables = filter.filter().await?;
    assert_eq!(store.requests(), vec![(0, 1000), (1000, 0)]);
    assert_eq!(tables.table("all")?.size(), 1000);
    Ok(())
}

#[tokio::test]
async fn unparsable_ast_does_not_stop_the_scan() -> Result<()> {
    let mut store = InMemoryGraphStore::new();
    store.add_vertex(code_vertex(1, 1, "x = f()", &support::assign("x", support::call("f", vec![]))))?;
    store.add_vertex(
        Vertex::new(2, CODE_LABEL)
            .with_property("lineno", "2")
            .with_property("code", "x = (")
            .with_property("file", FILE)
            .with_property("json", "{not json"),
    )?;
    store.add_vertex(code_vertex(3, 3, "y = g()", &support::assign("y", support::call("g", vec![]))))?;
    store.add_vertex(Vertex::new(4, "comment"))?;
    let app = app_with(Arc::new(store))?;

    let logs = SharedBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _logging = tracing::subscriber::set_default(subscriber);

    let mut filter = GraphFilter::new(app.clone());
    filter.add_action("all", ValuePredicate::any())?;
    let tables = filter.filter().await?;

    let logged = logs.contents();
    assert!(logged.contains("context.ast.parse_failed"), "{logged}");
    assert!(logged.contains("scan.vertex.skipped"), "{logged}");

    let all = tables.table("all")?;
    assert_eq!(all.size(), 3, "unknown label skipped, placeholder kept");
    let broken = app.graph().get_value(VertexId(2))?;
    assert_eq!(broken.identifier(), INVALID_IDENTIFIER);
    assert_eq!(broken.stream().count(), 1);
    Ok(())
}

#[tokio::test]
async fn aliases_are_unique_per_scan() -> Result<()> {
    let app = app_with(Arc::new(taint_store()?))?;
    let mut filter = GraphFilter::new(app).with_batch_size(0);
    assert_eq!(filter.batch_size(), 1);
    filter.add_action("a", ValuePredicate::any())?;
    let err = filter
        .add_action("a", ValuePredicate::none())
        .expect_err("duplicate alias");
    assert!(matches!(err, QvogError::DuplicateName { kind: "table", .. }));
    assert!(filter.has_action("a"));
    Ok(())
}
