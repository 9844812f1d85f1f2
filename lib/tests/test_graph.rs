mod common;

use common::{id, setup, PAGE};
use oxigraph::model::NamedNodeRef;
use solidoc::consts::{LEAF, PARAGRAPH};
use solidoc::{Config, Error, Graph, NodeClass, Ontology, PredicateConfig, Value, ValueKind};
use serde_json::json;
use std::sync::Arc;

const AUTHOR: &str = "http://example.org/vocab#author";
const LINK: &str = "http://example.org/vocab#link";

fn ontology() -> Arc<Ontology> {
    let mut config = Config::default();
    config.predicates.push(
        PredicateConfig::new(NamedNodeRef::new_unchecked(AUTHOR), "author", ValueKind::Text)
            .with_domain(&[NodeClass::Root, NodeClass::Branch])
            .with_default("anonymous"),
    );
    config.predicates.push(
        PredicateConfig::new(NamedNodeRef::new_unchecked(LINK), "link", ValueKind::NamedNode)
            .with_domain(&[NodeClass::Branch]),
    );
    Arc::new(Ontology::from_config(&config).unwrap())
}

fn turtle() -> String {
    format!(
        r#"
        @prefix sdoc: <http://www.solidoc.net/ontologies#> .
        @prefix ex: <http://example.org/vocab#> .
        <{page}> sdoc:firstChild <#b0> ; ex:author "alice" .
        <#b0> a sdoc:Paragraph, sdoc:Leaf ; ex:author "anonymous" ; sdoc:firstChild <#l0> .
        <#l0> a sdoc:Leaf ; sdoc:text "hi" ; ex:author "ignored on leaves" .
        _:note a sdoc:Leaf ; sdoc:text "blank nodes are skipped" .
        "#,
        page = PAGE
    )
}

#[test]
fn test_hydration_with_custom_predicates() {
    setup();
    let graph = Graph::from_turtle(PAGE, ontology(), &turtle()).unwrap();
    assert_eq!(graph.len(), 3);
    assert_eq!(graph.get_value(PAGE, "author").unwrap(), Value::text("alice"));
    // stored default reads as the default
    let b0 = graph.get_subject(&id("b0")).unwrap();
    assert_eq!(b0.class(), NodeClass::Branch);
    assert!(!b0.has_working_value(AUTHOR));
    assert_eq!(b0.property("author").unwrap(), &Value::text("anonymous"));
    assert!(matches!(
        graph.get_value(&id("l0"), "author"),
        Err(Error::UnknownPredicate { .. })
    ));
    assert_eq!(graph.update_statement(), "");
}

#[test]
fn test_default_values_are_not_written() {
    setup();
    let mut graph = Graph::from_turtle(PAGE, ontology(), &turtle()).unwrap();
    graph
        .set_value(PAGE, "author", Value::text("anonymous"))
        .unwrap();
    // alice is removed and the default never inserted
    assert_eq!(
        graph.update_statement(),
        format!(
            "DELETE WHERE {{ GRAPH <{p}> {{ <{p}> <{a}> ?o }} }};\n",
            p = PAGE,
            a = AUTHOR
        )
    );
    // a default found in the store is left alone
    graph
        .set_value(&id("b0"), "type", Value::named_node(PARAGRAPH.as_str()))
        .unwrap();
    assert!(!graph.update_statement().contains(&id("b0")));
}

#[test]
fn test_graphs_from_the_same_triples_diff_identically() {
    setup();
    let edit = |graph: &mut Graph| {
        graph.create_subject(&id("l9"), LEAF.as_str()).unwrap();
        graph
            .set_value(&id("l9"), "text", Value::text("new"))
            .unwrap();
        graph
            .set_value(&id("l0"), "text", Value::text("changed"))
            .unwrap();
        graph.delete_subject(&id("b0")).unwrap();
    };
    let mut first = Graph::from_turtle(PAGE, ontology(), &turtle()).unwrap();
    let mut second = Graph::from_turtle(PAGE, ontology(), &turtle()).unwrap();
    edit(&mut first);
    edit(&mut second);
    assert_eq!(first.update_statement(), second.update_statement());
    assert_eq!(
        first.dirty_subjects(),
        &[id("l9"), id("l0"), id("b0")]
    );
}

#[test]
fn test_commit_then_undo_keeps_committed_state() {
    setup();
    let mut graph = Graph::from_turtle(PAGE, ontology(), &turtle()).unwrap();
    graph
        .set_value(&id("l0"), "text", Value::text("committed"))
        .unwrap();
    graph.commit().unwrap();
    graph
        .set_value(&id("l0"), "text", Value::text("discarded"))
        .unwrap();
    graph.undo().unwrap();
    assert_eq!(
        graph.get_subject(&id("l0")).unwrap().text(),
        Some("committed")
    );
    assert!(!graph.is_dirty());
}

#[test]
fn test_named_node_values_cannot_break_out_of_the_statement() {
    setup();
    let mut graph = Graph::from_turtle(PAGE, ontology(), &turtle()).unwrap();
    let props = json!({"link": "x> } }; DROP ALL ; #"});
    let result = graph.set_node(&id("b0"), props.as_object().unwrap());
    assert!(matches!(result, Err(Error::MalformedValue { .. })));
    assert_eq!(graph.update_statement(), "");

    let props = json!({"link": "http://example.org/other"});
    graph.set_node(&id("b0"), props.as_object().unwrap()).unwrap();
    assert_eq!(
        graph.update_statement(),
        format!(
            "INSERT DATA {{ GRAPH <{p}> {{ <{s}> <{l}> <http://example.org/other>}} }};\n",
            p = PAGE,
            s = id("b0"),
            l = LINK
        )
    );
}
