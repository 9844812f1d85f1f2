mod common;

use common::{chain, children, id, load_page, op, PAGE};
use serde_json::json;
use solidoc::consts::{LEAF, PARAGRAPH, TEXT};
use solidoc::Error;

#[test]
fn test_load_fixture() {
    let page = load_page();
    assert_eq!(children(&page, PAGE), vec![id("b0"), id("b1")]);
    assert_eq!(children(&page, &id("b0")), vec![id("l0"), id("l1")]);
    assert!(matches!(
        page.get_subject(&id("c0")),
        Err(Error::SubjectNotFound(_))
    ));
    let rep = page.to_representation().unwrap();
    assert_eq!(rep["title"], json!("Page 1"));
    assert_eq!(rep["children"][0]["align"], json!("left"));
    assert_eq!(rep["children"][1]["children"][0]["text"], json!("second"));
}

#[test]
fn test_pristine_page_has_no_diff() {
    let mut page = load_page();
    page.update().unwrap();
    assert_eq!(page.update_statement().unwrap(), "");
}

#[test]
fn test_move_forward_within_parent() {
    let mut page = load_page();
    page.apply(&op(json!({"type": "move_node", "path": [0], "new_path": [2]})))
        .unwrap();
    assert_eq!(children(&page, PAGE), vec![id("b1"), id("b0")]);
    page.update().unwrap();
    assert_eq!(chain(&page, PAGE), vec![id("b1"), id("b0")]);
}

#[test]
fn test_move_backward_within_parent() {
    let mut page = load_page();
    page.apply(&op(json!({"type": "move_node", "path": [1], "new_path": [0]})))
        .unwrap();
    assert_eq!(children(&page, PAGE), vec![id("b1"), id("b0")]);
    assert_eq!(chain(&page, PAGE), vec![id("b1"), id("b0")]);
}

#[test]
fn test_move_across_parents() {
    let mut page = load_page();
    page.apply(&op(json!({"type": "move_node", "path": [0, 1], "new_path": [1, 0]})))
        .unwrap();
    assert_eq!(children(&page, &id("b0")), vec![id("l0")]);
    assert_eq!(children(&page, &id("b1")), vec![id("l1"), id("l2")]);
    assert_eq!(chain(&page, &id("b1")), vec![id("l1"), id("l2")]);
    let next = page.get_subject(&id("l0")).unwrap().next();
    assert_eq!(next, None);
}

#[test]
fn test_cyclic_move_leaves_the_page_unchanged() {
    let mut page = load_page();
    let before = page.to_representation().unwrap();
    let result = page.apply(&op(json!({"type": "move_node", "path": [0], "new_path": [0, 1]})));
    assert!(matches!(result, Err(Error::CyclicMove { .. })));
    assert_eq!(page.to_representation().unwrap(), before);
    assert_eq!(chain(&page, PAGE), vec![id("b0"), id("b1")]);
    assert_eq!(page.update_statement().unwrap(), "");
}

#[test]
fn test_split_leaf() {
    let mut page = load_page();
    page.apply(&op(json!({
        "type": "split_node",
        "path": [0, 0],
        "position": 3,
        "properties": {"id": id("x")},
    })))
    .unwrap();
    assert_eq!(children(&page, &id("b0")), vec![id("l0"), id("x"), id("l1")]);
    assert_eq!(page.get_subject(&id("l0")).unwrap().text(), Some("hel"));
    let x = page.get_subject(&id("x")).unwrap();
    assert_eq!(x.text(), Some("lo"));
    assert!(x.is_inserted());
    assert_eq!(
        page.get_subject(&id("l0")).unwrap().next(),
        Some(id("x").as_str())
    );
    assert_eq!(x.next(), Some(id("l1").as_str()));

    let sparql = page.update_statement().unwrap();
    assert!(sparql.contains(&format!(
        "INSERT DATA {{ GRAPH <{}> {{ <{}> <{}> \"lo\"}} }};\n",
        PAGE,
        id("x"),
        TEXT.as_str()
    )));
}

#[test]
fn test_split_with_a_fragment_id() {
    let mut page = load_page();
    page.apply(&op(json!({
        "type": "split_node",
        "path": [0, 0],
        "position": 3,
        "properties": {"id": "x"},
    })))
    .unwrap();
    assert_eq!(children(&page, &id("b0")), vec![id("l0"), id("x"), id("l1")]);
    assert_eq!(page.get_subject(&id("x")).unwrap().text(), Some("lo"));
    assert_eq!(chain(&page, &id("b0")), vec![id("l0"), id("x"), id("l1")]);
    page.apply(&op(json!({
        "type": "set_node",
        "path": [0, 1],
        "properties": {"id": "x", "bold": true},
    })))
    .unwrap();
}

#[test]
fn test_split_branch() {
    let mut page = load_page();
    page.apply(&op(json!({
        "type": "split_node",
        "path": [0],
        "position": 1,
        "properties": {"id": id("b2")},
    })))
    .unwrap();
    assert_eq!(children(&page, PAGE), vec![id("b0"), id("b2"), id("b1")]);
    assert_eq!(children(&page, &id("b0")), vec![id("l0")]);
    assert_eq!(children(&page, &id("b2")), vec![id("l1")]);
    // the copy keeps the options of the original
    let rep = page.to_representation().unwrap();
    assert_eq!(rep["children"][1]["align"], json!("left"));
    assert_eq!(chain(&page, PAGE), vec![id("b0"), id("b2"), id("b1")]);
}

#[test]
fn test_merge_branches() {
    let mut page = load_page();
    page.apply(&op(json!({"type": "merge_node", "path": [0]})))
        .unwrap();
    assert_eq!(
        children(&page, &id("b0")),
        vec![id("l0"), id("l1"), id("l2")]
    );
    assert_eq!(chain(&page, &id("b0")), vec![id("l0"), id("l1"), id("l2")]);
    assert_eq!(children(&page, PAGE), vec![id("b0")]);
    assert!(page.get_subject(&id("b1")).unwrap().is_deleted());
    assert!(!page.get_subject(&id("l2")).unwrap().is_deleted());

    page.commit().unwrap();
    assert!(matches!(
        page.get_subject(&id("b1")),
        Err(Error::SubjectNotFound(_))
    ));
    assert_eq!(page.update_statement().unwrap(), "");
}

#[test]
fn test_merge_leaves() {
    let mut page = load_page();
    page.apply(&op(json!({"type": "merge_node", "path": [0, 0]})))
        .unwrap();
    assert_eq!(
        page.get_subject(&id("l0")).unwrap().text(),
        Some("hello world")
    );
    assert_eq!(children(&page, &id("b0")), vec![id("l0")]);
    assert!(page.get_subject(&id("l1")).unwrap().is_deleted());
}

#[test]
fn test_merge_without_next_sibling_is_a_no_op() {
    let mut page = load_page();
    page.apply(&op(json!({"type": "merge_node", "path": [1]})))
        .unwrap();
    assert_eq!(page.update_statement().unwrap(), "");
}

#[test]
fn test_insert_and_remove_nodes() {
    let mut page = load_page();
    page.apply(&op(json!({
        "type": "insert_node",
        "path": [1],
        "node": {
            "id": id("n0"),
            "type": PARAGRAPH.as_str(),
            "children": [
                {"id": id("n1"), "type": LEAF.as_str(), "text": "new"},
                {"id": id("n2"), "type": LEAF.as_str(), "text": "nodes"},
            ],
        },
    })))
    .unwrap();
    assert_eq!(children(&page, PAGE), vec![id("b0"), id("n0"), id("b1")]);
    assert_eq!(chain(&page, &id("n0")), vec![id("n1"), id("n2")]);

    page.apply(&op(json!({"type": "remove_node", "path": [0]})))
        .unwrap();
    assert_eq!(children(&page, PAGE), vec![id("n0"), id("b1")]);
    for name in ["b0", "l0", "l1"] {
        assert!(page.get_subject(&id(name)).unwrap().is_deleted());
    }
    page.commit().unwrap();
    assert_eq!(page.graph().len(), 6);
}

#[test]
fn test_text_operations() {
    let mut page = load_page();
    page.apply_all(&[
        op(json!({"type": "insert_text", "path": [0, 0], "offset": 5, "text": ","})),
        op(json!({"type": "remove_text", "path": [0, 1], "offset": 0, "text": " "})),
    ])
    .unwrap();
    assert_eq!(page.get_subject(&id("l0")).unwrap().text(), Some("hello,"));
    assert_eq!(page.get_subject(&id("l1")).unwrap().text(), Some("world"));

    let result = page.apply(&op(json!({"type": "insert_text", "path": [0], "offset": 0, "text": "x"})));
    assert!(matches!(result, Err(Error::NodeKind { .. })));
    // the failed apply reverted the earlier text edits too
    assert_eq!(page.get_subject(&id("l0")).unwrap().text(), Some("hello"));
}

#[test]
fn test_set_node_merges_options() {
    let mut page = load_page();
    page.apply(&op(json!({
        "type": "set_node",
        "path": [0],
        "properties": {"bold": true, "align": "right"},
    })))
    .unwrap();
    let sparql = page.update_statement().unwrap();
    assert_eq!(
        sparql,
        format!(
            "DELETE WHERE {{ GRAPH <{g}> {{ <{s}> <http://www.solidoc.net/ontologies#options> ?o }} }};\n\
             INSERT DATA {{ GRAPH <{g}> {{ <{s}> <http://www.solidoc.net/ontologies#options> \"{{\\\"align\\\":\\\"right\\\",\\\"bold\\\":true}}\"}} }};\n",
            g = PAGE,
            s = id("b0")
        )
    );
}

#[test]
fn test_failed_apply_rolls_back_created_subjects() {
    let mut page = load_page();
    let result = page.apply(&op(json!({
        "type": "insert_node",
        "path": [0],
        "node": {
            "id": id("n0"),
            "type": PARAGRAPH.as_str(),
            "children": [{"id": id("l0"), "type": LEAF.as_str(), "text": "duplicate"}],
        },
    })));
    assert!(matches!(result, Err(Error::DuplicateSubject(_))));
    assert!(matches!(
        page.get_subject(&id("n0")),
        Err(Error::SubjectNotFound(_))
    ));
    assert_eq!(page.get_subject(&id("l0")).unwrap().text(), Some("hello"));

    let result = page.apply(&op(json!({"type": "remove_node", "path": [9, 9]})));
    assert!(matches!(result, Err(Error::PathNotFound(_))));
    let result = page.apply(&op(json!({"type": "remove_node", "path": []})));
    assert!(matches!(result, Err(Error::InvalidPath(_))));
    assert_eq!(page.update_statement().unwrap(), "");
}

#[test]
fn test_commit_is_idempotent() {
    let mut page = load_page();
    page.apply(&op(json!({"type": "insert_text", "path": [1, 0], "offset": 0, "text": "the "})))
        .unwrap();
    assert!(!page.update_statement().unwrap().is_empty());
    page.commit().unwrap();
    let after_first = page.to_representation().unwrap();
    assert_eq!(page.update_statement().unwrap(), "");
    page.commit().unwrap();
    assert_eq!(page.to_representation().unwrap(), after_first);
    assert_eq!(page.update_statement().unwrap(), "");
}

#[test]
fn test_statements_are_deterministic() {
    let ops = vec![
        op(json!({"type": "split_node", "path": [0, 0], "position": 2, "properties": {"id": id("s0")}})),
        op(json!({"type": "move_node", "path": [1], "new_path": [0]})),
        op(json!({"type": "set_node", "path": [0], "properties": {"indent": 2}})),
        op(json!({"type": "merge_node", "path": [0]})),
    ];
    let mut first = load_page();
    let mut second = load_page();
    first.apply_all(&ops).unwrap();
    second.apply_all(&ops).unwrap();
    let sparql = first.update_statement().unwrap();
    assert!(!sparql.is_empty());
    assert_eq!(sparql, second.update_statement().unwrap());
}

#[test]
fn test_reinserting_as_another_class_and_undo() {
    let mut page = load_page();
    let before = page.to_representation().unwrap();
    page.apply_all(&[
        op(json!({"type": "remove_node", "path": [1]})),
        op(json!({
            "type": "insert_node",
            "path": [1],
            "node": {"id": id("b1"), "type": LEAF.as_str(), "text": "now a leaf"},
        })),
    ])
    .unwrap();
    let sparql = page.update_statement().unwrap();
    // the stale link to the old children goes away with the old class
    assert!(sparql.contains(&format!(
        "DELETE WHERE {{ GRAPH <{}> {{ <{}> <http://www.solidoc.net/ontologies#firstChild> ?o }} }};\n",
        PAGE,
        id("b1")
    )));
    assert!(sparql.contains(&format!(
        "DELETE WHERE {{ GRAPH <{}> {{ <{}> ?p ?o }} }};\n",
        PAGE,
        id("l2")
    )));

    page.undo().unwrap();
    assert_eq!(page.to_representation().unwrap(), before);
    assert_eq!(page.update_statement().unwrap(), "");
}
