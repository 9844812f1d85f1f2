#![allow(dead_code)]

use serde_json::Value as JsonValue;
use solidoc::util::read_file;
use solidoc::{Ontology, Operation, Page};
use std::path::Path;
use std::sync::Arc;

pub const PAGE: &str = "http://example.org/alice/docs/page1";

pub fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn id(name: &str) -> String {
    format!("{}#{}", PAGE, name)
}

/// The fixture page: a root titled "Page 1" holding `b0[l0 "hello", l1 " world"]`
/// and `b1[l2 "second"]`
pub fn load_page() -> Page {
    setup();
    let triples = read_file(Path::new("fixtures/page1.ttl"), Some(PAGE)).unwrap();
    Page::from_triples(PAGE, Arc::new(Ontology::default()), &triples).unwrap()
}

pub fn op(value: JsonValue) -> Operation {
    serde_json::from_value(value).unwrap()
}

pub fn children(page: &Page, id: &str) -> Vec<String> {
    page.graph().children(id).unwrap().to_vec()
}

/// Follows `firstChild` and `next` from a branch
pub fn chain(page: &Page, id: &str) -> Vec<String> {
    let mut out = vec![];
    let mut curr = page.get_subject(id).unwrap().first_child();
    while let Some(child) = curr {
        out.push(child.to_string());
        curr = page.get_subject(child).unwrap().next();
    }
    out
}
