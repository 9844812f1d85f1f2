use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value as JsonValue};
use solidoc::consts::{LEAF, PARAGRAPH, ROOT};
use solidoc::{Ontology, Operation, Page};
use std::sync::Arc;

const PAGE: &str = "http://example.org/bench/page";

/// A page of `n_paragraphs` paragraphs holding `leaves` leaves each
fn generate_page(n_paragraphs: usize, leaves: usize) -> JsonValue {
    let children: Vec<JsonValue> = (0..n_paragraphs)
        .map(|p| {
            let leaves: Vec<JsonValue> = (0..leaves)
                .map(|l| {
                    json!({
                        "id": format!("{PAGE}#l{p}_{l}"),
                        "type": LEAF.as_str(),
                        "text": format!("paragraph {p} leaf {l}"),
                    })
                })
                .collect();
            json!({
                "id": format!("{PAGE}#p{p}"),
                "type": PARAGRAPH.as_str(),
                "align": if p % 2 == 0 { "left" } else { "right" },
                "children": leaves,
            })
        })
        .collect();
    json!({"id": PAGE, "type": ROOT.as_str(), "title": "bench", "children": children})
}

/// The committed triples of a generated page as Turtle
fn generate_turtle(n_paragraphs: usize, leaves: usize) -> String {
    let mut turtle = String::from("@prefix sdoc: <http://www.solidoc.net/ontologies#> .\n");
    turtle += &format!("<{PAGE}> sdoc:firstChild <#p0> .\n");
    for p in 0..n_paragraphs {
        turtle += &format!("<#p{p}> a sdoc:Paragraph ; sdoc:firstChild <#l{p}_0>");
        if p + 1 < n_paragraphs {
            turtle += &format!(" ; sdoc:nextNode <#p{}>", p + 1);
        }
        turtle += " .\n";
        for l in 0..leaves {
            turtle += &format!("<#l{p}_{l}> a sdoc:Leaf ; sdoc:text \"leaf {l}\"");
            if l + 1 < leaves {
                turtle += &format!(" ; sdoc:nextNode <#l{p}_{}>", l + 1);
            }
            turtle += " .\n";
        }
    }
    turtle
}

fn text_edits(n_paragraphs: usize) -> Vec<Operation> {
    (0..n_paragraphs)
        .map(|p| {
            serde_json::from_value(json!({
                "type": "insert_text",
                "path": [p, 0],
                "offset": 4,
                "text": "edited ",
            }))
            .unwrap()
        })
        .collect()
}

fn bench_from_turtle(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_turtle");
    let ontology = Arc::new(Ontology::default());
    for n in [10, 100, 1_000] {
        let turtle = generate_turtle(n, 5);
        group.throughput(Throughput::Elements((n * 6) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &turtle, |b, turtle| {
            b.iter(|| Page::from_turtle(PAGE, ontology.clone(), turtle).unwrap());
        });
    }
    group.finish();
}

fn bench_from_representation(c: &mut Criterion) {
    let mut group = c.benchmark_group("from_representation");
    let ontology = Arc::new(Ontology::default());
    for n in [10, 100, 1_000] {
        let rep = generate_page(n, 5);
        group.throughput(Throughput::Elements((n * 6) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &rep, |b, rep| {
            b.iter(|| Page::from_representation(rep, ontology.clone()).unwrap());
        });
    }
    group.finish();
}

fn bench_apply_and_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_and_diff");
    let ontology = Arc::new(Ontology::default());
    for n in [10, 100, 1_000] {
        let mut page = Page::from_representation(&generate_page(n, 5), ontology.clone()).unwrap();
        page.commit().unwrap();
        let ops = text_edits(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &ops, |b, ops| {
            b.iter(|| {
                let mut page = page.clone();
                page.apply_all(ops).unwrap();
                page.update_statement().unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_from_turtle,
    bench_from_representation,
    bench_apply_and_diff
);
criterion_main!(benches);
