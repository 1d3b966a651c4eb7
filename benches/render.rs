//! Compile and render benchmarks
//!
//! Compares cold compiles, cached compiles and renders of prepared
//! templates over inputs of growing size.
//!
//! Run with: cargo bench --bench render

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ejs::{cache, Compiler, HelperSet, Renderer, Value};
use serde_json::json;

// ============================================================================
// Test Data
// ============================================================================

mod data {
    pub const SMALL: &str = "Hello <%= name %>!";

    pub fn listing(rows: usize) -> String {
        let mut source = String::from("<table>\n");
        for _ in 0..rows {
            source.push_str("<% for row in rows { %>\n");
            source.push_str("  <tr><td><%= row.id %></td><td><%= to_text(row.note) %></td></tr>\n");
            source.push_str("<% } %>\n");
        }
        source.push_str("</table>\n");
        source
    }

    pub fn rows(n: usize) -> serde_json::Value {
        let rows: Vec<_> = (0..n)
            .map(|i| serde_json::json!({ "id": i, "note": format!("note {}\nline two", i) }))
            .collect();
        serde_json::json!({ "rows": rows, "name": "bench" })
    }
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for blocks in [1usize, 10, 100] {
        let source = data::listing(blocks);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("cold", blocks), &source, |b, input| {
            b.iter(|| Compiler::new(black_box(input.as_str()), '<').unwrap().compile())
        });
    }

    group.bench_function("cached", |b| {
        cache::clear_cache();
        b.iter(|| cache::get_or_compile(black_box(data::SMALL), '<'))
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    let small = Renderer::new(ejs::compile(data::SMALL).unwrap());
    let small_data = Value::from(json!({ "name": "World" }));
    group.bench_function("small", |b| {
        b.iter(|| small.render(black_box(&small_data), &HelperSet::new()))
    });

    let listing = Renderer::new(ejs::compile(&data::listing(1)).unwrap());
    for rows in [10usize, 100, 1000] {
        let input = Value::from(data::rows(rows));
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::new("listing", rows), &input, |b, input| {
            b.iter(|| listing.render(black_box(input), &HelperSet::new()))
        });
    }

    group.finish();
}

fn bench_nested_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("view");

    let outer = Renderer::new(ejs::compile("<% for row in rows { %><%= view(inner, row) %><% } %>").unwrap());
    let mut input = data::rows(100);
    input["inner"] = json!("[<%= id %>]");
    let input = Value::from(input);
    group.bench_function("100_rows", |b| {
        b.iter(|| outer.render(black_box(&input), &HelperSet::new()))
    });

    group.finish();
}

criterion_group!(benches, bench_compile, bench_render, bench_nested_view);
criterion_main!(benches);
