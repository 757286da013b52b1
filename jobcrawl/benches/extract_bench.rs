//! Benchmarks for listing extraction.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jobcrawl::extract::{extract_page, to_plain_text};
use jobcrawl::plan::plan;
use jobcrawl::testing::job_page;

fn extract_benchmark(c: &mut Criterion) {
    let page = job_page(0, 25);
    c.bench_function("extract_page_25_cards", |b| {
        b.iter(|| extract_page(black_box(&page)))
    });

    let fragment = "<script>track()</script><span>Senior &amp; Staff</span>\n  Engineer&nbsp;(Rust)";
    c.bench_function("to_plain_text", |b| b.iter(|| to_plain_text(black_box(fragment))));
}

fn plan_benchmark(c: &mut Criterion) {
    c.bench_function("plan_40_pages", |b| {
        b.iter(|| plan(black_box("https://www.linkedin.com/jobs/search?keywords=rust"), 1000, 25, 40))
    });
}

criterion_group!(benches, extract_benchmark, plan_benchmark);
criterion_main!(benches);
