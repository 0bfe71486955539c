//! Benchmarks for tracer export parsing and parameter extraction.

use criterion::{Criterion, criterion_group, criterion_main};
use ivcurve_processor::parameters::extract_all;
use ivcurve_processor::parse_samples;
use std::hint::black_box;

/// Export with `samples` blocks of 200 curve rows each
fn synthetic_export(samples: usize) -> String {
    let mut content = String::from("\u{feff}");
    for n in 1..=samples {
        content.push_str(&format!(
            "\"Sample No.\",\"{n}\"\n\"Date & Time\",\"14-03-2025 12:00\"\n\"Pmax (W)\",\"-------\"\n\"V (V)\",\"I (A)\",\"P (W)\"\n"
        ));
        for step in 0..200 {
            let v = step as f64 * 0.11;
            let i = 5.0 - 5.0 * (v / 22.0).powi(8);
            content.push_str(&format!("{:.3},{:.4},{:.4}\n", v, i, v * i));
        }
        content.push('\n');
    }
    content
}

fn bench_parse(c: &mut Criterion) {
    let content = synthetic_export(50);

    c.bench_function("parse_50_samples", |b| {
        b.iter(|| parse_samples(black_box(&content), "bench.csv"))
    });

    let samples = parse_samples(&content, "bench.csv");
    c.bench_function("extract_50_samples", |b| {
        b.iter(|| extract_all(black_box(&samples)))
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
