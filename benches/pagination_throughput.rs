//! Pagination and export throughput benchmarks
//!
//! Measures a grouped tabular report with varying:
//! - Row counts (10, 100, 1000, 10000)
//! - Generation modes (full pipeline, streaming fast path)
//! - Batch sizes (independent reports rendered side by side)
//!
//! Run benchmarks: `cargo bench --bench pagination_throughput`
//!
//! Compare specific groups:
//! ```
//! cargo bench --bench pagination_throughput -- "generation_mode"
//! cargo bench --bench pagination_throughput -- "batch"
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use quire::batch::{BatchEntry, render_all};
use quire::data::{DefaultTableModel, InMemoryDataCache, Parameters};
use quire::engine::CountingSink;
use quire::{
    CsvContentWriter, EngineConfig, GenerationMode, ReportDefinition, ReportProcessor,
    TabularReport,
};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

/// Generate test data records
fn generate_records(count: usize) -> Vec<serde_json::Value> {
    (0..count)
        .map(|i| {
            json!({
                "region": ["East", "North", "West"][i * 3 / count.max(1)],
                "id": i,
                "name": format!("Record {}", i),
                "value": i * 100
            })
        })
        .collect()
}

fn report(count: usize, page_numbers: bool) -> ReportDefinition {
    let table = DefaultTableModel::from_json_rows(&generate_records(count))
        .expect("Failed to build table");
    TabularReport::new("Benchmark")
        .group_by("region")
        .page_numbers(page_numbers)
        .build(table)
}

/// Benchmark pagination throughput with varying row counts
fn benchmark_pagination(c: &mut Criterion) {
    let mut group = c.benchmark_group("pagination_throughput");
    let processor = ReportProcessor::default();

    for count in [10, 100, 1000, 10000] {
        group.throughput(Throughput::Elements(count as u64));
        let report = report(count, true);

        group.bench_with_input(BenchmarkId::new("rows", count), &report, |b, report| {
            b.iter(|| {
                let mut sink = CountingSink::default();
                let outcome = processor.process(
                    report,
                    &Parameters::new(),
                    Arc::new(InMemoryDataCache::new()),
                    &mut sink,
                );
                assert!(outcome.succeeded);
                black_box(sink.boxes)
            });
        });
    }
    group.finish();
}

/// Compare the full pipeline against the streaming fast path
fn benchmark_generation_mode(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation_mode");
    let count = 5000;
    group.throughput(Throughput::Elements(count as u64));
    let report = report(count, false);

    for (name, mode) in [
        ("full", GenerationMode::ForceFull),
        ("streaming", GenerationMode::ForceStreaming),
    ] {
        let processor = ReportProcessor::new(EngineConfig::builder().generation_mode(mode).build());
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut writer = CsvContentWriter::new(Vec::with_capacity(count * 32));
                processor
                    .export(
                        &report,
                        &Parameters::new(),
                        Arc::new(InMemoryDataCache::new()),
                        &mut writer,
                    )
                    .into_result()
                    .expect("Export failed");
                black_box(writer.into_inner().expect("Flush failed").len())
            });
        });
    }
    group.finish();
}

/// Benchmark batches of independent reports
fn benchmark_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let processor = ReportProcessor::default();
    let single = Arc::new(report(500, true));

    for size in [1, 4, 16] {
        let entries: Vec<BatchEntry> = (0..size)
            .map(|_| BatchEntry::new(single.clone(), Parameters::new()))
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("reports", size), &entries, |b, entries| {
            b.iter(|| black_box(render_all(&processor, entries).len()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_pagination,
    benchmark_generation_mode,
    benchmark_batch
);
criterion_main!(benches);
