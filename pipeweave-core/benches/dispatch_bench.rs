//! Criterion benchmarks for pipeweave hot paths.
//!
//! Benchmarks:
//! 1. Per-item dispatch split (derived field resolution)
//! 2. Cross-rate resolution through the USD pivot
//! 3. A full blocking stage invocation over a batch of items

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pipeweave_core::data::{
    cross_rate, FallbackFetcher, RateService, RateTable, SnapshotSource, HALF_DAY,
};
use pipeweave_core::domain::{FieldSpec, Item, StageConfig};
use pipeweave_core::engine::{run_blocking, split_item, SplitSpec};
use pipeweave_core::stages::ExchangeRate;
use std::sync::Arc;

fn reference_table() -> RateTable {
    [
        ("USD/USD".to_string(), 1.0),
        ("USD/EUR".to_string(), 0.8234),
        ("USD/GBP".to_string(), 0.6448),
        ("USD/INR".to_string(), 63.6810),
        ("USD/PLN".to_string(), 3.76),
        ("USD/SGD".to_string(), 1.34),
    ]
    .into_iter()
    .collect()
}

fn make_items(n: usize) -> Vec<Item> {
    let codes = ["EUR", "GBP", "INR", "PLN", "SGD"];
    (0..n)
        .map(|i| Item::new().with("currency", codes[i % codes.len()]))
        .collect()
}

fn bench_split_item(c: &mut Criterion) {
    let spec = SplitSpec::new(FieldSpec::derived_or("currency", "USD"));
    let item = Item::new().with("currency", "EUR").with("amount", 10);

    c.bench_function("dispatch/split_item", |b| {
        b.iter(|| split_item(black_box(&item), black_box(&spec)))
    });
}

fn bench_cross_rate(c: &mut Criterion) {
    let table = reference_table();

    c.bench_function("rates/cross_rate", |b| {
        b.iter(|| cross_rate(black_box("EUR"), black_box("GBP"), black_box(&table)))
    });
}

fn bench_stage_invocation(c: &mut Criterion) {
    let service = Arc::new(RateService::new(
        FallbackFetcher::new(
            Box::new(SnapshotSource::bundled()),
            Box::new(SnapshotSource::bundled()),
        ),
        HALF_DAY,
    ));
    let config = StageConfig::new()
        .with("quote", FieldSpec::literal("GBP"))
        .with("offline", FieldSpec::literal(true));
    let stage = ExchangeRate::new(config, service);
    let items = make_items(1_000);

    c.bench_function("executor/exchange_rate_1k_items", |b| {
        b.iter(|| {
            let out: Vec<_> = run_blocking(black_box(&stage), items.clone())
                .unwrap()
                .collect();
            black_box(out)
        })
    });
}

criterion_group!(
    benches,
    bench_split_item,
    bench_cross_rate,
    bench_stage_invocation
);
criterion_main!(benches);
