//! Criterion benchmarks for data-type negotiation and validation.
//!
//! Negotiation runs once per drop-target phase, so it sits on the hot path of
//! every drag-over round trip.
//!
//! Run with:
//! ```bash
//! cargo bench --package dnd-core --bench negotiate_bench
//! ```

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dnd_core::domain::operation::{check_operation, Operation};
use dnd_core::domain::transfer::{
    check_data_type, determine_data_types, ByteArrayTransfer, FileTransfer, HtmlTransfer,
    TextTransfer, Transfer, TransferData, UrlTransfer, TEXT_TYPE,
};

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn builtin_transfers() -> Vec<Arc<dyn Transfer>> {
    vec![
        Arc::new(TextTransfer),
        Arc::new(HtmlTransfer),
        Arc::new(UrlTransfer),
        Arc::new(FileTransfer),
    ]
}

/// The built-in transfers plus `extra` custom byte formats.
fn transfers_with_custom(extra: i32) -> Vec<Arc<dyn Transfer>> {
    let mut transfers = builtin_transfers();
    for id in 0..extra {
        if let Some(custom) = ByteArrayTransfer::new(format!("custom-{id}"), 100 + id) {
            transfers.push(Arc::new(custom));
        }
    }
    transfers
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_determine_data_types(c: &mut Criterion) {
    let mut group = c.benchmark_group("determine_data_types");

    for extra in [0, 4, 16] {
        let source = transfers_with_custom(extra);
        let target = transfers_with_custom(extra);
        group.bench_with_input(BenchmarkId::new("custom_formats", extra), &extra, |b, _| {
            b.iter(|| determine_data_types(black_box(&source), black_box(&target)))
        });
    }

    group.finish();
}

fn bench_check_data_type(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_data_type");
    let valid = determine_data_types(&transfers_with_custom(16), &transfers_with_custom(16));

    group.bench_function("first_candidate", |b| {
        b.iter(|| check_data_type(black_box(Some(TransferData::new(TEXT_TYPE))), black_box(&valid)))
    });
    group.bench_function("unknown_candidate", |b| {
        b.iter(|| check_data_type(black_box(Some(TransferData::new(-7))), black_box(&valid)))
    });

    group.finish();
}

fn bench_check_operation(c: &mut Criterion) {
    c.bench_function("check_operation_all_masks", |b| {
        b.iter(|| {
            let mut acc = 0;
            for allowed in 0..8 {
                for requested in 0..8 {
                    acc ^= check_operation(
                        black_box(Operation::from_bits(allowed)),
                        black_box(Operation::from_bits(requested)),
                    )
                    .bits();
                }
            }
            acc
        })
    });
}

criterion_group!(
    benches,
    bench_determine_data_types,
    bench_check_data_type,
    bench_check_operation
);
criterion_main!(benches);
