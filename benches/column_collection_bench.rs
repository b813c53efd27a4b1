//! Column collection benchmark.
//!
//! Measures append and dedupe-on-add construction, keyed and positional
//! reads, replacement churn, and the cost of freezing a view over a live
//! collection.
//!
//! Pre-generated columns are reused via clone() in setup to avoid
//! regeneration overhead and ensure consistent benchmark data across
//! iterations.

use colonnade::collection::{ColumnCollection, UniqueColumnCollection};
use colonnade::column::{ColumnRef, Keyed, SimpleColumn, column};
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

const SIZES: [usize; 3] = [16, 256, 4096];

/// Pre-generates columns with distinct keys.
fn generate_columns(size: usize) -> Vec<ColumnRef<SimpleColumn>> {
    (0..size)
        .map(|index| column(format!("column_{index}")))
        .collect()
}

/// Pre-generates columns where every key occurs twice.
fn generate_colliding_columns(size: usize) -> Vec<ColumnRef<SimpleColumn>> {
    let keys = (size / 2).max(1);
    (0..size)
        .map(|index| column(format!("column_{}", index % keys)))
        .collect()
}

/// Returns the appropriate BatchSize based on input size.
fn batch_size_for(size: usize) -> BatchSize {
    if size < 1000 {
        BatchSize::SmallInput
    } else {
        BatchSize::LargeInput
    }
}

// =============================================================================
// 1. Construction
// =============================================================================

fn benchmark_lenient_append(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("column_collection_append");

    for size in SIZES {
        let base = generate_columns(size);
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &size,
            |bencher, &size| {
                bencher.iter_batched(
                    || base.clone(),
                    |columns| {
                        let collection = ColumnCollection::new();
                        for column in columns {
                            collection.add(black_box(column));
                        }
                        black_box(collection)
                    },
                    batch_size_for(size),
                );
            },
        );
    }

    group.finish();
}

fn benchmark_dedupe_add(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("unique_collection_dedupe_add");

    for size in SIZES {
        let base = generate_colliding_columns(size);
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &size,
            |bencher, &size| {
                bencher.iter_batched(
                    || base.clone(),
                    |columns| {
                        let collection = UniqueColumnCollection::new();
                        for column in columns {
                            collection.add(black_box(column));
                        }
                        black_box(collection)
                    },
                    batch_size_for(size),
                );
            },
        );
    }

    group.finish();
}

// =============================================================================
// 2. Reads
// =============================================================================

fn benchmark_keyed_lookup(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("column_collection_keyed_lookup");

    for size in SIZES {
        let collection = ColumnCollection::new();
        collection.extend(generate_columns(size));
        let key = format!("column_{}", size / 2);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bencher, _| {
            bencher.iter(|| black_box(collection.get(black_box(&key))));
        });
    }

    group.finish();
}

fn benchmark_positional_scan(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("column_collection_positional_scan");

    for size in SIZES {
        let collection = ColumnCollection::new();
        collection.extend(generate_columns(size));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bencher, &size| {
            bencher.iter(|| {
                let mut total = 0usize;
                for position in 0..size {
                    if let Some(column) = collection.get_index(black_box(position)) {
                        total += column.key().len();
                    }
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

// =============================================================================
// 3. Replacement churn
// =============================================================================

fn benchmark_replace(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("unique_collection_replace");

    for size in SIZES {
        let base = generate_columns(size);
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &size,
            |bencher, &size| {
                bencher.iter_batched(
                    || {
                        let collection = UniqueColumnCollection::new();
                        collection.extend(base.clone());
                        // same key as the middle column, fresh instance
                        (collection, column(format!("column_{}", size / 2)))
                    },
                    |(collection, replacement)| {
                        collection.replace(black_box(replacement));
                        black_box(collection)
                    },
                    batch_size_for(size),
                );
            },
        );
    }

    group.finish();
}

// =============================================================================
// 4. Frozen views
// =============================================================================

fn benchmark_freeze_and_scan(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("immutable_view_freeze_and_scan");

    for size in SIZES {
        let collection = UniqueColumnCollection::new();
        collection.extend(generate_columns(size));

        group.bench_with_input(BenchmarkId::new("freeze", size), &size, |bencher, _| {
            bencher.iter(|| black_box(collection.as_immutable().len()));
        });

        let view = collection.as_immutable();
        group.bench_with_input(BenchmarkId::new("scan", size), &size, |bencher, _| {
            bencher.iter(|| {
                let mut total = 0usize;
                for column in view.iter() {
                    total += column.key().len();
                }
                black_box(total)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_lenient_append,
    benchmark_dedupe_add,
    benchmark_keyed_lookup,
    benchmark_positional_scan,
    benchmark_replace,
    benchmark_freeze_and_scan
);

criterion_main!(benches);
