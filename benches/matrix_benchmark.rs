//! Key matrix benchmark: port reads against concurrent key changes.
//!
//! The core reads a row on every keyboard port access, so reads must stay
//! cheap while the input dispatcher is writing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use speccy_frontend::{KeyMatrix, LogicalKey};

fn row_read_uncontended(c: &mut Criterion) {
    let matrix = KeyMatrix::new();
    matrix.key_down(LogicalKey::A);

    c.bench_function("matrix_row_read_uncontended", |b| {
        b.iter(|| {
            let mut acc = 0u8;
            for row in 0..8 {
                acc ^= matrix.row(black_box(row));
            }
            acc
        });
    });
}

fn row_read_with_writer(c: &mut Criterion) {
    let matrix = Arc::new(KeyMatrix::new());
    let stop = Arc::new(AtomicBool::new(false));

    let writer = {
        let matrix = Arc::clone(&matrix);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let keys: Vec<_> = LogicalKey::all().collect();
            while !stop.load(Ordering::Relaxed) {
                for &key in &keys {
                    matrix.key_down(key);
                    matrix.key_up(key);
                }
            }
        })
    };

    c.bench_function("matrix_row_read_with_writer", |b| {
        b.iter(|| {
            let mut acc = 0u8;
            for row in 0..8 {
                acc ^= matrix.row(black_box(row));
            }
            acc
        });
    });

    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
}

fn key_down_up(c: &mut Criterion) {
    let matrix = KeyMatrix::new();
    let mut group = c.benchmark_group("matrix_key_cycle");

    for key in [LogicalKey::Num1, LogicalKey::Enter, LogicalKey::Space] {
        group.bench_with_input(BenchmarkId::from_parameter(format!("{key:?}")), &key, |b, &key| {
            b.iter(|| {
                matrix.key_down(black_box(key));
                matrix.key_up(black_box(key));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, row_read_uncontended, row_read_with_writer, key_down_up);
criterion_main!(benches);
