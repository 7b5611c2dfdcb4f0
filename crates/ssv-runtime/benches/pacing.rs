use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use ssv_core::atomic::cas_modify;
use ssv_runtime::{LatencyTracker, SsvConfig, SsvShared};

fn bench_cas_modify_uncontended(c: &mut Criterion) {
    let cell = AtomicU64::new(0);
    c.bench_function("cas_modify uncontended increment", |b| {
        b.iter(|| {
            cas_modify(&cell, |old| (old + 1, old + 1));
        });
    });
}

fn bench_cas_modify_contended(c: &mut Criterion) {
    c.bench_function("cas_modify 4-thread contended increment", |b| {
        b.iter(|| {
            let cell = Arc::new(AtomicU64::new(0));
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let cell = Arc::clone(&cell);
                    std::thread::spawn(move || {
                        for _ in 0..200 {
                            cas_modify(&cell, |old| (old + 1, ()));
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
            black_box(cell.load(std::sync::atomic::Ordering::SeqCst));
        });
    });
}

fn bench_desired_worker_count(c: &mut Criterion) {
    c.bench_function("desired_worker_count convergence", |b| {
        b.iter(|| {
            black_box(LatencyTracker::desired_worker_count(
                black_box(4),
                black_box(5_000_000),
                black_box(1_000_000),
                black_box(1_000_000),
                black_box(64),
            ))
        });
    });
}

fn bench_shared_construction(c: &mut Criterion) {
    c.bench_function("SsvShared::new paced", |b| {
        b.iter(|| {
            black_box(SsvShared::<u64>::new(SsvConfig::new().stream_rate(1000)));
        });
    });
}

criterion_group!(
    benches,
    bench_cas_modify_uncontended,
    bench_cas_modify_contended,
    bench_desired_worker_count,
    bench_shared_construction,
);
criterion_main!(benches);
