//! Benchmarks for admission checks and header emission.

use std::collections::HashMap;
use std::sync::Arc;

use admission_gate::RateLimiter;
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("check");

    group.bench_function("same_key", |b| {
        let limiter = RateLimiter::with_limit(u64::MAX);
        b.iter(|| black_box(limiter.check(Some("hotkey"))))
    });

    group.bench_function("global_key", |b| {
        let limiter = RateLimiter::with_limit(u64::MAX);
        b.iter(|| black_box(limiter.check(None)))
    });

    group.bench_function("distributed_keys", |b| {
        let limiter = RateLimiter::with_limit(u64::MAX);
        let keys: Vec<String> = (0..1_000).map(|i| format!("user:{}", i)).collect();
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(limiter.check(Some(keys[i].as_str())))
        })
    });

    group.bench_function("limit_with_headers", |b| {
        let limiter = RateLimiter::with_limit(u64::MAX);
        let mut headers: HashMap<String, String> = HashMap::new();
        b.iter(|| black_box(limiter.limit(Some(&mut headers), Some("user:1"))))
    });

    group.finish();
}

fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended");

    group.bench_function("four_threads_same_key", |b| {
        let limiter = Arc::new(RateLimiter::with_limit(u64::MAX));
        b.iter(|| {
            std::thread::scope(|scope| {
                for _ in 0..4 {
                    scope.spawn(|| {
                        for _ in 0..256 {
                            black_box(limiter.check(Some("contended")));
                        }
                    });
                }
            })
        })
    });

    group.finish();
}

criterion_group!(benches, bench_check, bench_contended);
criterion_main!(benches);
