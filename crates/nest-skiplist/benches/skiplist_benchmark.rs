//! Benchmarks for nest-skiplist upsert, find, and range query.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nest_skiplist::ConcurrentSkipList;

fn key(i: usize) -> String {
    format!("key-{i:08}")
}

fn filled(n: usize) -> ConcurrentSkipList<String, usize> {
    let list = ConcurrentSkipList::new();
    for i in 0..n {
        let _ = list.put(key(i), i);
    }
    list
}

fn bench_upsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("upsert");
    for &count in &[1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| black_box(filled(count)));
        });
    }
    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let list = filled(10_000);
    let needle = key(4_321);
    c.bench_function("find/10000", |b| {
        b.iter(|| black_box(list.find(black_box(&needle))));
    });
}

fn bench_query(c: &mut Criterion) {
    let list = filled(10_000);
    let (start, end) = (key(2_000), key(2_100));
    c.bench_function("query/100-of-10000", |b| {
        b.iter(|| black_box(list.query(Some(&start), Some(&end))));
    });
}

criterion_group!(benches, bench_upsert, bench_find, bench_query);
criterion_main!(benches);
