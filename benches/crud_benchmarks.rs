use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sapling_tree::OrderedMap;
use std::collections::BTreeMap;

const N: usize = 10_000;
// Sorted insertion builds a list-shaped tree with O(n) depth, so the
// degenerate benchmarks run on a smaller input.
const N_SORTED: usize = 1_000;

// ─── Helper functions to generate key sequences ─────────────────────────────

fn random_keys(n: usize) -> Vec<i64> {
    // Use a simple LCG for a deterministic pseudo-random sequence
    let mut keys = Vec::with_capacity(n);
    let mut x: u64 = 12345;
    for _ in 0..n {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
        keys.push((x >> 33) as i64);
    }
    keys
}

// ─── Map Benchmarks ─────────────────────────────────────────────────────────

fn bench_map_insert_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let mut group = c.benchmark_group("map_insert_random");

    group.bench_function(BenchmarkId::new("OrderedMap", N), |b| {
        b.iter(|| {
            let mut map = OrderedMap::new();
            for &k in &keys {
                map.insert(k, k);
            }
            map
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut map = BTreeMap::new();
            for &k in &keys {
                map.insert(k, k);
            }
            map
        });
    });

    group.finish();
}

fn bench_map_insert_ordered(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_insert_ordered");

    group.bench_function(BenchmarkId::new("OrderedMap", N_SORTED), |b| {
        b.iter(|| {
            let mut map = OrderedMap::new();
            for i in 0..N_SORTED as i64 {
                map.insert(i, i);
            }
            map
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N_SORTED), |b| {
        b.iter(|| {
            let mut map = BTreeMap::new();
            for i in 0..N_SORTED as i64 {
                map.insert(i, i);
            }
            map
        });
    });

    group.finish();
}

fn bench_map_get_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let os_map: OrderedMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();
    let bt_map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();

    let mut group = c.benchmark_group("map_get_random");

    group.bench_function(BenchmarkId::new("OrderedMap", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for k in &keys {
                if let Some(&v) = os_map.get(k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for k in &keys {
                if let Some(&v) = bt_map.get(k) {
                    sum = sum.wrapping_add(v);
                }
            }
            sum
        });
    });

    group.finish();
}

fn bench_map_remove_random(c: &mut Criterion) {
    let keys = random_keys(N);
    let os_template: OrderedMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();
    let bt_template: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();

    let mut group = c.benchmark_group("map_remove_random");

    group.bench_function(BenchmarkId::new("OrderedMap", N), |b| {
        b.iter_batched(
            || os_template.clone(),
            |mut map| {
                for k in &keys {
                    map.remove(k);
                }
                map
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.bench_function(BenchmarkId::new("BTreeMap", N), |b| {
        b.iter_batched(
            || bt_template.clone(),
            |mut map| {
                for k in &keys {
                    map.remove(k);
                }
                map
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

fn bench_map_iterate(c: &mut Criterion) {
    let keys = random_keys(N);
    let os_map: OrderedMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();
    let bt_map: BTreeMap<i64, i64> = keys.iter().map(|&k| (k, k)).collect();

    let mut group = c.benchmark_group("map_iterate");

    group.bench_function(BenchmarkId::new("OrderedMap/iter", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for (_, &v) in os_map.iter() {
                sum = sum.wrapping_add(v);
            }
            sum
        });
    });

    group.bench_function(BenchmarkId::new("OrderedMap/for_each", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            os_map.for_each(|_, &v| sum = sum.wrapping_add(v));
            sum
        });
    });

    group.bench_function(BenchmarkId::new("BTreeMap/iter", N), |b| {
        b.iter(|| {
            let mut sum = 0i64;
            for (_, &v) in bt_map.iter() {
                sum = sum.wrapping_add(v);
            }
            sum
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_map_insert_random,
    bench_map_insert_ordered,
    bench_map_get_random,
    bench_map_remove_random,
    bench_map_iterate,
);
criterion_main!(benches);
