//! Benchmarks for ring construction (full placement) and key location.

use std::sync::Arc;

use carousel_hash::Fnv1aHasher;
use carousel_ring::{Ring, RingConfig};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn members(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("node-{i}.internal:7000")).collect()
}

fn config() -> RingConfig {
    RingConfig::new(Arc::new(Fnv1aHasher))
}

fn bench_construction(c: &mut Criterion) {
    // The default config requires ceil(271/M * 1.25) <= 40, i.e. nine
    // members or more.
    let mut group = c.benchmark_group("construction");
    for count in [10usize, 50, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let initial = members(count);
            b.iter(|| Ring::new(initial.clone(), config()).unwrap());
        });
    }
    group.finish();
}

fn bench_locate(c: &mut Criterion) {
    let mut group = c.benchmark_group("locate");
    for count in [10usize, 50, 200] {
        let ring = Ring::new(members(count), config()).unwrap();
        let keys: Vec<String> = (0..1024).map(|i| format!("key-{i}")).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &keys, |b, keys| {
            let mut i = 0;
            b.iter(|| {
                let owner = ring.locate(&keys[i & 1023]);
                i += 1;
                owner
            });
        });
    }
    group.finish();
}

fn bench_membership_change(c: &mut Criterion) {
    let mut group = c.benchmark_group("membership_change");
    for count in [10usize, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let ring = Ring::new(members(count), config()).unwrap();
            b.iter(|| {
                ring.add("churner:0".to_string()).unwrap();
                ring.remove_by_name("churner:0").unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_construction,
    bench_locate,
    bench_membership_change
);
criterion_main!(benches);
