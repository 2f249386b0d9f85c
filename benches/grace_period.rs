use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use rcu_bench::{RcuCell, RcuDomain};

// Benchmark 1: Grace period with no registered readers
fn bench_synchronize_idle(c: &mut Criterion) {
    c.bench_function("synchronize_no_readers", |b| {
        let domain = RcuDomain::new();
        b.iter(|| domain.synchronize());
    });

    c.bench_function("synchronize_offline_readers", |b| {
        let domain = RcuDomain::new();
        let mut readers: Vec<_> = (0..16).map(|_| domain.register_reader()).collect();
        for reader in readers.iter_mut() {
            reader.offline();
        }
        b.iter(|| domain.synchronize());
    });
}

// Benchmark 2: Grace period while reader threads keep reporting quiescence
fn bench_synchronize_active_readers(c: &mut Criterion) {
    let mut group = c.benchmark_group("synchronize_active_readers");
    group.sample_size(20);

    for num_readers in [1, 2, 4].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(num_readers),
            num_readers,
            |b, &num_readers| {
                let domain = RcuDomain::new();
                let cell = RcuCell::new(&domain, 0u64);
                let stop = AtomicBool::new(false);

                thread::scope(|s| {
                    for _ in 0..num_readers {
                        s.spawn(|| {
                            let mut reader = domain.register_reader();
                            while !stop.load(Ordering::Relaxed) {
                                black_box(cell.read(&reader, |v| *v));
                                reader.quiescent();
                            }
                        });
                    }

                    b.iter(|| cell.update(|v| v + 1));
                    stop.store(true, Ordering::Relaxed);
                });
            },
        );
    }

    group.finish();
}

// Benchmark 3: Synchronous versus deferred reclamation of a heap payload
fn bench_reclaim_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("reclaim_modes");

    group.bench_function("update", |b| {
        let domain = RcuDomain::new();
        let cell = RcuCell::new(&domain, vec![0u64; 64]);
        b.iter(|| {
            cell.update(|old| {
                let mut next = old.clone();
                next[0] += 1;
                next
            })
        });
    });

    group.bench_function("update_deferred", |b| {
        let domain = RcuDomain::new();
        let cell = RcuCell::new(&domain, vec![0u64; 64]);
        b.iter(|| {
            cell.update_deferred(|old| {
                let mut next = old.clone();
                next[0] += 1;
                next
            })
        });
        cell.reclaim_all();
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_synchronize_idle,
    bench_synchronize_active_readers,
    bench_reclaim_modes
);
criterion_main!(benches);
