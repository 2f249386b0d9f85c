use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::atomic::Ordering;
use std::time::Duration;

use rcu_bench::{
    BenchConfig, Counter, RcuDomain, ReclaimMode, SharedCell, SyncKind, WorkloadKind, run_config,
};

// Benchmark 1: Single-threaded read through each strategy
fn bench_single_thread_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread_read");

    for kind in SyncKind::ALL {
        group.bench_function(BenchmarkId::new("counter", kind), |b| {
            let shared = SharedCell::new(kind, Counter).unwrap();
            let mut session = shared.session();

            b.iter(|| {
                black_box(session.read());
                session.quiescent();
            });
        });
    }

    // Reference point: a crossbeam-epoch pinned load of the same payload.
    group.bench_function("crossbeam_epoch_load", |b| {
        let atomic = crossbeam_epoch::Atomic::new(0u64);

        b.iter(|| {
            let guard = crossbeam_epoch::pin();
            let val = atomic.load(Ordering::Acquire, &guard);
            black_box(val);
        });
    });

    group.finish();
}

// Benchmark 2: Single-threaded write through each strategy
fn bench_single_thread_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread_write");

    for kind in SyncKind::ALL {
        group.bench_function(BenchmarkId::new("counter", kind), |b| {
            let shared = SharedCell::new(kind, Counter).unwrap();
            b.iter(|| shared.write());
        });
    }

    group.bench_function(BenchmarkId::new("counter", "RCU-deferred"), |b| {
        let domain = RcuDomain::new();
        let shared =
            SharedCell::with_domain(SyncKind::Rcu, Counter, ReclaimMode::Deferred, &domain)
                .unwrap();
        b.iter(|| shared.write());
    });

    group.finish();
}

// Benchmark 3: Whole runs, readers and writers together
fn bench_full_runs(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_run");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(5));

    for workload in [WorkloadKind::Counter, WorkloadKind::List] {
        for kind in [SyncKind::Rcu, SyncKind::RwLock, SyncKind::Lock] {
            let config = BenchConfig::builder(4, 1, kind)
                .workload(workload)
                .reads(50, 1_000)
                .fixed_writes(1, 200)
                .write_pause(Duration::ZERO)
                .verbose(false)
                .build()
                .unwrap();

            group.bench_with_input(
                BenchmarkId::new(workload.name(), kind),
                &config,
                |b, config| {
                    b.iter(|| black_box(run_config(config).unwrap()));
                },
            );
        }
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_thread_read,
    bench_single_thread_write,
    bench_full_runs
);
criterion_main!(benches);
