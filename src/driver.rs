//! Benchmark driver.
//!
//! One run goes Configured -> Barrier-Wait -> Running -> Draining -> Reported:
//! the shared cell and every reader registration are created up front, all
//! workers block on one barrier so none starts measured work early, readers
//! are joined before writers, and in readers-gate-writers mode the writers'
//! stop flag is raised only once every reader has been joined.
//!
//! 基准驱动。
//! 一次运行经历 已配置 -> 屏障等待 -> 运行 -> 排空 -> 报告：共享单元和每个读者注册
//! 都预先创建，所有工作线程阻塞在同一个屏障上，因此没有线程提前开始被测量的工作；
//! 读者先于写入者被 join，并且在读者控制写入者模式下，只有在所有读者都被 join
//! 之后才设置写入者的停止标志。

use crate::config::{BenchConfig, WorkloadKind, WriterMode};
use crate::domain::RcuDomain;
use crate::error::{BenchError, BenchResult};
use crate::report::{RcuStats, Report, Role, ThreadStats};
use crate::strategy::{ReadSession, SharedCell, SyncKind};
use crate::workload::{Counter, GrowableList, Record, Timestamp, Workload};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

/// Run the workload named by `config`.
/// 运行 `config` 指定的负载。
pub fn run_config(config: &BenchConfig) -> BenchResult<Report> {
    match config.workload {
        WorkloadKind::Counter => run(config, Counter),
        WorkloadKind::Timestamp => run(config, Timestamp),
        WorkloadKind::List => run(config, GrowableList::new(config.seed)),
        WorkloadKind::Record => run(config, Record),
    }
}

/// Reject strategy/workload combinations that cannot run.
/// 拒绝无法运行的策略与负载组合。
pub fn validate<W: Workload>(config: &BenchConfig, workload: &W) -> BenchResult<()> {
    let unsupported = |reason: &str| BenchError::Unsupported {
        strategy: config.strategy.to_string(),
        workload: workload.name().to_string(),
        reason: reason.to_string(),
    };

    match config.strategy {
        SyncKind::Atomic if workload.scalar().is_none() => {
            Err(unsupported("payload is not a machine word"))
        }
        SyncKind::Race
            if config.readers > 0 && config.writers > 0 && !workload.tolerates_torn_reads() =>
        {
            Err(unsupported(
                "payload owns heap memory, so a racing reader could follow a freed pointer",
            ))
        }
        _ => Ok(()),
    }
}

/// Run one benchmark of `workload` under `config`.
///
/// Fails before spawning anything when the combination is unsupported, and
/// afterwards only when a worker thread panicked.
///
/// 在 `config` 下对 `workload` 运行一次基准。
/// 组合不受支持时在创建任何线程之前失败，之后只在工作线程 panic 时失败。
pub fn run<W: Workload>(config: &BenchConfig, workload: W) -> BenchResult<Report> {
    validate(config, &workload)?;

    let workload_name = workload.name();
    let domain = RcuDomain::new();
    let shared = SharedCell::with_domain(config.strategy, workload, config.reclaim, &domain)?;

    // Registrations exist before any thread does, so no grace period can
    // complete without the readers that will take part in the run.
    let sessions: Vec<_> = (0..config.readers).map(|_| shared.session()).collect();
    let barrier = Barrier::new(config.readers + config.writers + 1);
    let stop = AtomicBool::new(false);

    info!(
        "starting {} run: {} readers, {} writers, {} workload",
        config.strategy, config.readers, config.writers, workload_name
    );

    let shared = &shared;
    let barrier = &barrier;
    let stop = &stop;

    let (reader_results, writer_results) = thread::scope(|scope| {
        let writers: Vec<_> = (0..config.writers)
            .map(|id| scope.spawn(move || write_behavior(id, shared, config, barrier, stop)))
            .collect();

        let readers: Vec<_> = sessions
            .into_iter()
            .enumerate()
            .map(|(id, session)| scope.spawn(move || read_behavior(id, session, config, barrier)))
            .collect();

        barrier.wait();
        debug!("all {} workers released", config.readers + config.writers);

        let reader_results: Vec<_> = readers.into_iter().map(|h| h.join()).collect();
        debug!("readers joined");

        stop.store(true, Ordering::Release);
        let writer_results: Vec<_> = writers.into_iter().map(|h| h.join()).collect();
        debug!("writers joined");

        (reader_results, writer_results)
    });

    let readers = collect(Role::Reader, reader_results)?;
    let writers = collect(Role::Writer, writer_results)?;

    shared.flush();

    if config.strategy.is_consistent() {
        for stats in readers.iter().filter(|s| s.violations > 0) {
            warn!(
                "reader {} saw {} inconsistent snapshots under {}",
                stats.id, stats.violations, config.strategy
            );
        }
    }

    let rcu = shared.rcu().map(|cell| RcuStats {
        generation: cell.generation(),
        reclaimed: cell.reclaimed_count(),
        retired: cell.retired_len(),
    });
    let final_value = shared.workload().describe(&shared.final_value());

    info!("{} run finished, final value {}", config.strategy, final_value);

    Ok(Report {
        config: config.clone(),
        workload: workload_name,
        readers,
        writers,
        final_value,
        rcu,
    })
}

fn collect(
    role: Role,
    results: Vec<thread::Result<ThreadStats>>,
) -> BenchResult<Vec<ThreadStats>> {
    results
        .into_iter()
        .enumerate()
        .map(|(id, result)| {
            result.map_err(|_| BenchError::ThreadPanicked {
                role: role.name(),
                id,
            })
        })
        .collect()
}

fn read_behavior<W: Workload>(
    id: usize,
    mut session: ReadSession<'_, W>,
    config: &BenchConfig,
    barrier: &Barrier,
) -> ThreadStats {
    barrier.wait();

    let workload = session.workload();
    let mut last = workload.initial();
    let mut violations = 0u64;

    let start = Instant::now();
    for _ in 0..config.read_outer {
        for _ in 0..config.read_inner {
            let snapshot = session.read();
            if !workload.is_consistent(&last, &snapshot) {
                violations += 1;
            }
            last = snapshot;
        }
        session.quiescent();
    }
    let elapsed = start.elapsed();

    debug!("reader {} done in {:?}", id, elapsed);

    ThreadStats {
        role: Role::Reader,
        id,
        ops: config.reads_per_reader() as u64,
        elapsed,
        violations,
        last_observed: Some(workload.describe(&last)),
    }
}

fn write_behavior<W: Workload>(
    id: usize,
    shared: &SharedCell<W>,
    config: &BenchConfig,
    barrier: &Barrier,
    stop: &AtomicBool,
) -> ThreadStats {
    barrier.wait();

    let mut ops = 0u64;
    let mut elapsed = Duration::ZERO;
    let mut timed_write = || {
        let start = Instant::now();
        shared.write();
        elapsed += start.elapsed();
        ops += 1;
    };

    if let Some(writes) = config.writer_mode.writes_per_writer() {
        for _ in 0..writes {
            timed_write();
            pause(config.write_pause);
        }
    } else if let WriterMode::Gated { interval } = config.writer_mode {
        while !stop.load(Ordering::Acquire) {
            timed_write();
            pause(interval);
        }
    }

    debug!("writer {} done after {} writes", id, ops);

    ThreadStats {
        role: Role::Writer,
        id,
        ops,
        elapsed,
        violations: 0,
        last_observed: None,
    }
}

#[inline]
fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
