use crate::error::{BenchError, BenchResult};
use crate::strategy::{ReclaimMode, SyncKind};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default outer read loop count.
/// 默认的外层读循环次数。
pub const DEFAULT_READ_OUTER: usize = 2000;
/// Default inner read loop count (reads between two quiescent reports).
/// 默认的内层读循环次数（两次静止报告之间的读取次数）。
pub const DEFAULT_READ_INNER: usize = 100_000;
/// Default outer write loop count.
/// 默认的外层写循环次数。
pub const DEFAULT_WRITE_OUTER: usize = 10;
/// Default inner write loop count.
/// 默认的内层写循环次数。
pub const DEFAULT_WRITE_INNER: usize = 200;
/// Default pause between two writes in fixed-count mode.
/// 固定次数模式下两次写入之间的默认停顿。
pub const DEFAULT_WRITE_PAUSE: Duration = Duration::from_micros(1);

/// Which payload the run mutates.
/// 本次运行修改的负载。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkloadKind {
    #[default]
    Counter,
    Timestamp,
    List,
    Record,
}

impl WorkloadKind {
    /// Name accepted by `--workload`.
    /// `--workload` 接受的名称。
    pub fn name(self) -> &'static str {
        match self {
            WorkloadKind::Counter => "counter",
            WorkloadKind::Timestamp => "timestamp",
            WorkloadKind::List => "list",
            WorkloadKind::Record => "record",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WorkloadKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(WorkloadKind::Counter),
            "timestamp" => Ok(WorkloadKind::Timestamp),
            "list" => Ok(WorkloadKind::List),
            "record" => Ok(WorkloadKind::Record),
            other => Err(BenchError::UnknownWorkload(other.to_string())),
        }
    }
}

/// How long writer threads keep writing.
/// 写入者线程持续写入的时长。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterMode {
    /// Each writer performs exactly `outer * inner` writes, pausing between them.
    /// 每个写入者恰好执行 `outer * inner` 次写入，写入之间停顿。
    FixedCount { outer: usize, inner: usize },
    /// Writers keep writing, `interval` apart, until every reader has finished.
    /// 写入者每隔 `interval` 写入一次，直到所有读者结束。
    Gated { interval: Duration },
}

impl WriterMode {
    /// Writes per writer, when fixed. Saturates; `BenchConfigBuilder::build`
    /// rejects counts whose product overflows.
    ///
    /// 固定模式下每个写入者的写入次数。结果饱和；`BenchConfigBuilder::build`
    /// 会拒绝乘积溢出的次数。
    pub fn writes_per_writer(&self) -> Option<usize> {
        match self {
            WriterMode::FixedCount { outer, inner } => Some(outer.saturating_mul(*inner)),
            WriterMode::Gated { .. } => None,
        }
    }
}

/// One benchmark run, fixed before any thread starts.
/// 一次基准运行的配置，在任何线程启动之前确定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Reader threads.
    /// 读者线程数。
    pub readers: usize,
    /// Writer threads.
    /// 写入者线程数。
    pub writers: usize,
    pub strategy: SyncKind,
    pub workload: WorkloadKind,
    /// Quiescent reports per reader.
    /// 每个读者报告静止状态的次数。
    pub read_outer: usize,
    /// Reads between two quiescent reports.
    /// 两次静止报告之间的读取次数。
    pub read_inner: usize,
    pub writer_mode: WriterMode,
    /// Sleep between two writes in fixed-count mode; not included in write timing.
    /// 固定次数模式下两次写入之间的休眠，不计入写入耗时。
    pub write_pause: Duration,
    /// Disposal of replaced RCU instances.
    /// 被替换的 RCU 实例的回收方式。
    pub reclaim: ReclaimMode,
    /// Seed of the list workload's generator.
    /// 列表负载随机数生成器的种子。
    pub seed: u64,
    /// Full report instead of one cost per line.
    /// 输出完整报告，而不是每行一个开销。
    pub verbose: bool,
}

impl BenchConfig {
    pub fn builder(readers: usize, writers: usize, strategy: SyncKind) -> BenchConfigBuilder {
        BenchConfigBuilder::new(readers, writers, strategy)
    }

    /// Reads per reader thread. Saturates like `WriterMode::writes_per_writer`.
    /// 每个读者线程的读取次数。与 `WriterMode::writes_per_writer` 一样饱和。
    pub fn reads_per_reader(&self) -> usize {
        self.read_outer.saturating_mul(self.read_inner)
    }
}

/// Builder for `BenchConfig`.
///
/// 用于 `BenchConfig` 的构建器。
///
/// # Example
/// ```
/// use rcu_bench::{BenchConfig, SyncKind, WriterMode};
///
/// let config = BenchConfig::builder(4, 2, SyncKind::Rcu)
///     .reads(10, 100)
///     .fixed_writes(1, 100)
///     .build()
///     .unwrap();
/// assert_eq!(config.writer_mode, WriterMode::FixedCount { outer: 1, inner: 100 });
/// ```
pub struct BenchConfigBuilder {
    config: BenchConfig,
}

impl BenchConfigBuilder {
    pub fn new(readers: usize, writers: usize, strategy: SyncKind) -> Self {
        Self {
            config: BenchConfig {
                readers,
                writers,
                strategy,
                workload: WorkloadKind::Counter,
                read_outer: DEFAULT_READ_OUTER,
                read_inner: DEFAULT_READ_INNER,
                writer_mode: WriterMode::FixedCount {
                    outer: DEFAULT_WRITE_OUTER,
                    inner: DEFAULT_WRITE_INNER,
                },
                write_pause: DEFAULT_WRITE_PAUSE,
                reclaim: ReclaimMode::Synchronous,
                seed: 0,
                verbose: true,
            },
        }
    }

    pub fn reads(mut self, outer: usize, inner: usize) -> Self {
        self.config.read_outer = outer;
        self.config.read_inner = inner;
        self
    }

    pub fn fixed_writes(mut self, outer: usize, inner: usize) -> Self {
        self.config.writer_mode = WriterMode::FixedCount { outer, inner };
        self
    }

    /// Readers gate writers: writers run until all readers are done.
    /// 读者控制写入者：写入者一直运行到所有读者完成。
    pub fn gated_writes(mut self, interval: Duration) -> Self {
        self.config.writer_mode = WriterMode::Gated { interval };
        self
    }

    pub fn write_pause(mut self, pause: Duration) -> Self {
        self.config.write_pause = pause;
        self
    }

    pub fn workload(mut self, workload: WorkloadKind) -> Self {
        self.config.workload = workload;
        self
    }

    pub fn reclaim(mut self, reclaim: ReclaimMode) -> Self {
        self.config.reclaim = reclaim;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    /// Check the combination and produce the config.
    ///
    /// Strategy/workload compatibility needs the workload itself and is
    /// checked by the driver before any thread starts.
    ///
    /// 检查组合并生成配置。
    /// 策略与负载的兼容性需要负载本身，由驱动在任何线程启动之前检查。
    pub fn build(self) -> BenchResult<BenchConfig> {
        let config = self.config;

        if config.readers == 0 && config.writers == 0 {
            return Err(BenchError::InvalidConfig(
                "at least one reader or writer is required".to_string(),
            ));
        }
        if config.readers == 0 && matches!(config.writer_mode, WriterMode::Gated { .. }) {
            return Err(BenchError::InvalidConfig(
                "readers-gate-writers mode needs at least one reader".to_string(),
            ));
        }
        if config.read_outer.checked_mul(config.read_inner).is_none() {
            return Err(BenchError::InvalidConfig(format!(
                "{} x {} reads per reader overflows",
                config.read_outer, config.read_inner
            )));
        }
        if let WriterMode::FixedCount { outer, inner } = config.writer_mode {
            if outer.checked_mul(inner).is_none() {
                return Err(BenchError::InvalidConfig(format!(
                    "{} x {} writes per writer overflows",
                    outer, inner
                )));
            }
        }

        Ok(config)
    }
}
