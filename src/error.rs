use thiserror::Error;

/// Benchmark operation result
/// 基准操作结果
pub type BenchResult<T> = Result<T, BenchError>;

/// Benchmark errors
///
/// Everything here is either a static misconfiguration, reported before any
/// thread starts, or a worker that panicked. Nothing is retried.
///
/// 基准错误
/// 这里的错误要么是在任何线程启动之前报告的静态配置错误，要么是 panic 的工作线程。
/// 不会重试任何操作。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BenchError {
    #[error("unknown synchronization method \"{0}\" (expected RCU, RWLOCK, LOCK, ATOMIC or RACE)")]
    UnknownStrategy(String),

    #[error("unknown workload \"{0}\" (expected counter, timestamp, list or record)")]
    UnknownWorkload(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{strategy} is not supported for the {workload} workload: {reason}")]
    Unsupported {
        strategy: String,
        workload: String,
        reason: String,
    },

    #[error("{role} thread {id} panicked")]
    ThreadPanicked { role: &'static str, id: usize },
}
