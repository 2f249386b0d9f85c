//! Read-copy-update shared cell with quiescent-state grace periods, and a
//! benchmark that measures it against lock, atomic and racy baselines.
//!
//! # Core types
//!
//! - [`RcuDomain`]: the global epoch plus the table of registered readers.
//! - [`LocalReader`]: a reader thread's registration. Critical sections are
//!   entered with [`LocalReader::read_lock`] and quiescent states reported with
//!   [`LocalReader::quiescent`].
//! - [`RcuCell`]: one shared payload. Readers load the current [`Version`]
//!   without locks; writers copy, mutate, publish with a pointer swap, and
//!   reclaim the replaced instance once a grace period has elapsed.
//!
//! # Benchmark
//!
//! [`SharedCell`] puts a [`Workload`] behind one [`SyncKind`]; [`run`] and
//! [`run_config`] drive reader and writer threads over it and return a
//! [`Report`].
//!
//! ```
//! use rcu_bench::{run_config, BenchConfig, SyncKind};
//!
//! let config = BenchConfig::builder(2, 1, SyncKind::Rcu)
//!     .reads(4, 50)
//!     .fixed_writes(1, 20)
//!     .build()
//!     .unwrap();
//! let report = run_config(&config).unwrap();
//! assert_eq!(report.total_writes(), 20);
//! assert_eq!(report.final_value, "20");
//! ```
//!
//! 带静止状态宽限期的读-复制-更新共享单元，以及将其与锁、原子量和无同步基线进行比较的基准测试。

mod cell;
mod config;
mod domain;
mod driver;
mod error;
mod garbage;
mod reader;
mod report;
mod state;
mod strategy;
mod sync;
pub mod workload;

pub use cell::{RcuCell, Version};
pub use config::{
    BenchConfig, BenchConfigBuilder, WorkloadKind, WriterMode, DEFAULT_READ_INNER,
    DEFAULT_READ_OUTER, DEFAULT_WRITE_INNER, DEFAULT_WRITE_OUTER, DEFAULT_WRITE_PAUSE,
};
pub use domain::{RcuDomain, RcuDomainBuilder};
pub use driver::{run, run_config, validate};
pub use error::{BenchError, BenchResult};
pub use reader::{LocalReader, ReadGuard};
pub use report::{RcuStats, Report, Role, ThreadStats};
pub use strategy::{AtomicScalar, RacyCell, ReadSession, ReclaimMode, SharedCell, SyncKind, SyncStrategy};
pub use workload::{Counter, GrowableList, Record, Timestamp, Workload};

#[cfg(test)]
mod tests;
