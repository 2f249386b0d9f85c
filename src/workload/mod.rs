//! Payloads mutated by the benchmark.
//!
//! A workload supplies the initial payload, an in-place step `apply`, and a
//! predicate over successive snapshots that a correctly synchronized run can
//! never violate. `mutate` is the pure form of `apply` used by the RCU write
//! path: it never touches the old instance.
//!
//! 基准修改的负载。
//! 负载提供初始值、原地写入步骤 `apply`，以及一个针对连续快照的谓词，正确同步的运行
//! 永远不会违反它。`mutate` 是 `apply` 的纯函数形式，供 RCU 写路径使用：它从不修改旧实例。

mod counter;
mod list;
mod record;
mod timestamp;

pub use counter::Counter;
pub use list::{GrowableList, ListPayload, DEFAULT_LIST_LEN, MAX_LIST_LEN};
pub use record::{Record, RecordPayload};
pub use timestamp::Timestamp;

/// Encoding of a payload into one machine word, for the atomic strategy.
///
/// The atomic strategy writes with a single `fetch_add(delta)`, so only
/// payloads whose mutation is a commutative addition qualify.
///
/// 负载到单个机器字的编码，供原子策略使用。
/// 原子策略只用一次 `fetch_add(delta)` 写入，因此只有变更是可交换加法的负载才符合条件。
pub struct ScalarWord<P> {
    pub encode: fn(&P) -> u64,
    pub decode: fn(u64) -> P,
    pub delta: u64,
}

impl<P> Clone for ScalarWord<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for ScalarWord<P> {}

impl<P> std::fmt::Debug for ScalarWord<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScalarWord").field("delta", &self.delta).finish()
    }
}

/// A payload type together with its write step and snapshot predicate.
/// 负载类型及其写入步骤和快照谓词。
pub trait Workload: Send + Sync {
    type Payload: Clone + Send + Sync + 'static;

    /// Short name used in reports and on the command line.
    /// 报告和命令行中使用的简短名称。
    fn name(&self) -> &'static str;

    /// Value before the first write.
    /// 第一次写入之前的值。
    fn initial(&self) -> Self::Payload;

    /// One write, in place. Lock-based strategies call this inside their
    /// exclusive section; the RCU strategy only ever calls it on a private copy.
    /// 原地执行一次写入。加锁策略在独占区内调用它；RCU 策略只在私有副本上调用它。
    fn apply(&self, payload: &mut Self::Payload);

    /// One write as a pure function of the old payload.
    /// 以旧负载的纯函数形式执行一次写入。
    fn mutate(&self, old: &Self::Payload) -> Self::Payload {
        let mut next = old.clone();
        self.apply(&mut next);
        next
    }

    /// Invariant between two snapshots taken in order by the same reader.
    /// 同一读者按顺序获得的两个快照之间的不变量。
    fn is_consistent(&self, prev: &Self::Payload, next: &Self::Payload) -> bool;

    /// Machine-word encoding, if the payload supports the atomic strategy.
    /// 机器字编码，负载支持原子策略时才有。
    fn scalar(&self) -> Option<ScalarWord<Self::Payload>> {
        None
    }

    /// Whether an unsynchronized read racing a write can only produce a wrong
    /// value. False for payloads that own heap memory.
    /// 与写入竞争的非同步读取是否只会产生错误的值。拥有堆内存的负载为 false。
    fn tolerates_torn_reads(&self) -> bool {
        false
    }

    /// Human readable rendering of a payload for the final report.
    /// 用于最终报告的负载可读表示。
    fn describe(&self, payload: &Self::Payload) -> String;
}
