//! The five ways of sharing one payload between readers and writers.
//!
//! [`SharedCell`] pairs a workload with one [`SyncStrategy`] chosen at
//! construction time. Writers call [`SharedCell::write`]; each reader thread
//! opens a [`ReadSession`], which for RCU carries the thread's registration.
//!
//! 在读者和写入者之间共享一个负载的五种方式。
//! [`SharedCell`] 将一个负载与构造时选定的一种 [`SyncStrategy`] 配对。写入者调用
//! [`SharedCell::write`]；每个读者线程打开一个 [`ReadSession`]，在 RCU 下它携带该线程的注册。

use crate::cell::RcuCell;
use crate::domain::RcuDomain;
use crate::error::{BenchError, BenchResult};
use crate::reader::LocalReader;
use crate::sync::{AtomicU64, Mutex, Ordering, RwLock};
use crate::workload::{ScalarWord, Workload};
use std::cell::UnsafeCell;
use std::fmt;
use std::hint::black_box;
use std::str::FromStr;

/// Synchronization method, as named on the command line.
/// 同步方法，名称与命令行一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncKind {
    /// Copy, publish, and reclaim after a grace period.
    /// 复制、发布，并在宽限期后回收。
    Rcu,
    /// Shared section for reads, exclusive section for writes.
    /// 读取使用共享区，写入使用独占区。
    RwLock,
    /// One exclusive section for everything.
    /// 所有操作都使用同一个独占区。
    Lock,
    /// A single machine word updated with `fetch_add`.
    /// 用 `fetch_add` 更新的单个机器字。
    Atomic,
    /// No synchronization at all.
    /// 完全不同步。
    Race,
}

impl SyncKind {
    /// Every strategy, in command-line order.
    /// 所有策略，按命令行顺序排列。
    pub const ALL: [SyncKind; 5] = [
        SyncKind::Rcu,
        SyncKind::RwLock,
        SyncKind::Lock,
        SyncKind::Atomic,
        SyncKind::Race,
    ];

    /// Upper-case name accepted on the command line.
    /// 命令行接受的大写名称。
    pub fn name(self) -> &'static str {
        match self {
            SyncKind::Rcu => "RCU",
            SyncKind::RwLock => "RWLOCK",
            SyncKind::Lock => "LOCK",
            SyncKind::Atomic => "ATOMIC",
            SyncKind::Race => "RACE",
        }
    }

    /// Whether every write is guaranteed to be applied exactly once, in some
    /// serial order. `Atomic` qualifies because its only write is a
    /// commutative `fetch_add`.
    ///
    /// 是否保证每次写入都以某种串行顺序恰好应用一次。`Atomic` 符合条件，
    /// 因为它唯一的写入是可交换的 `fetch_add`。
    pub fn applies_every_write(self) -> bool {
        !matches!(self, SyncKind::Race)
    }

    /// Whether readers only ever observe fully published values.
    /// 读者是否只会观察到完整发布的值。
    pub fn is_consistent(self) -> bool {
        !matches!(self, SyncKind::Race)
    }
}

impl fmt::Display for SyncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SyncKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| BenchError::UnknownStrategy(s.to_string()))
    }
}

/// How the RCU write path disposes of the instance it replaced.
/// RCU 写路径如何处理被它替换的实例。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReclaimMode {
    /// Each write waits for its own grace period, then frees the old instance.
    /// 每次写入等待自己的宽限期，然后释放旧实例。
    #[default]
    Synchronous,
    /// Writes retire and return; reclamation is polled once the retired list
    /// grows past the domain's threshold, and drained when the run ends.
    /// 写入只退休旧实例并返回；退休列表超过域的阈值时轮询回收，运行结束时全部排空。
    Deferred,
}

/// A payload encoded in one atomic machine word.
/// 编码在一个原子机器字中的负载。
pub struct AtomicScalar<P> {
    word: AtomicU64,
    codec: ScalarWord<P>,
}

impl<P> AtomicScalar<P> {
    pub fn new(initial: &P, codec: ScalarWord<P>) -> Self {
        Self {
            word: AtomicU64::new((codec.encode)(initial)),
            codec,
        }
    }

    /// One write: add the codec's delta.
    /// 一次写入：加上编码的增量。
    #[inline]
    pub fn add(&self) {
        self.word.fetch_add(self.codec.delta, Ordering::SeqCst);
    }

    /// Decode the current word.
    /// 解码当前的机器字。
    #[inline]
    pub fn load(&self) -> P {
        (self.codec.decode)(self.word.load(Ordering::SeqCst))
    }
}

/// A payload with no synchronization whatsoever.
///
/// Concurrent use is a data race. It exists only as the baseline that
/// measures what the other strategies pay for safety, and is only ever driven
/// concurrently with payloads whose `tolerates_torn_reads()` holds.
///
/// 完全不同步的负载。
/// 并发使用就是数据竞争。它只作为衡量其他策略为安全付出多少代价的基线，
/// 并且只会与 `tolerates_torn_reads()` 成立的负载一起并发驱动。
pub struct RacyCell<P> {
    value: UnsafeCell<P>,
}

// SAFETY: not actually sound under concurrent access; see the type docs. The
// impl is what lets the racy baseline be shared between threads at all.
unsafe impl<P: Send + Sync> Sync for RacyCell<P> {}

impl<P> RacyCell<P> {
    pub fn new(value: P) -> Self {
        Self {
            value: UnsafeCell::new(value),
        }
    }

    /// # Safety
    /// Races with every concurrent `read` and `modify`.
    #[inline]
    pub unsafe fn modify(&self, f: impl FnOnce(&mut P)) {
        unsafe { f(&mut *self.value.get()) }
    }

    /// # Safety
    /// Races with every concurrent `modify`.
    #[inline]
    pub unsafe fn read(&self) -> P
    where
        P: Clone,
    {
        // black_box keeps the load inside the caller's loop.
        unsafe { (*black_box(self.value.get())).clone() }
    }
}

/// One shared payload behind one synchronization method.
/// 位于一种同步方法之后的共享负载。
pub enum SyncStrategy<P> {
    Rcu { cell: RcuCell<P>, reclaim: ReclaimMode },
    RwLock(RwLock<P>),
    Lock(Mutex<P>),
    Atomic(AtomicScalar<P>),
    Race(RacyCell<P>),
}

impl<P> SyncStrategy<P> {
    pub fn kind(&self) -> SyncKind {
        match self {
            SyncStrategy::Rcu { .. } => SyncKind::Rcu,
            SyncStrategy::RwLock(_) => SyncKind::RwLock,
            SyncStrategy::Lock(_) => SyncKind::Lock,
            SyncStrategy::Atomic(_) => SyncKind::Atomic,
            SyncStrategy::Race(_) => SyncKind::Race,
        }
    }
}

/// The Shared Cell of one benchmark run: a workload and the strategy holding
/// its payload. Owned by the driver and lent to every thread by reference.
///
/// 一次基准运行的共享单元：负载以及持有其值的策略。由驱动拥有，以引用借给每个线程。
pub struct SharedCell<W: Workload> {
    workload: W,
    strategy: SyncStrategy<W::Payload>,
}

impl<W: Workload> SharedCell<W> {
    /// Strategy `kind` over `workload`'s initial payload, with synchronous
    /// reclamation in a fresh domain when `kind` is RCU.
    /// 基于 `workload` 初始负载的 `kind` 策略；为 RCU 时在新域中使用同步回收。
    pub fn new(kind: SyncKind, workload: W) -> BenchResult<Self> {
        Self::with_domain(kind, workload, ReclaimMode::Synchronous, &RcuDomain::new())
    }

    /// Fails with `Unsupported` when `kind` is `Atomic` and the payload has no
    /// machine-word encoding.
    /// 当 `kind` 为 `Atomic` 且负载没有机器字编码时，返回 `Unsupported` 失败。
    pub fn with_domain(
        kind: SyncKind,
        workload: W,
        reclaim: ReclaimMode,
        domain: &RcuDomain,
    ) -> BenchResult<Self> {
        let initial = workload.initial();

        let strategy = match kind {
            SyncKind::Rcu => SyncStrategy::Rcu {
                cell: RcuCell::new(domain, initial),
                reclaim,
            },
            SyncKind::RwLock => SyncStrategy::RwLock(RwLock::new(initial)),
            SyncKind::Lock => SyncStrategy::Lock(Mutex::new(initial)),
            SyncKind::Atomic => {
                let codec = workload.scalar().ok_or_else(|| BenchError::Unsupported {
                    strategy: kind.to_string(),
                    workload: workload.name().to_string(),
                    reason: "payload is not a machine word".to_string(),
                })?;
                SyncStrategy::Atomic(AtomicScalar::new(&initial, codec))
            }
            SyncKind::Race => SyncStrategy::Race(RacyCell::new(initial)),
        };

        Ok(Self { workload, strategy })
    }

    #[inline]
    pub fn kind(&self) -> SyncKind {
        self.strategy.kind()
    }

    #[inline]
    pub fn workload(&self) -> &W {
        &self.workload
    }

    #[inline]
    pub fn strategy(&self) -> &SyncStrategy<W::Payload> {
        &self.strategy
    }

    /// The RCU cell, when this is the RCU strategy.
    /// RCU 单元，仅当策略为 RCU 时存在。
    pub fn rcu(&self) -> Option<&RcuCell<W::Payload>> {
        match &self.strategy {
            SyncStrategy::Rcu { cell, .. } => Some(cell),
            _ => None,
        }
    }

    /// Apply one workload mutation and make it visible to future reads.
    /// 应用一次负载变更，并使其对之后的读取可见。
    #[inline]
    pub fn write(&self) {
        match &self.strategy {
            SyncStrategy::Rcu { cell, reclaim } => {
                let mutate = |old: &W::Payload| self.workload.mutate(old);
                match reclaim {
                    ReclaimMode::Synchronous => cell.update(mutate),
                    ReclaimMode::Deferred => cell.update_deferred(mutate),
                };
            }
            SyncStrategy::RwLock(lock) => self.workload.apply(&mut lock.write()),
            SyncStrategy::Lock(lock) => self.workload.apply(&mut lock.lock()),
            SyncStrategy::Atomic(scalar) => scalar.add(),
            // SAFETY: the racy baseline; see `RacyCell`.
            SyncStrategy::Race(cell) => unsafe { cell.modify(|p| self.workload.apply(p)) },
        }
    }

    /// Open a read session for the calling thread. For RCU this registers a
    /// reader, which stays registered until the session is dropped.
    /// 为调用线程打开读会话。在 RCU 下会注册一个读者，直到会话被 drop 才注销。
    pub fn session(&self) -> ReadSession<'_, W> {
        let reader = self.rcu().map(|cell| cell.domain().register_reader());
        ReadSession {
            shared: self,
            reader,
        }
    }

    /// Drain deferred reclamation. Blocks for one grace period under RCU.
    /// 排空延迟回收。在 RCU 下阻塞一个宽限期。
    pub fn flush(&self) {
        if let Some(cell) = self.rcu() {
            cell.reclaim_all();
        }
    }

    /// The payload once every worker has been joined.
    /// 所有工作线程都被 join 之后的负载。
    pub fn final_value(&self) -> W::Payload {
        match &self.strategy {
            SyncStrategy::Rcu { cell, .. } => {
                let reader = cell.domain().register_reader();
                cell.snapshot(&reader)
            }
            SyncStrategy::RwLock(lock) => lock.read().clone(),
            SyncStrategy::Lock(lock) => lock.lock().clone(),
            SyncStrategy::Atomic(scalar) => scalar.load(),
            // SAFETY: callers only ask once no writer is running.
            SyncStrategy::Race(cell) => unsafe { cell.read() },
        }
    }
}

/// A reader thread's handle on a `SharedCell`.
/// 读者线程持有的 `SharedCell` 句柄。
pub struct ReadSession<'a, W: Workload> {
    shared: &'a SharedCell<W>,
    reader: Option<LocalReader>,
}

impl<'a, W: Workload> ReadSession<'a, W> {
    /// A consistent copy of the payload, as of some point during the call
    /// (except under `Race`).
    /// 负载的一致副本，对应调用期间的某个时刻（`Race` 除外）。
    #[inline]
    pub fn read(&self) -> W::Payload {
        match (&self.shared.strategy, &self.reader) {
            (SyncStrategy::Rcu { cell, .. }, Some(reader)) => cell.snapshot(reader),
            (SyncStrategy::Rcu { .. }, None) => unreachable!("RCU session without a reader"),
            (SyncStrategy::RwLock(lock), _) => lock.read().clone(),
            (SyncStrategy::Lock(lock), _) => lock.lock().clone(),
            (SyncStrategy::Atomic(scalar), _) => scalar.load(),
            // SAFETY: the racy baseline; see `RacyCell`.
            (SyncStrategy::Race(cell), _) => unsafe { cell.read() },
        }
    }

    /// Report a quiescent state between batches of reads. No-op except under RCU.
    /// 在两批读取之间报告静止状态。除 RCU 外均为空操作。
    #[inline]
    pub fn quiescent(&mut self) {
        if let Some(reader) = self.reader.as_mut() {
            reader.quiescent();
        }
    }

    #[inline]
    pub fn workload(&self) -> &'a W {
        &self.shared.workload
    }

    /// The RCU registration backing this session, if any.
    /// 支撑此会话的 RCU 注册（如果有）。
    pub fn reader(&self) -> Option<&LocalReader> {
        self.reader.as_ref()
    }
}
