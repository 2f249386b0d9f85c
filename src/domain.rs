use crate::reader::LocalReader;
use crate::state::{SharedState, DEFAULT_RECLAIM_THRESHOLD, DEFAULT_SPIN_LIMIT};
use crate::sync::{spin_loop, yield_now, Arc, Ordering};
use log::debug;

/// Builder for configuring an `RcuDomain`.
///
/// - `reclaim_threshold`: retired-instance count above which deferred updates
///   poll for reclamation on their own
/// - `spin_limit`: busy spins per grace-period wait before falling back to yielding
///
/// # Example
/// ```
/// use rcu_bench::RcuDomain;
///
/// let domain = RcuDomain::builder()
///     .reclaim_threshold(128usize)
///     .spin_limit(16)
///     .build();
/// assert_eq!(domain.reader_count(), 0);
/// ```
///
/// 用于配置 `RcuDomain` 的构建器。
pub struct RcuDomainBuilder {
    reclaim_threshold: Option<usize>,
    spin_limit: u32,
}

impl RcuDomainBuilder {
    /// Create a new builder with default settings.
    /// 创建一个带有默认设置的新构建器。
    #[inline]
    pub fn new() -> Self {
        Self {
            reclaim_threshold: Some(DEFAULT_RECLAIM_THRESHOLD),
            spin_limit: DEFAULT_SPIN_LIMIT,
        }
    }

    /// Set the automatic reclamation threshold for deferred updates.
    ///
    /// Pass `None` to disable automatic polling; retired instances are then
    /// only reclaimed by explicit `try_reclaim()` calls.
    ///
    /// Default: `Some(64)`
    ///
    /// 设置延迟更新的自动回收阈值。
    /// 传递 `None` 可禁用自动轮询；此时只有显式调用 `try_reclaim()` 才会回收。
    #[inline]
    pub fn reclaim_threshold(mut self, threshold: impl Into<Option<usize>>) -> Self {
        self.reclaim_threshold = threshold.into();
        self
    }

    /// Set how many times a grace-period wait spins before it starts yielding.
    ///
    /// Default: `128`
    ///
    /// 设置宽限期等待在开始让出 CPU 之前的自旋次数。
    #[inline]
    pub fn spin_limit(mut self, spins: u32) -> Self {
        self.spin_limit = spins;
        self
    }

    /// Build the `RcuDomain` with the configured settings.
    /// 使用配置的设置构建 `RcuDomain`。
    #[inline]
    pub fn build(self) -> RcuDomain {
        RcuDomain {
            shared: Arc::new(SharedState::new()),
            reclaim_threshold: self.reclaim_threshold,
            spin_limit: self.spin_limit,
        }
    }
}

impl Default for RcuDomainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A quiescent-state-based RCU domain.
///
/// The domain owns the global epoch and the table of registered readers, and
/// answers the one question writers care about: has every registered reader
/// passed a quiescent state since epoch `e`?
///
/// A grace period that starts at epoch `e` completes once every reader that is
/// registered and online has reported quiescence at an epoch `>= e`. Readers
/// that register later are never waited on for earlier epochs. A reader that
/// stops reporting stalls every pending grace period; there is no timeout.
///
/// `RcuDomain` is `Clone` and can be shared across threads.
///
/// **Typical Usage**:
/// ```
/// use rcu_bench::{RcuCell, RcuDomain};
///
/// let domain = RcuDomain::new();
/// let cell = RcuCell::new(&domain, 1u64);
///
/// let mut reader = domain.register_reader();
/// assert_eq!(cell.read(&reader, |v| *v), 1);
/// reader.quiescent();
///
/// // Must not be called from a thread that is itself an online reader.
/// drop(reader);
/// cell.update(|v| v + 1);
/// ```
///
/// 基于静止状态的 RCU 域。
/// 域持有全局纪元和已注册读者表，并回答写入者唯一关心的问题：
/// 自纪元 `e` 以来，每个已注册读者是否都经过了一个静止状态？
/// 一个在纪元 `e` 开始的宽限期，在每个已注册且在线的读者都在 `>= e` 的纪元
/// 报告静止后完成。之后注册的读者不会为更早的纪元被等待。
/// 停止报告的读者会使所有待定的宽限期停滞；没有超时机制。
#[derive(Clone)]
pub struct RcuDomain {
    pub(crate) shared: Arc<SharedState>,
    pub(crate) reclaim_threshold: Option<usize>,
    spin_limit: u32,
}

impl RcuDomain {
    /// Create a new domain with default settings.
    /// 使用默认设置创建一个新的域。
    #[inline]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for configuring the domain.
    /// 创建一个用于配置域的构建器。
    #[inline]
    pub fn builder() -> RcuDomainBuilder {
        RcuDomainBuilder::new()
    }

    /// Register a new reader.
    ///
    /// The returned `LocalReader` starts online and quiescent at the current
    /// epoch. It unregisters itself when dropped.
    ///
    /// 注册一个新的读者。
    /// 返回的 `LocalReader` 初始为在线状态，并在当前纪元处于静止。
    /// 它在被 drop 时自动注销。
    #[inline]
    pub fn register_reader(&self) -> LocalReader {
        LocalReader::new(self.shared.clone())
    }

    /// Current global epoch.
    /// 当前全局纪元。
    #[inline]
    pub fn current_epoch(&self) -> u64 {
        self.shared.global_epoch.load(Ordering::SeqCst)
    }

    /// Highest epoch whose grace period is known to have completed.
    /// 已知宽限期完成的最高纪元。
    #[inline]
    pub fn completed_epoch(&self) -> u64 {
        self.shared.completed_epoch.load(Ordering::Acquire)
    }

    /// Number of currently registered readers (online or offline).
    /// 当前已注册读者的数量（在线或离线）。
    pub fn reader_count(&self) -> usize {
        self.shared.readers.lock().len()
    }

    /// Block until a full grace period has elapsed.
    ///
    /// Deadlocks if the calling thread is itself an online reader of this domain.
    ///
    /// 阻塞直到一个完整的宽限期结束。
    /// 如果调用线程本身是该域的在线读者，将会死锁。
    pub fn synchronize(&self) {
        let target = self.start_grace_period();
        self.wait_for_grace_period(target);
    }

    pub(crate) fn same_domain(&self, shared: &Arc<SharedState>) -> bool {
        Arc::ptr_eq(&self.shared, shared)
    }

    /// Advance the global epoch and return the new value, which is the target
    /// the caller's grace period must reach.
    ///
    /// 推进全局纪元并返回新值，即调用者的宽限期必须达到的目标。
    #[inline]
    pub(crate) fn start_grace_period(&self) -> u64 {
        self.shared.global_epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Non-blocking check whether the grace period for `target` has elapsed.
    /// 非阻塞地检查 `target` 的宽限期是否已经结束。
    pub(crate) fn poll_grace_period(&self, target: u64) -> bool {
        if self.completed_epoch() >= target {
            return true;
        }
        self.scan() >= target
    }

    /// Recompute the completed epoch from the reader table.
    ///
    /// The result is the minimum of the current global epoch and every
    /// registered reader's quiescent epoch; offline readers report `u64::MAX`
    /// and drop out of the minimum.
    ///
    /// 根据读者表重新计算已完成纪元。
    /// 结果是当前全局纪元与每个已注册读者静止纪元中的最小值；
    /// 离线读者报告 `u64::MAX`，因此不影响最小值。
    pub(crate) fn scan(&self) -> u64 {
        let mut completed = self.shared.global_epoch.load(Ordering::SeqCst);

        let readers = self.shared.readers.lock();
        for slot in readers.iter() {
            completed = completed.min(slot.quiescent_epoch.load(Ordering::SeqCst));
        }
        drop(readers);

        self.shared
            .completed_epoch
            .fetch_max(completed, Ordering::AcqRel);
        completed
    }

    /// Block until the grace period for `target` has elapsed.
    /// 阻塞直到 `target` 的宽限期结束。
    pub(crate) fn wait_for_grace_period(&self, target: u64) {
        let mut spins = 0u32;
        let mut stalled = false;

        while !self.poll_grace_period(target) {
            if spins < self.spin_limit {
                spins += 1;
                spin_loop();
                continue;
            }

            if !stalled {
                stalled = true;
                debug!(
                    "grace period {} stalled at completed epoch {} ({} readers registered)",
                    target,
                    self.completed_epoch(),
                    self.reader_count()
                );
            }
            yield_now();
        }
    }
}

impl Default for RcuDomain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RcuDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RcuDomain")
            .field("global_epoch", &self.current_epoch())
            .field("completed_epoch", &self.completed_epoch())
            .field("reclaim_threshold", &self.reclaim_threshold)
            .finish()
    }
}
