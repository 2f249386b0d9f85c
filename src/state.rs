use crate::sync::{Arc, AtomicU64, AtomicUsize, Mutex};
use std::vec::Vec;

/// Default threshold for automatic reclamation of deferred retirements.
/// 延迟退休实例自动回收的默认阈值。
pub(crate) const DEFAULT_RECLAIM_THRESHOLD: usize = 64;

/// Default number of busy spins a grace-period wait performs before yielding.
/// 宽限期等待在让出 CPU 之前的默认自旋次数。
pub(crate) const DEFAULT_SPIN_LIMIT: u32 = 128;

/// Quiescent epoch of a reader that is offline.
///
/// It compares greater than or equal to every grace-period target, so offline
/// readers are never waited on.
///
/// 离线读者的静止纪元。
/// 它大于等于任何宽限期目标，因此永远不会等待离线读者。
pub(crate) const OFFLINE_EPOCH: u64 = u64::MAX;

/// Registration record of one reader thread.
///
/// Written only by the owning reader; the grace-period detector only loads it.
/// Cache-aligned to prevent false sharing between readers.
///
/// 一个读者线程的注册记录。
/// 只有所属读者会写入；宽限期检测器只读取它。
/// 缓存对齐以防止读者之间的伪共享。
#[derive(Debug)]
#[repr(align(64))]
pub(crate) struct ReaderSlot {
    /// Registration id, unique within a domain.
    /// 注册 id，在域内唯一。
    pub(crate) id: usize,
    /// Latest epoch at which the reader reported a quiescent state, or OFFLINE_EPOCH.
    /// 读者最近一次报告静止状态时的纪元，或 OFFLINE_EPOCH。
    pub(crate) quiescent_epoch: AtomicU64,
}

/// Global shared state of an RCU domain.
///
/// RCU 域的全局共享状态。
#[derive(Debug)]
#[repr(align(64))]
pub(crate) struct SharedState {
    /// Monotonic epoch counter, advanced once per grace-period request.
    /// 单调纪元计数器，每次请求宽限期时推进一次。
    pub(crate) global_epoch: AtomicU64,
    /// Highest epoch known to have completed its grace period (cached for pollers).
    /// 已知完成宽限期的最高纪元（为轮询者缓存）。
    pub(crate) completed_epoch: AtomicU64,
    /// All registered readers. Registration and grace-period scans both take this lock.
    /// 所有已注册读者。注册与宽限期扫描都会获取此锁。
    pub(crate) readers: Mutex<Vec<Arc<ReaderSlot>>>,
    /// Source of reader registration ids.
    /// 读者注册 id 的来源。
    pub(crate) next_reader_id: AtomicUsize,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        Self {
            global_epoch: AtomicU64::new(0),
            completed_epoch: AtomicU64::new(0),
            readers: Mutex::new(Vec::new()),
            next_reader_id: AtomicUsize::new(0),
        }
    }
}
