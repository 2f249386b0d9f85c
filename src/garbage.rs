use crate::cell::Version;
use std::boxed::Box;
use std::collections::VecDeque;
use std::ptr::NonNull;
use std::vec::Vec;

/// An instance that has been unpublished but may still be observed by readers.
///
/// Kept as a raw pointer until its grace period ends: readers may still hold
/// shared references, so it must not be turned back into a `Box` earlier.
///
/// 一个已取消发布但仍可能被读者观察到的实例。
/// 在宽限期结束之前保持为原始指针：读者可能仍持有共享引用，因此不能提前转换回 `Box`。
struct Retired<T> {
    /// Grace-period target: reclaimable once the completed epoch reaches it.
    /// 宽限期目标：当已完成纪元达到它时即可回收。
    epoch: u64,
    node: NonNull<Version<T>>,
}

/// Retired instances of one `RcuCell`, awaiting safe destruction.
///
/// Entries are tagged with the epoch at which their grace period started.
/// Concurrent writers may push out of epoch order, so reclamation filters the
/// whole list instead of popping from the front.
///
/// 一个 `RcuCell` 的退休实例，等待安全销毁。
/// 每个条目都标记了其宽限期开始时的纪元。并发写入者可能不按纪元顺序推入，
/// 因此回收时过滤整个列表而不是从队首弹出。
pub(crate) struct RetiredList<T> {
    queue: VecDeque<Retired<T>>,
    reclaimed: u64,
}

// SAFETY: the list uniquely owns every retired instance; moving it to another
// thread moves that ownership, which is sound whenever `T` itself is `Send`.
unsafe impl<T: Send> Send for RetiredList<T> {}

impl<T> RetiredList<T> {
    pub(crate) fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            reclaimed: 0,
        }
    }

    /// Number of instances still awaiting reclamation.
    /// 仍在等待回收的实例数量。
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    /// Total number of instances reclaimed so far.
    /// 到目前为止已回收的实例总数。
    #[inline]
    pub(crate) fn reclaimed(&self) -> u64 {
        self.reclaimed
    }

    /// Retire `node` with grace-period target `epoch`.
    ///
    /// # Safety
    /// `node` must come from `Box::into_raw`, must no longer be reachable by
    /// new readers, and must not be retired twice.
    ///
    /// 以宽限期目标 `epoch` 退休 `node`。
    #[inline]
    pub(crate) unsafe fn push(&mut self, node: NonNull<Version<T>>, epoch: u64) {
        self.queue.push_back(Retired { epoch, node });
    }

    /// Detach every entry whose grace period has completed.
    ///
    /// The detached instances are returned instead of dropped so the caller can
    /// release the list lock before running their destructors.
    ///
    /// 分离所有宽限期已完成的条目。
    /// 分离出的实例被返回而不是直接 drop，以便调用者在运行析构函数之前释放列表锁。
    pub(crate) fn detach_through(&mut self, completed_epoch: u64) -> Vec<Box<Version<T>>> {
        let mut ready = Vec::new();
        let mut pending = VecDeque::with_capacity(self.queue.len());

        for retired in self.queue.drain(..) {
            if retired.epoch <= completed_epoch {
                // SAFETY: the grace period for this entry has elapsed, so no reader
                // still holds a reference into it and ownership is unique again.
                ready.push(unsafe { Box::from_raw(retired.node.as_ptr()) });
            } else {
                pending.push_back(retired);
            }
        }

        self.queue = pending;
        self.reclaimed += ready.len() as u64;
        ready
    }

    /// Generations of the instances still awaiting reclamation, oldest retirement first.
    /// 仍在等待回收的实例的代数，按退休先后排列。
    #[cfg(test)]
    pub(crate) fn generations(&self) -> Vec<u64> {
        self.queue
            .iter()
            // SAFETY: entries are alive until detached.
            .map(|r| unsafe { r.node.as_ref() }.generation())
            .collect()
    }
}

impl<T> Drop for RetiredList<T> {
    /// Dropping the list means its cell is being dropped, which requires that
    /// no guard borrowing the cell is alive; every entry is unreachable.
    ///
    /// drop 列表意味着其所属 cell 正在被 drop，这要求没有借用该 cell 的守卫存活；
    /// 所有条目都已不可达。
    fn drop(&mut self) {
        for retired in self.queue.drain(..) {
            unsafe {
                drop(Box::from_raw(retired.node.as_ptr()));
            }
        }
    }
}
