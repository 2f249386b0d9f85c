use crate::domain::RcuDomain;
use crate::garbage::RetiredList;
use crate::reader::{LocalReader, ReadGuard};
use crate::sync::{AtomicPtr, AtomicU64, Mutex, Ordering};
use std::boxed::Box;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;

/// One published instance of an `RcuCell`'s payload.
///
/// Every publish creates a new `Version` with the next generation number; the
/// initial value is generation 0.
///
/// `RcuCell` 负载的一个已发布实例。
/// 每次发布都会创建一个带有下一个代数的新 `Version`；初始值为第 0 代。
#[derive(Debug)]
pub struct Version<T> {
    generation: u64,
    value: T,
}

impl<T> Version<T> {
    /// Generation number of this instance.
    /// 此实例的代数。
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The payload.
    /// 负载。
    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T> Deref for Version<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

/// The shared cell of the RCU strategy.
///
/// Exactly one instance is current at any time, reached through an atomically
/// swapped pointer. Writers never mutate in place: they copy the current
/// instance, apply their change to the copy, publish it with a single pointer
/// swap, and retire the previous instance. A retired instance is destroyed
/// only after a grace period of the cell's `RcuDomain` has elapsed.
///
/// - Readers are lock-free and never blocked by writers.
/// - Writers serialize on the copy-and-publish step only. Waiting for the grace
///   period happens outside the writer lock, so a slow reclamation never delays
///   the next writer's publish.
///
/// **Typical Usage**:
/// ```
/// use rcu_bench::{RcuCell, RcuDomain};
///
/// let domain = RcuDomain::new();
/// let cell = RcuCell::new(&domain, vec![1, 2, 3]);
///
/// // Reader thread:
/// let mut reader = domain.register_reader();
/// {
///     let guard = reader.read_lock();
///     let version = cell.load(&guard);
///     assert_eq!(version.len(), 3);
///     assert_eq!(version.generation(), 0);
/// }
/// reader.quiescent();
///
/// // Writer thread (deferred reclamation never blocks on readers):
/// cell.update_deferred(|old| {
///     let mut next = old.clone();
///     next.push(4);
///     next
/// });
/// assert_eq!(cell.snapshot(&reader), vec![1, 2, 3, 4]);
/// ```
///
/// RCU 策略的共享单元。
/// 任意时刻恰好有一个实例是当前实例，通过一个原子交换的指针访问。
/// 写入者从不原地修改：它们复制当前实例，在副本上应用修改，通过一次指针交换发布，
/// 并退休之前的实例。退休的实例只有在该单元所属 `RcuDomain` 的一个宽限期结束后才会被销毁。
/// - 读者是无锁的，永远不会被写入者阻塞。
/// - 写入者只在复制并发布这一步上串行化。等待宽限期发生在写入锁之外，
///   因此缓慢的回收永远不会延迟下一个写入者的发布。
pub struct RcuCell<T> {
    current: AtomicPtr<Version<T>>,
    /// Serializes writers; readers never touch it.
    /// 串行化写入者；读者从不接触它。
    writer: Mutex<()>,
    retired: Mutex<RetiredList<T>>,
    published: AtomicU64,
    domain: RcuDomain,
    _marker: PhantomData<Box<Version<T>>>,
}

impl<T: Send + Sync> RcuCell<T> {
    /// Create a new cell in `domain`, initialized with `value` as generation 0.
    /// 在 `domain` 中创建一个新的单元，以 `value` 作为第 0 代初始化。
    pub fn new(domain: &RcuDomain, value: T) -> Self {
        let node = Box::new(Version {
            generation: 0,
            value,
        });

        Self {
            current: AtomicPtr::new(Box::into_raw(node)),
            writer: Mutex::new(()),
            retired: Mutex::new(RetiredList::new()),
            published: AtomicU64::new(0),
            domain: domain.clone(),
            _marker: PhantomData,
        }
    }

    /// The domain whose grace periods protect this cell.
    /// 保护此单元的宽限期所属的域。
    #[inline]
    pub fn domain(&self) -> &RcuDomain {
        &self.domain
    }

    /// Reader load: the instance that is current right now.
    ///
    /// The returned reference is bound to both the guard and the cell, so it
    /// cannot be used after the critical section ends.
    ///
    /// # Panics
    /// Panics if `guard` belongs to a reader of a different domain.
    ///
    /// 读者 load：此刻的当前实例。
    /// 返回的引用同时被绑定到守卫和单元，因此在临界区结束后无法使用。
    #[inline]
    pub fn load<'g>(&'g self, guard: &'g ReadGuard<'_>) -> &'g Version<T> {
        assert!(
            self.domain.same_domain(guard.reader().shared()),
            "ReadGuard from a different RcuDomain"
        );

        let ptr = self.current.load(Ordering::Acquire);
        // SAFETY:
        // 1. `current` is never null and always points to a fully constructed
        //    instance: it is only stored after construction, with Release.
        // 2. An instance swapped out of `current` is retired and freed only after
        //    a grace period, which cannot complete while this reader has not
        //    reported quiescence, and it cannot do so while `guard` borrows it.
        unsafe { &*ptr }
    }

    /// Run `f` on the current payload inside a read-side critical section.
    /// 在读端临界区内对当前负载运行 `f`。
    #[inline]
    pub fn read<R>(&self, reader: &LocalReader, f: impl FnOnce(&T) -> R) -> R {
        let guard = reader.read_lock();
        let version = self.load(&guard);
        f(version.value())
    }

    /// Copy out the current payload.
    /// 复制出当前负载。
    #[inline]
    pub fn snapshot(&self, reader: &LocalReader) -> T
    where
        T: Clone,
    {
        self.read(reader, T::clone)
    }

    /// Writer update with synchronous reclamation.
    ///
    /// Publishes `f(current)` as the new current instance, then blocks until a
    /// grace period has elapsed and destroys the previous instance. Returns the
    /// generation that was published.
    ///
    /// Deadlocks if the calling thread is itself an online reader of the domain.
    ///
    /// 带同步回收的写入者更新。
    /// 将 `f(current)` 发布为新的当前实例，然后阻塞直到一个宽限期结束并销毁之前的实例。
    /// 返回已发布的代数。
    /// 如果调用线程本身是该域的在线读者，将会死锁。
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> u64 {
        let (generation, target) = self.publish_and_retire(f);
        self.domain.wait_for_grace_period(target);
        self.reclaim_through(self.domain.completed_epoch());
        generation
    }

    /// Writer update with deferred reclamation.
    ///
    /// Publishes `f(current)` and retires the previous instance without waiting.
    /// If the retired list then exceeds the domain's reclaim threshold, a
    /// non-blocking `try_reclaim()` runs.
    ///
    /// 带延迟回收的写入者更新。
    /// 发布 `f(current)` 并退休之前的实例，不做等待。
    /// 如果此后退休列表超过域的回收阈值，会运行一次非阻塞的 `try_reclaim()`。
    pub fn update_deferred(&self, f: impl FnOnce(&T) -> T) -> u64 {
        let (generation, _) = self.publish_and_retire(f);

        if let Some(threshold) = self.domain.reclaim_threshold {
            if self.retired_len() > threshold {
                self.try_reclaim();
            }
        }

        generation
    }

    /// Reclaim every retired instance whose grace period has already elapsed.
    /// Never blocks on readers. Returns the number of instances destroyed.
    ///
    /// 回收所有宽限期已经结束的退休实例。永远不会阻塞在读者上。返回被销毁的实例数量。
    pub fn try_reclaim(&self) -> usize {
        let completed = self.domain.scan();
        self.reclaim_through(completed)
    }

    /// Wait for one grace period, then reclaim everything retired before it.
    /// 等待一个宽限期，然后回收在此之前退休的所有实例。
    pub fn reclaim_all(&self) -> usize {
        self.domain.synchronize();
        self.reclaim_through(self.domain.completed_epoch())
    }

    /// Number of retired instances still awaiting reclamation.
    /// 仍在等待回收的退休实例数量。
    #[inline]
    pub fn retired_len(&self) -> usize {
        self.retired.lock().len()
    }

    /// Total number of retired instances destroyed so far.
    /// 到目前为止已销毁的退休实例总数。
    #[inline]
    pub fn reclaimed_count(&self) -> u64 {
        self.retired.lock().reclaimed()
    }

    /// Generation of the most recently published instance.
    /// 最近发布的实例的代数。
    #[inline]
    pub fn generation(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }

    /// Copy, mutate and publish under the writer lock, then retire the
    /// previous instance tagged with a freshly started grace period. Returns
    /// the published generation and the grace-period target.
    ///
    /// 在写入锁下复制、修改并发布，然后以新开始的宽限期标记并退休之前的实例。
    /// 返回已发布的代数和宽限期目标。
    fn publish_and_retire(&self, f: impl FnOnce(&T) -> T) -> (u64, u64) {
        let (old, generation) = {
            let _writer = self.writer.lock();

            let old_ptr = self.current.load(Ordering::Acquire);
            // SAFETY: `current` is only replaced under the writer lock, which we
            // hold, so the instance it points to stays current until our swap.
            let old = unsafe { &*old_ptr };

            // If `f` panics nothing has been swapped and `old` stays current.
            let node = Box::new(Version {
                generation: old.generation + 1,
                value: f(&old.value),
            });
            let generation = node.generation;

            let prev = self.current.swap(Box::into_raw(node), Ordering::AcqRel);
            debug_assert_eq!(prev, old_ptr);
            self.published.store(generation, Ordering::Release);

            (prev, generation)
        };

        // The epoch bump is ordered after the swap: any reader that observes the
        // new epoch also observes the new instance.
        let target = self.domain.start_grace_period();

        if let Some(old) = NonNull::new(old) {
            // SAFETY: `old` came from `Box::into_raw`, is no longer reachable
            // through `current`, and only this writer swapped it out.
            unsafe {
                self.retired.lock().push(old, target);
            }
        }

        (generation, target)
    }

    fn reclaim_through(&self, completed_epoch: u64) -> usize {
        let ready = self.retired.lock().detach_through(completed_epoch);
        // Destructors run after the list lock is released.
        ready.len()
    }

    #[cfg(test)]
    pub(crate) fn retired_generations(&self) -> std::vec::Vec<u64> {
        self.retired.lock().generations()
    }
}

impl<T> std::fmt::Debug for RcuCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RcuCell")
            .field("generation", &self.published.load(Ordering::Relaxed))
            .field("retired", &self.retired.lock().len())
            .finish()
    }
}

impl<T> Drop for RcuCell<T> {
    /// Every guard that loaded from this cell borrows it, so at drop time no
    /// reader holds a reference and the current instance can be freed directly.
    /// Retired instances are freed by the retired list's own drop.
    ///
    /// 每个从此单元加载的守卫都借用了它，因此在 drop 时没有读者持有引用，
    /// 当前实例可以被直接释放。退休实例由退休列表自身的 drop 释放。
    fn drop(&mut self) {
        let ptr = self.current.load(Ordering::Relaxed);
        if !ptr.is_null() {
            unsafe {
                drop(Box::from_raw(ptr));
            }
        }
    }
}
