use crate::state::{ReaderSlot, SharedState, OFFLINE_EPOCH};
use crate::sync::{Arc, AtomicU64, Cell, Ordering};
use log::debug;

/// A reader thread's registration record.
///
/// Each reader thread should hold exactly one `LocalReader`, created via
/// `RcuDomain::register_reader()`. It is `!Sync` (due to `Cell`) but `Send`,
/// so it can be registered on one thread and handed to the thread that uses it.
///
/// The `LocalReader` is used to:
/// - Enter read-side critical sections via `read_lock()`.
/// - Report quiescent states via `quiescent()` between critical sections.
/// - Go `offline()` around long stretches without reads, and back `online()`.
///
/// `quiescent`, `offline` and `online` take `&mut self` while every
/// `ReadGuard` borrows `&self`, so none of them can be called while a
/// reference obtained inside a critical section is still alive.
///
/// Dropping the `LocalReader` unregisters it; writers stop waiting on it.
///
/// 读者线程的注册记录。
/// 每个读者线程应该通过 `RcuDomain::register_reader()` 持有恰好一个 `LocalReader`。
/// 它是 `!Sync` 的（因为 `Cell`），但是 `Send` 的，因此可以在一个线程上注册，
/// 再交给使用它的线程。
/// `LocalReader` 用于：
/// - 通过 `read_lock()` 进入读端临界区。
/// - 在临界区之间通过 `quiescent()` 报告静止状态。
/// - 在长时间不读取时 `offline()`，之后再 `online()`。
/// `quiescent`、`offline` 和 `online` 需要 `&mut self`，而每个 `ReadGuard`
/// 借用 `&self`，因此在临界区内获得的引用仍然存活时无法调用它们。
/// drop `LocalReader` 会注销它；写入者不再等待它。
pub struct LocalReader {
    slot: Arc<ReaderSlot>,
    shared: Arc<SharedState>,
    nesting: Cell<usize>,
}

impl LocalReader {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        let id = shared.next_reader_id.fetch_add(1, Ordering::Relaxed);

        // The epoch is read under the table lock so that a concurrent scan
        // either sees this slot or ran before this epoch was loaded.
        let slot = {
            let mut readers = shared.readers.lock();
            let slot = Arc::new(ReaderSlot {
                id,
                quiescent_epoch: AtomicU64::new(shared.global_epoch.load(Ordering::SeqCst)),
            });
            readers.push(Arc::clone(&slot));
            slot
        };

        debug!("rcu reader {} registered", id);

        LocalReader {
            slot,
            shared,
            nesting: Cell::new(0),
        }
    }

    /// Registration id of this reader.
    /// 此读者的注册 id。
    #[inline]
    pub fn id(&self) -> usize {
        self.slot.id
    }

    /// Whether this reader is online, i.e. grace periods wait on it.
    /// 此读者是否在线，即宽限期是否会等待它。
    #[inline]
    pub fn is_online(&self) -> bool {
        self.slot.quiescent_epoch.load(Ordering::Relaxed) != OFFLINE_EPOCH
    }

    /// Whether this reader is currently inside a read-side critical section.
    /// 此读者当前是否处于读端临界区内。
    #[inline]
    pub fn in_critical_section(&self) -> bool {
        self.nesting.get() > 0
    }

    /// Enter a read-side critical section.
    ///
    /// **Reentrancy**: nested calls are allowed; the critical section ends when
    /// the last guard (including clones) is dropped.
    ///
    /// This does not touch shared memory: in a quiescent-state-based scheme the
    /// reader is assumed to hold references until it next reports quiescence.
    ///
    /// # Panics
    /// Panics if the reader is offline.
    ///
    /// 进入读端临界区。
    /// **可重入性**：允许嵌套调用；当最后一个守卫（包括克隆）被 drop 时临界区结束。
    /// 这不会访问共享内存：在基于静止状态的方案中，读者被假定在下次报告静止之前
    /// 一直持有引用。
    #[inline]
    pub fn read_lock(&self) -> ReadGuard<'_> {
        assert!(
            self.is_online(),
            "read-side critical section entered while reader {} is offline",
            self.slot.id
        );

        self.nesting.set(self.nesting.get() + 1);

        ReadGuard { reader: self }
    }

    /// Report a quiescent state: no reference obtained before this point is
    /// still held.
    ///
    /// Advances this reader's record to the current global epoch, which lets
    /// every grace period that started at or before it make progress.
    ///
    /// 报告一个静止状态：此点之前获得的引用都不再被持有。
    /// 将此读者的记录推进到当前全局纪元，使所有在此之前或此时开始的宽限期得以推进。
    #[inline]
    pub fn quiescent(&mut self) {
        debug_assert_eq!(self.nesting.get(), 0);

        if !self.is_online() {
            return;
        }

        let epoch = self.shared.global_epoch.load(Ordering::SeqCst);
        self.slot.quiescent_epoch.store(epoch, Ordering::SeqCst);
    }

    /// Take this reader offline: grace periods stop waiting on it until it
    /// comes back `online()`.
    ///
    /// 将此读者下线：在它重新 `online()` 之前，宽限期不再等待它。
    #[inline]
    pub fn offline(&mut self) {
        debug_assert_eq!(self.nesting.get(), 0);
        self.slot
            .quiescent_epoch
            .store(OFFLINE_EPOCH, Ordering::SeqCst);
    }

    /// Bring this reader back online, quiescent at the current epoch.
    ///
    /// Like registration, the epoch is read and published under the reader
    /// table lock: a scan that still sees this slot offline has released the
    /// lock before the reader's next load, so that load observes every pointer
    /// swapped before the scan.
    ///
    /// 将此读者重新上线，并在当前纪元处于静止。
    /// 与注册一样，纪元在读者表锁下读取并发布：仍然看到此槽离线的扫描在读者下一次
    /// 加载之前已经释放了锁，因此该加载能观察到扫描之前交换的每个指针。
    pub fn online(&mut self) {
        debug_assert_eq!(self.nesting.get(), 0);

        let _readers = self.shared.readers.lock();
        let epoch = self.shared.global_epoch.load(Ordering::SeqCst);
        self.slot.quiescent_epoch.store(epoch, Ordering::SeqCst);
    }

    pub(crate) fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }
}

impl Drop for LocalReader {
    fn drop(&mut self) {
        let mut readers = self.shared.readers.lock();
        readers.retain(|slot| !Arc::ptr_eq(slot, &self.slot));
        drop(readers);

        debug!("rcu reader {} unregistered", self.slot.id);
    }
}

/// A guard that keeps its reader inside a read-side critical section.
///
/// `ReadGuard` is obtained by calling `LocalReader::read_lock()`. Its lifetime
/// is bound to the `LocalReader`, and references loaded through it are bound to
/// the guard, so nothing read under it can outlive the critical section.
///
/// Cloning increments the nesting count, allowing nested scopes to hold guards.
///
/// 保持其读者处于读端临界区内的守卫。
/// `ReadGuard` 通过调用 `LocalReader::read_lock()` 获得。它的生命周期被绑定到
/// `LocalReader`，通过它加载的引用被绑定到守卫，因此在其下读取的内容不能活得比临界区更久。
/// 克隆会增加嵌套计数，允许嵌套作用域持有守卫。
#[must_use]
pub struct ReadGuard<'a> {
    reader: &'a LocalReader,
}

impl<'a> ReadGuard<'a> {
    /// The reader this guard belongs to.
    /// 此守卫所属的读者。
    #[inline]
    pub fn reader(&self) -> &'a LocalReader {
        self.reader
    }
}

impl<'a> Clone for ReadGuard<'a> {
    #[inline]
    fn clone(&self) -> Self {
        let nesting = self.reader.nesting.get();

        assert!(
            nesting > 0,
            "BUG: Cloning a ReadGuard outside a critical section (nesting = 0). \
             This indicates incorrect API usage or a library bug."
        );

        self.reader.nesting.set(nesting + 1);

        ReadGuard {
            reader: self.reader,
        }
    }
}

impl<'a> Drop for ReadGuard<'a> {
    #[inline]
    fn drop(&mut self) {
        let nesting = self.reader.nesting.get();

        assert!(
            nesting > 0,
            "BUG: Dropping a ReadGuard outside a critical section (nesting = 0). \
             This indicates incorrect API usage or a library bug."
        );

        self.reader.nesting.set(nesting - 1);
    }
}
