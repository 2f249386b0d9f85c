//! Loom-based concurrency tests
//!
//! These tests use the `loom` library to exhaustively check the thread
//! interleavings of the RCU read path, publish, and grace-period wait.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`

#![cfg(feature = "loom")]

use loom::sync::Arc;
use loom::sync::atomic::{AtomicBool, Ordering};
use loom::thread;
use rcu_bench::{RcuCell, RcuDomain};

fn domain() -> RcuDomain {
    // Yield on every failed poll; loom explores yields, not spins.
    RcuDomain::builder().spin_limit(0).build()
}

/// Test: Multiple readers can safely read concurrently
#[test]
fn loom_concurrent_readers() {
    loom::model(|| {
        let domain = domain();
        let cell = Arc::new(RcuCell::new(&domain, 42i32));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let domain = domain.clone();
                let cell = Arc::clone(&cell);
                thread::spawn(move || {
                    let reader = domain.register_reader();
                    let guard = reader.read_lock();
                    assert_eq!(**cell.load(&guard), 42);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    });
}

/// Test: A reader sees either the old or the new instance, never anything else
#[test]
fn loom_reader_sees_old_or_new() {
    loom::model(|| {
        let domain = domain();
        let cell = Arc::new(RcuCell::new(&domain, 1i32));

        let reader_domain = domain.clone();
        let reader_cell = Arc::clone(&cell);
        let reader_handle = thread::spawn(move || {
            let reader = reader_domain.register_reader();
            let guard = reader.read_lock();
            let version = reader_cell.load(&guard);
            assert!(**version == 1 || **version == 2);
            assert_eq!(version.generation() + 1, **version as u64);
        });

        cell.update_deferred(|_| 2);

        reader_handle.join().unwrap();
        cell.reclaim_all();
        assert_eq!(cell.retired_len(), 0);
    });
}

/// Test: Synchronous update waits for the reader's quiescent state before freeing
#[test]
fn loom_update_waits_for_quiescent_reader() {
    loom::model(|| {
        let domain = domain();
        let cell = Arc::new(RcuCell::new(&domain, 1i32));

        // Registered before the writer runs, so the writer must wait for it.
        let mut reader = domain.register_reader();
        let reader_cell = Arc::clone(&cell);
        let reader_handle = thread::spawn(move || {
            {
                let guard = reader.read_lock();
                let value = **reader_cell.load(&guard);
                assert!(value == 1 || value == 2);
            }
            reader.quiescent();
        });

        assert_eq!(cell.update(|v| v + 1), 1);
        assert_eq!(cell.retired_len(), 0);

        reader_handle.join().unwrap();
    });
}

/// Test: An offline reader never blocks a writer
#[test]
fn loom_offline_reader_not_waited_on() {
    loom::model(|| {
        let domain = domain();
        let cell = Arc::new(RcuCell::new(&domain, 0u32));

        let mut reader = domain.register_reader();
        reader.offline();

        let writer_cell = Arc::clone(&cell);
        let writer_handle = thread::spawn(move || {
            writer_cell.update(|v| v + 1);
        });

        writer_handle.join().unwrap();

        reader.online();
        assert_eq!(cell.snapshot(&reader), 1);
    });
}

/// Payload whose initial instance raises a flag when it is destroyed
struct Tracked {
    value: u32,
    dropped: Option<Arc<AtomicBool>>,
}

impl Drop for Tracked {
    fn drop(&mut self) {
        if let Some(flag) = &self.dropped {
            flag.store(true, Ordering::SeqCst);
        }
    }
}

/// Test: A reader coming back online never loads an instance already reclaimed
#[test]
fn loom_online_reader_never_sees_reclaimed() {
    loom::model(|| {
        let domain = domain();
        let dropped = Arc::new(AtomicBool::new(false));
        let cell = Arc::new(RcuCell::new(
            &domain,
            Tracked {
                value: 0,
                dropped: Some(Arc::clone(&dropped)),
            },
        ));

        let mut reader = domain.register_reader();
        reader.offline();

        let reader_cell = Arc::clone(&cell);
        let reader_dropped = Arc::clone(&dropped);
        let reader_handle = thread::spawn(move || {
            reader.online();
            let guard = reader.read_lock();
            let version = reader_cell.load(&guard);
            if version.generation() == 0 {
                assert!(
                    !reader_dropped.load(Ordering::SeqCst),
                    "reader holds reclaimed generation 0"
                );
                assert_eq!(version.value, 0);
            } else {
                assert_eq!(version.value, 1);
            }
        });

        cell.update(|old| Tracked {
            value: old.value + 1,
            dropped: None,
        });

        reader_handle.join().unwrap();
        assert!(dropped.load(Ordering::SeqCst));
    });
}

/// Test: Two writers both publish and the generations stay dense
#[test]
fn loom_two_writers() {
    loom::model(|| {
        let domain = domain();
        let cell = Arc::new(RcuCell::new(&domain, 0u64));

        let other = Arc::clone(&cell);
        let handle = thread::spawn(move || other.update_deferred(|v| v + 1));

        let mine = cell.update_deferred(|v| v + 1);
        let theirs = handle.join().unwrap();

        assert_ne!(mine, theirs);
        assert_eq!(mine.max(theirs), 2);
        assert_eq!(cell.generation(), 2);
        assert_eq!(cell.reclaim_all(), 2);
    });
}
