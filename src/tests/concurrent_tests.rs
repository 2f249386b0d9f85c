/// 并发测试模块
/// 测试多读者多写入者场景下的可见性、单调性和内存安全
use crate::{RcuCell, RcuDomain};
use std::thread;

/// 测试1: 读者只看到已发布的实例，且代数单调不减
#[test]
fn test_readers_only_observe_published_versions() {
    let domain = RcuDomain::new();
    // 值始终等于代数
    let cell = RcuCell::new(&domain, 0u64);

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let mut reader = domain.register_reader();
                let mut last = 0u64;
                for _ in 0..200 {
                    for _ in 0..50 {
                        let guard = reader.read_lock();
                        let version = cell.load(&guard);
                        assert_eq!(**version, version.generation());
                        assert!(version.generation() >= last);
                        last = version.generation();
                    }
                    reader.quiescent();
                }
            });
        }

        for _ in 0..2 {
            s.spawn(|| {
                for _ in 0..100 {
                    cell.update(|v| v + 1);
                }
            });
        }
    });

    assert_eq!(cell.generation(), 200);
    assert_eq!(cell.retired_len(), 0);
    assert_eq!(cell.reclaimed_count(), 200);

    let reader = domain.register_reader();
    assert_eq!(cell.snapshot(&reader), 200);
}

/// 测试2: 堆上负载在并发更新下保持完整
#[test]
fn test_heap_payload_never_torn() {
    let domain = RcuDomain::new();
    let cell = RcuCell::new(&domain, Vec::<usize>::new());

    thread::scope(|s| {
        for _ in 0..3 {
            s.spawn(|| {
                let mut reader = domain.register_reader();
                for _ in 0..300 {
                    cell.read(&reader, |values| {
                        for (i, v) in values.iter().enumerate() {
                            assert_eq!(i, *v);
                        }
                    });
                    reader.quiescent();
                }
            });
        }

        for _ in 0..2 {
            s.spawn(|| {
                for _ in 0..150 {
                    cell.update(|old| {
                        let mut next = old.clone();
                        next.push(next.len());
                        next
                    });
                }
            });
        }
    });

    let reader = domain.register_reader();
    let values = cell.snapshot(&reader);
    assert_eq!(values.len(), 300);
    assert!(values.iter().enumerate().all(|(i, v)| i == *v));
}

/// 测试3: 延迟回收模式下并发更新，结束后全部回收
#[test]
fn test_deferred_updates_with_concurrent_readers() {
    let domain = RcuDomain::builder().reclaim_threshold(8usize).build();
    let cell = RcuCell::new(&domain, String::from("0"));

    thread::scope(|s| {
        for _ in 0..3 {
            s.spawn(|| {
                let mut reader = domain.register_reader();
                for _ in 0..500 {
                    let n: u64 = cell.read(&reader, |text| text.parse().unwrap());
                    assert!(n <= 400);
                    reader.quiescent();
                }
            });
        }

        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..100 {
                    cell.update_deferred(|old| {
                        let n: u64 = old.parse().unwrap();
                        (n + 1).to_string()
                    });
                }
            });
        }
    });

    cell.reclaim_all();
    assert_eq!(cell.retired_len(), 0);
    assert_eq!(cell.reclaimed_count(), 400);
    assert_eq!(cell.generation(), 400);
}

/// 测试4: 读者在运行中途注册和注销
#[test]
fn test_readers_come_and_go() {
    let domain = RcuDomain::new();
    let cell = RcuCell::new(&domain, 0u32);

    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..20 {
                let mut reader = domain.register_reader();
                for _ in 0..10 {
                    let _ = cell.read(&reader, |v| *v);
                    reader.quiescent();
                }
                // reader 在此注销
            }
        });

        s.spawn(|| {
            for _ in 0..100 {
                cell.update(|v| v + 1);
            }
        });
    });

    assert_eq!(domain.reader_count(), 0);
    assert_eq!(cell.generation(), 100);
    assert_eq!(cell.retired_len(), 0);
}
