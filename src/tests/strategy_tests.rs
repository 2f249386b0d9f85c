/// 同步策略测试模块
/// 测试策略名称解析、共享单元的读写和不支持的组合
use crate::workload::RecordPayload;
use crate::{
    BenchError, Counter, GrowableList, RcuDomain, Record, ReclaimMode, SharedCell, SyncKind,
    Timestamp, Workload,
};
use std::thread;

/// 测试1: 策略名称与解析互逆，大小写敏感
#[test]
fn test_sync_kind_names_round_trip() {
    for kind in SyncKind::ALL {
        assert_eq!(kind.name().parse::<SyncKind>(), Ok(kind));
        assert_eq!(kind.to_string(), kind.name());
    }

    assert_eq!(
        "rcu".parse::<SyncKind>(),
        Err(BenchError::UnknownStrategy("rcu".to_string()))
    );
    assert_eq!(
        "SPINLOCK".parse::<SyncKind>(),
        Err(BenchError::UnknownStrategy("SPINLOCK".to_string()))
    );
}

/// 测试2: 只有 RACE 放弃一致性保证
#[test]
fn test_only_race_gives_up_guarantees() {
    for kind in SyncKind::ALL {
        let strict = kind != SyncKind::Race;
        assert_eq!(kind.is_consistent(), strict);
        assert_eq!(kind.applies_every_write(), strict);
    }
}

/// 测试3: 每种策略单线程写入后结果相同
#[test]
fn test_every_strategy_counts_single_threaded() {
    for kind in SyncKind::ALL {
        let shared = SharedCell::new(kind, Counter).unwrap();
        assert_eq!(shared.kind(), kind);
        assert_eq!(shared.strategy().kind(), kind);

        // 同一线程的 RCU 读者注册会阻塞同步写入，因此写入前先关闭会话
        assert_eq!(shared.session().read(), 0);

        for _ in 0..10 {
            shared.write();
        }
        assert_eq!(shared.session().read(), 10, "{}", kind);

        assert_eq!(shared.final_value(), 10, "{}", kind);
    }
}

/// 测试4: ATOMIC 只支持机器字负载
#[test]
fn test_atomic_rejects_non_scalar_payloads() {
    let err = SharedCell::new(SyncKind::Atomic, GrowableList::default())
        .err()
        .unwrap();
    assert!(matches!(err, BenchError::Unsupported { ref workload, .. } if workload == "list"));

    assert!(SharedCell::new(SyncKind::Atomic, Record).is_err());
    assert!(SharedCell::new(SyncKind::Atomic, Timestamp).is_err());
    assert!(SharedCell::new(SyncKind::Atomic, Counter).is_ok());
}

/// 测试5: 只有 RCU 会话携带读者注册
#[test]
fn test_only_rcu_sessions_register() {
    let domain = RcuDomain::new();

    let rcu = SharedCell::with_domain(SyncKind::Rcu, Counter, ReclaimMode::Synchronous, &domain)
        .unwrap();
    let session = rcu.session();
    assert!(session.reader().is_some());
    assert_eq!(domain.reader_count(), 1);
    drop(session);
    assert_eq!(domain.reader_count(), 0);

    let lock = SharedCell::with_domain(SyncKind::Lock, Counter, ReclaimMode::Synchronous, &domain)
        .unwrap();
    assert!(lock.session().reader().is_none());
    assert!(lock.rcu().is_none());
}

/// 测试6: 延迟回收的 RCU 单元在 flush 后清空
#[test]
fn test_flush_drains_deferred_rcu() {
    let domain = RcuDomain::new();
    let shared =
        SharedCell::with_domain(SyncKind::Rcu, Counter, ReclaimMode::Deferred, &domain).unwrap();

    let mut session = shared.session();
    for _ in 0..10 {
        shared.write();
    }
    assert_eq!(session.read(), 10);
    assert_eq!(shared.rcu().unwrap().retired_len(), 10);

    session.quiescent();
    drop(session);

    shared.flush();
    let cell = shared.rcu().unwrap();
    assert_eq!(cell.retired_len(), 0);
    assert_eq!(cell.reclaimed_count(), 10);
    assert_eq!(cell.generation(), 10);
}

/// 测试7: 记录负载在加锁策略下保持一致
#[test]
fn test_record_consistent_under_locking_strategies() {
    for kind in [SyncKind::Rcu, SyncKind::RwLock, SyncKind::Lock] {
        let shared = SharedCell::new(kind, Record).unwrap();
        let workload = shared.workload();

        thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    let mut session = shared.session();
                    let mut last = workload.initial();
                    for _ in 0..100 {
                        for _ in 0..10 {
                            let next = session.read();
                            assert!(workload.is_consistent(&last, &next), "{}", kind);
                            last = next;
                        }
                        session.quiescent();
                    }
                });
            }

            for _ in 0..2 {
                s.spawn(|| {
                    for _ in 0..50 {
                        shared.write();
                    }
                });
            }
        });

        assert_eq!(
            shared.final_value(),
            RecordPayload {
                a: 101,
                b: 203,
                c: 305
            },
            "{}",
            kind
        );
    }
}
