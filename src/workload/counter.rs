use super::{ScalarWord, Workload};

/// A `u64` counter bumped by one per write.
/// 每次写入加一的 `u64` 计数器。
#[derive(Debug, Clone, Copy, Default)]
pub struct Counter;

impl Workload for Counter {
    type Payload = u64;

    fn name(&self) -> &'static str {
        "counter"
    }

    fn initial(&self) -> u64 {
        0
    }

    #[inline]
    fn apply(&self, payload: &mut u64) {
        *payload += 1;
    }

    #[inline]
    fn is_consistent(&self, prev: &u64, next: &u64) -> bool {
        prev <= next
    }

    fn scalar(&self) -> Option<ScalarWord<u64>> {
        Some(ScalarWord {
            encode: |value| *value,
            decode: |word| word,
            delta: 1,
        })
    }

    fn tolerates_torn_reads(&self) -> bool {
        true
    }

    fn describe(&self, payload: &u64) -> String {
        payload.to_string()
    }
}
