use super::Workload;

/// Three fields that always move together.
/// 总是一起变化的三个字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPayload {
    pub a: i64,
    pub b: i64,
    pub c: i64,
}

impl RecordPayload {
    /// `b` and `c` are fixed multiples of `a`'s distance from its start.
    /// `b` 和 `c` 是 `a` 相对起点距离的固定倍数。
    pub fn is_well_formed(&self) -> bool {
        let steps = self.a - 1;
        self.b - 3 == 2 * steps && self.c - 5 == 3 * steps
    }
}

/// Composite record starting at `(1, 3, 5)`; each write adds `(1, 2, 3)`.
/// 从 `(1, 3, 5)` 开始的复合记录；每次写入加上 `(1, 2, 3)`。
#[derive(Debug, Clone, Copy, Default)]
pub struct Record;

impl Workload for Record {
    type Payload = RecordPayload;

    fn name(&self) -> &'static str {
        "record"
    }

    fn initial(&self) -> RecordPayload {
        RecordPayload { a: 1, b: 3, c: 5 }
    }

    #[inline]
    fn apply(&self, payload: &mut RecordPayload) {
        payload.a += 1;
        payload.b += 2;
        payload.c += 3;
    }

    fn is_consistent(&self, prev: &RecordPayload, next: &RecordPayload) -> bool {
        next.is_well_formed() && prev.a <= next.a
    }

    fn tolerates_torn_reads(&self) -> bool {
        true
    }

    fn describe(&self, payload: &RecordPayload) -> String {
        format!("a={} b={} c={}", payload.a, payload.b, payload.c)
    }
}
