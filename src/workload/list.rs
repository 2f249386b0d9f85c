use super::Workload;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Initial length of the list.
/// 列表的初始长度。
pub const DEFAULT_LIST_LEN: usize = 100;

/// The list stops growing at this length.
/// 列表达到此长度后停止增长。
pub const MAX_LIST_LEN: usize = 30_000;

/// A growable list of counters together with the generator that picks which
/// slot the next write bumps.
///
/// Carrying the generator inside the payload keeps `mutate` a pure function of
/// the old payload, and makes the growth sequence a function of the seed alone.
///
/// 一个可增长的计数器列表，以及选择下一次写入递增哪个槽位的随机数生成器。
/// 将生成器放在负载内部使 `mutate` 成为旧负载的纯函数，并使增长序列只取决于种子。
#[derive(Debug, Clone, PartialEq)]
pub struct ListPayload {
    pub values: Vec<u32>,
    rng: StdRng,
}

impl ListPayload {
    /// Number of slots.
    /// 槽位数量。
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all slots; equals the number of writes applied so far.
    /// 所有槽位之和；等于目前已应用的写入次数。
    pub fn sum(&self) -> u64 {
        self.values.iter().map(|&v| u64::from(v)).sum()
    }
}

/// Each write picks `idx` uniformly in `[0, len)`, bumps `values[idx]`, and
/// appends a zero when `idx` lands in the last tenth (`idx > 0.9 * len`) while
/// the list is shorter than `max_len`.
///
/// 每次写入在 `[0, len)` 中均匀选取 `idx`，递增 `values[idx]`，并且当 `idx` 落在最后十分之一
/// （`idx > 0.9 * len`）且列表短于 `max_len` 时追加一个零。
#[derive(Debug, Clone, Copy)]
pub struct GrowableList {
    pub seed: u64,
    pub initial_len: usize,
    pub max_len: usize,
}

impl GrowableList {
    /// Default lengths with the given seed.
    /// 使用给定种子和默认长度。
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            initial_len: DEFAULT_LIST_LEN,
            max_len: MAX_LIST_LEN,
        }
    }
}

impl Default for GrowableList {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Workload for GrowableList {
    type Payload = ListPayload;

    fn name(&self) -> &'static str {
        "list"
    }

    fn initial(&self) -> ListPayload {
        ListPayload {
            values: vec![0; self.initial_len.max(1)],
            rng: StdRng::seed_from_u64(self.seed),
        }
    }

    fn apply(&self, payload: &mut ListPayload) {
        let len = payload.values.len();
        let idx = payload.rng.gen_range(0..len);
        payload.values[idx] += 1;

        if idx * 10 > len * 9 && len < self.max_len {
            payload.values.push(0);
        }
    }

    fn is_consistent(&self, prev: &ListPayload, next: &ListPayload) -> bool {
        !next.is_empty() && prev.len() <= next.len() && next.len() <= self.max_len
    }

    fn describe(&self, payload: &ListPayload) -> String {
        format!("len {} & sum {}", payload.len(), payload.sum())
    }
}
