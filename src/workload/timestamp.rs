use super::Workload;
use time::OffsetDateTime;

const TIMESTAMP_LEN: usize = "DD-MM-YYYY HH-MM-SS".len();

/// A string holding the time of the latest write, `DD-MM-YYYY HH-MM-SS` (UTC).
/// 保存最近一次写入时间的字符串，格式为 `DD-MM-YYYY HH-MM-SS`（UTC）。
#[derive(Debug, Clone, Copy, Default)]
pub struct Timestamp;

impl Timestamp {
    /// Render `now` day first.
    /// 以日期在前的格式渲染 `now`。
    pub fn format(now: OffsetDateTime) -> String {
        format!(
            "{:02}-{:02}-{:04} {:02}-{:02}-{:02}",
            now.day(),
            u8::from(now.month()),
            now.year(),
            now.hour(),
            now.minute(),
            now.second()
        )
    }

    /// Digits everywhere except the separators at their fixed positions.
    /// 除固定位置的分隔符外全部是数字。
    pub fn is_well_formed(s: &str) -> bool {
        s.len() == TIMESTAMP_LEN
            && s.bytes().enumerate().all(|(i, b)| match i {
                2 | 5 | 13 | 16 => b == b'-',
                10 => b == b' ',
                _ => b.is_ascii_digit(),
            })
    }
}

impl Workload for Timestamp {
    type Payload = String;

    fn name(&self) -> &'static str {
        "timestamp"
    }

    fn initial(&self) -> String {
        String::new()
    }

    fn apply(&self, payload: &mut String) {
        *payload = Self::format(OffsetDateTime::now_utc());
    }

    fn is_consistent(&self, _prev: &String, next: &String) -> bool {
        next.is_empty() || Self::is_well_formed(next)
    }

    fn describe(&self, payload: &String) -> String {
        format!("\"{}\"", payload)
    }
}
