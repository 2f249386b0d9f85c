use crate::config::{BenchConfig, WriterMode};
use std::fmt;
use std::io;
use std::time::Duration;

/// Which side of the benchmark a worker thread ran.
/// 工作线程在基准中所扮演的角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Reader,
    Writer,
}

impl Role {
    /// Lower-case name used in logs and errors.
    /// 日志和错误中使用的小写名称。
    pub fn name(self) -> &'static str {
        match self {
            Role::Reader => "reader",
            Role::Writer => "writer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What one worker thread did.
/// 单个工作线程的执行结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadStats {
    pub role: Role,
    pub id: usize,
    /// Completed reads or writes.
    /// 完成的读取或写入次数。
    pub ops: u64,
    /// Time spent in measured operations. Readers time their whole loop,
    /// writers only the write calls (pauses excluded).
    /// 被测量操作所花费的时间。读者计时整个循环，写入者只计时写入调用（不含停顿）。
    pub elapsed: Duration,
    /// Snapshots that broke the workload's predicate (readers only).
    /// 违反负载谓词的快照数（仅读者）。
    pub violations: u64,
    /// Rendering of the last snapshot (readers only).
    /// 最后一个快照的文本表示（仅读者）。
    pub last_observed: Option<String>,
}

/// Reclamation counters of an RCU run.
/// RCU 运行的回收计数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RcuStats {
    pub generation: u64,
    pub reclaimed: u64,
    pub retired: usize,
}

/// Aggregated result of one run.
/// 一次运行的汇总结果。
#[derive(Debug, Clone)]
pub struct Report {
    pub config: BenchConfig,
    pub workload: &'static str,
    pub readers: Vec<ThreadStats>,
    pub writers: Vec<ThreadStats>,
    pub final_value: String,
    pub rcu: Option<RcuStats>,
}

fn total_ops(stats: &[ThreadStats]) -> u64 {
    stats.iter().map(|s| s.ops).sum()
}

fn total_time(stats: &[ThreadStats]) -> Duration {
    stats.iter().map(|s| s.elapsed).sum()
}

fn cost_ns(stats: &[ThreadStats]) -> Option<f64> {
    if stats.is_empty() {
        return None;
    }
    let ops = total_ops(stats);
    if ops == 0 {
        return Some(0.0);
    }
    Some(total_time(stats).as_nanos() as f64 / ops as f64)
}

fn avg_secs(stats: &[ThreadStats]) -> f64 {
    if stats.is_empty() {
        return 0.0;
    }
    total_time(stats).as_secs_f64() / stats.len() as f64
}

impl Report {
    pub fn total_reads(&self) -> u64 {
        total_ops(&self.readers)
    }

    pub fn total_writes(&self) -> u64 {
        total_ops(&self.writers)
    }

    /// Nanoseconds per read, `None` without readers.
    /// 每次读取的纳秒数，没有读者时为 `None`。
    pub fn read_cost_ns(&self) -> Option<f64> {
        cost_ns(&self.readers)
    }

    /// Nanoseconds per write, `None` without writers.
    /// 每次写入的纳秒数，没有写入者时为 `None`。
    pub fn write_cost_ns(&self) -> Option<f64> {
        cost_ns(&self.writers)
    }

    /// Predicate violations summed over all readers.
    /// 所有读者的谓词违例总数。
    pub fn violations(&self) -> u64 {
        self.readers.iter().map(|s| s.violations).sum()
    }

    /// Quiet mode writes one number per line: cost per read, then cost per
    /// write, each only when that role had threads.
    ///
    /// 安静模式每行输出一个数字：先是每次读取的开销，然后是每次写入的开销，
    /// 每项只在该角色有线程时输出。
    pub fn write_to(&self, out: &mut impl io::Write, verbose: bool) -> io::Result<()> {
        if !verbose {
            if let Some(cost) = self.read_cost_ns() {
                writeln!(out, "{:.3}", cost)?;
            }
            if let Some(cost) = self.write_cost_ns() {
                writeln!(out, "{:.3}", cost)?;
            }
            return Ok(());
        }

        let config = &self.config;
        writeln!(
            out,
            "Reader threads running {} outer loops of {} reads",
            config.read_outer, config.read_inner
        )?;
        match config.writer_mode {
            WriterMode::FixedCount { outer, inner } => writeln!(
                out,
                "Writer threads running {} outer loops of {} writes",
                outer, inner
            )?,
            WriterMode::Gated { interval } => writeln!(
                out,
                "Writer threads running until readers finish, {}us between writes",
                interval.as_micros()
            )?,
        }
        writeln!(
            out,
            "Running with {} readers & {} writers",
            config.readers, config.writers
        )?;
        writeln!(out, "Synchronization method: {}", config.strategy)?;
        writeln!(out, "Workload: {}", self.workload)?;
        writeln!(out)?;

        for w in &self.writers {
            writeln!(
                out,
                "Finish w({}) @ {:.6}s after {} writes",
                w.id,
                w.elapsed.as_secs_f64(),
                w.ops
            )?;
        }
        for r in &self.readers {
            write!(out, "Finish r({}) @ {:.6}s", r.id, r.elapsed.as_secs_f64())?;
            if let Some(last) = &r.last_observed {
                write!(out, " w/ {}", last)?;
            }
            if r.violations > 0 {
                write!(out, " ({} inconsistent reads)", r.violations)?;
            }
            writeln!(out)?;
        }

        if let Some(cost) = self.read_cost_ns() {
            writeln!(
                out,
                "Read -- Avg time: {:.3}s | Cost per read: {:.3}ns",
                avg_secs(&self.readers),
                cost
            )?;
        }
        if let Some(cost) = self.write_cost_ns() {
            writeln!(
                out,
                "Write -- Avg time: {:.3}s | Cost per write: {:.3}ns",
                avg_secs(&self.writers),
                cost
            )?;
        }
        if let Some(rcu) = self.rcu {
            writeln!(
                out,
                "RCU -- generation {} | reclaimed {} | still retired {}",
                rcu.generation, rcu.reclaimed, rcu.retired
            )?;
        }
        if !config.strategy.applies_every_write() {
            writeln!(
                out,
                "Writes may be lost under {}; the final value is not checked",
                config.strategy
            )?;
        }
        writeln!(out, "Final value: {}", self.final_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::SyncKind;

    fn stats(role: Role, id: usize, ops: u64, millis: u64) -> ThreadStats {
        ThreadStats {
            role,
            id,
            ops,
            elapsed: Duration::from_millis(millis),
            violations: 0,
            last_observed: None,
        }
    }

    fn report(readers: Vec<ThreadStats>, writers: Vec<ThreadStats>) -> Report {
        let config = BenchConfig::builder(readers.len(), writers.len(), SyncKind::Lock)
            .build()
            .unwrap();
        Report {
            config,
            workload: "counter",
            readers,
            writers,
            final_value: "7".to_string(),
            rcu: None,
        }
    }

    #[test]
    fn costs_are_time_over_ops() {
        let report = report(
            vec![stats(Role::Reader, 0, 1000, 1), stats(Role::Reader, 1, 1000, 3)],
            vec![stats(Role::Writer, 0, 10, 1)],
        );
        assert_eq!(report.read_cost_ns(), Some(2000.0));
        assert_eq!(report.write_cost_ns(), Some(100_000.0));
    }

    #[test]
    fn quiet_output_skips_missing_roles() {
        let report = report(Vec::new(), vec![stats(Role::Writer, 0, 4, 1)]);
        let mut out = Vec::new();
        report.write_to(&mut out, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "250000.000\n");
    }

    #[test]
    fn verbose_output_ends_with_final_value() {
        let report = report(vec![stats(Role::Reader, 0, 1, 1)], Vec::new());
        let mut out = Vec::new();
        report.write_to(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Synchronization method: LOCK"));
        assert!(text.contains("Finish r(0)"));
        assert!(text.trim_end().ends_with("Final value: 7"));
        assert!(!text.contains("Writes may be lost"));
    }

    #[test]
    fn verbose_output_flags_lost_writes_under_race() {
        let mut report = report(vec![stats(Role::Reader, 0, 1, 1)], Vec::new());
        report.config.strategy = SyncKind::Race;
        let mut out = Vec::new();
        report.write_to(&mut out, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Writes may be lost under RACE"));
        assert!(text.trim_end().ends_with("Final value: 7"));
    }
}
