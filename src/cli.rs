use anyhow::{Context, Result, bail};
use clap::Parser;
use rcu_bench::{SyncKind, WorkloadKind};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version)]
#[command(name = "rcu-bench")]
#[command(
    about = "Measures read and write cost of RCU against lock, atomic and unsynchronized sharing",
    long_about = None
)]
pub struct Cli {
    /// Number of reader threads.
    pub readers: usize,

    /// Number of writer threads.
    pub writers: usize,

    /// Synchronization method: RCU, RWLOCK, LOCK, ATOMIC or RACE.
    pub strategy: SyncKind,

    /// Outer read loop count; readers report a quiescent state after each.
    pub rd_outer: usize,

    /// Reads per outer loop.
    pub rd_inner: usize,

    /// Outer write loop count. Required unless --write-interval-us is given.
    #[arg(value_name = "WR_OUTER")]
    pub wr_outer: Option<String>,

    /// Writes per outer loop. Required unless --write-interval-us is given.
    #[arg(value_name = "WR_INNER")]
    pub wr_inner: Option<String>,

    /// Any value here switches to quiet output.
    #[arg(hide = true)]
    pub quiet_marker: Option<String>,

    /// Payload mutated by writers.
    #[arg(long, default_value_t = WorkloadKind::Counter)]
    pub workload: WorkloadKind,

    /// Keep writing, this many microseconds apart, until all readers finish.
    #[arg(long, value_name = "US")]
    pub write_interval_us: Option<u64>,

    /// Pause between two fixed-count writes, in microseconds.
    #[arg(long, value_name = "US", default_value_t = 1)]
    pub write_pause_us: u64,

    /// Reclaim retired RCU instances in batches instead of after every write.
    #[arg(long)]
    pub rcu_deferred: bool,

    /// Seed for the list workload.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Print only the cost per read and per write.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Writer loop shape resolved from the trailing positionals and
/// `--write-interval-us`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteLoops {
    Fixed { outer: usize, inner: usize },
    Gated { interval: Duration },
}

impl Cli {
    /// Positionals after RD_INNER, in order. In gated mode there are no write
    /// counts, so the first of them is already the quiet marker.
    fn trailing(&self) -> Vec<&str> {
        [&self.wr_outer, &self.wr_inner, &self.quiet_marker]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect()
    }

    pub fn write_loops(&self) -> Result<WriteLoops> {
        let trailing = self.trailing();

        if let Some(us) = self.write_interval_us {
            if trailing.len() > 1 {
                bail!("WR_OUTER and WR_INNER cannot be combined with --write-interval-us");
            }
            return Ok(WriteLoops::Gated {
                interval: Duration::from_micros(us),
            });
        }

        match trailing.as_slice() {
            [outer, inner, ..] => Ok(WriteLoops::Fixed {
                outer: parse_count("WR_OUTER", outer)?,
                inner: parse_count("WR_INNER", inner)?,
            }),
            _ => bail!(
                "writer loop counts WR_OUTER and WR_INNER are required without --write-interval-us"
            ),
        }
    }

    pub fn is_quiet(&self) -> bool {
        let marker_position = if self.write_interval_us.is_some() { 1 } else { 3 };
        self.quiet || self.trailing().len() >= marker_position
    }
}

fn parse_count(name: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .with_context(|| format!("{} must be a non-negative integer, got '{}'", name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("rcu-bench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn fixed_counts_without_marker_are_verbose() {
        let cli = parse(&["4", "2", "RCU", "10", "100", "5", "20"]);
        assert_eq!(
            cli.write_loops().unwrap(),
            WriteLoops::Fixed { outer: 5, inner: 20 }
        );
        assert!(!cli.is_quiet());
    }

    #[test]
    fn marker_after_fixed_counts_is_quiet() {
        let cli = parse(&["4", "2", "LOCK", "10", "100", "5", "20", "Q"]);
        assert_eq!(
            cli.write_loops().unwrap(),
            WriteLoops::Fixed { outer: 5, inner: 20 }
        );
        assert!(cli.is_quiet());
    }

    #[test]
    fn marker_with_write_interval_is_quiet() {
        let cli = parse(&["2", "1", "RCU", "10", "100", "Q", "--write-interval-us", "5"]);
        assert_eq!(
            cli.write_loops().unwrap(),
            WriteLoops::Gated {
                interval: Duration::from_micros(5)
            }
        );
        assert!(cli.is_quiet());

        let cli = parse(&["2", "1", "RCU", "10", "100", "--write-interval-us", "5"]);
        assert!(!cli.is_quiet());
        assert!(parse(&["2", "1", "RCU", "10", "100", "-q", "--write-interval-us", "5"]).is_quiet());
    }

    #[test]
    fn counts_conflict_with_write_interval() {
        let cli = parse(&["2", "1", "RCU", "10", "100", "5", "20", "--write-interval-us", "5"]);
        assert!(cli.write_loops().is_err());
    }

    #[test]
    fn missing_or_malformed_counts_rejected() {
        assert!(parse(&["2", "1", "RCU", "10", "100"]).write_loops().is_err());
        assert!(parse(&["2", "1", "RCU", "10", "100", "5"]).write_loops().is_err());

        let err = parse(&["2", "1", "RCU", "10", "100", "five", "20"])
            .write_loops()
            .unwrap_err();
        assert!(err.to_string().contains("WR_OUTER"));
    }

    #[test]
    fn unknown_strategy_is_a_parse_error() {
        let args = ["rcu-bench", "2", "1", "SPIN", "10", "100", "5", "20"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
