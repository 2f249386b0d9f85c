mod cli;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use cli::{Cli, WriteLoops};
use env_logger::Env;
use log::info;
use rcu_bench::{BenchConfig, ReclaimMode, run_config};
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            eprintln!("{}", Cli::command().render_usage());
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    info!("{:?}", config);

    let report = run_config(&config).context("benchmark run failed")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    report
        .write_to(&mut out, config.verbose)
        .context("failed to write report")?;
    out.flush()?;

    Ok(())
}

fn build_config(cli: &Cli) -> Result<BenchConfig> {
    let mut builder = BenchConfig::builder(cli.readers, cli.writers, cli.strategy)
        .reads(cli.rd_outer, cli.rd_inner)
        .workload(cli.workload)
        .write_pause(Duration::from_micros(cli.write_pause_us))
        .seed(cli.seed)
        .verbose(!cli.is_quiet());

    if cli.rcu_deferred {
        builder = builder.reclaim(ReclaimMode::Deferred);
    }

    builder = match cli.write_loops()? {
        WriteLoops::Fixed { outer, inner } => builder.fixed_writes(outer, inner),
        WriteLoops::Gated { interval } => builder.gated_writes(interval),
    };

    Ok(builder.build()?)
}
