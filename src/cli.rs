// src/cli.rs

//! Command line of the `linkflow` binary.
//!
//! One invocation runs one instance of one flow. STDOUT gets the summary
//! line `flow '<name>' <state>` followed by one `  <task>: <status>` line per
//! task; the exit code is 0 only when the flow completed.

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(
    name = "linkflow",
    version,
    about = "Run a flow of shell tasks connected by typed links.",
    after_help = "Exit status is 0 when the flow completes, 1 when it fails, is cancelled or cannot be loaded."
)]
pub struct CliArgs {
    /// Flow definition to run.
    #[arg(short, long, value_name = "PATH", default_value = "Flow.toml")]
    pub flow: String,

    /// Overrides `LINKFLOW_LOG`.
    #[arg(short, long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate the flow and list its tasks and links without running anything.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

pub fn parse() -> CliArgs {
    CliArgs::parse()
}
