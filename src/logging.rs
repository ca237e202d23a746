// src/logging.rs

//! Diagnostics for a flow run.
//!
//! Task transitions, repeats and activity stderr are `tracing` events on
//! STDERR. STDOUT is reserved for the final flow summary (or the dry-run
//! listing), so a caller can capture it without filtering log lines.
//!
//! The filter comes from `--log-level` when given. Otherwise `LINKFLOW_LOG`
//! is read as an `EnvFilter` directive string, so per-module settings such
//! as `info,linkflow::engine=debug` work. Without either, `info` applies.

use anyhow::Result;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "LINKFLOW_LOG";

/// Install the global stderr subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialising logging: {e}"))?;

    Ok(())
}

/// CLI level, then `LINKFLOW_LOG` directives, then `info`.
///
/// A malformed `LINKFLOW_LOG` is an error rather than a silent fallback.
fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(LevelFilter::from(level).to_string()));
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| anyhow::anyhow!("invalid {LOG_ENV} value '{directives}': {e}")),
        None => Ok(EnvFilter::new("info")),
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}
