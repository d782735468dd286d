//! Tracing setup: console output plus a rolling JSON log file

use crate::config::{LogConfig, LogRotation};
use anyhow::Context;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FILE_NAME: &str = "infer.log";

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Minutely => Rotation::MINUTELY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

/// Filter directive for the `seqcls` crates
pub fn filter_directive(verbose: bool, level: &str) -> anyhow::Result<String> {
    if verbose {
        return Ok("seqcls=debug".to_string());
    }
    let level: LevelFilter = level
        .parse()
        .with_context(|| format!("invalid log level '{}'", level))?;
    Ok(format!("seqcls={}", level.to_string().to_lowercase()))
}

/// Rolling file appender for `infer.log` in `log_dir`
///
/// With `never` the file is exactly `infer.log`; other rotations append the
/// period to the name, e.g. `infer.log.2026-10-19` for `daily`.
pub fn log_appender(log: &LogConfig, log_dir: &Path) -> RollingFileAppender {
    RollingFileAppender::new(log.rotation.into(), log_dir, LOG_FILE_NAME)
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer on drop and must be held
/// until the program exits.
pub fn init_tracing(verbose: bool, log: &LogConfig, log_dir: &Path) -> anyhow::Result<WorkerGuard> {
    let directive = filter_directive(verbose, &log.level)?;

    let console_filter = if verbose {
        EnvFilter::new(&directive)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive))
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(log_appender(log, log_dir));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(console_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(EnvFilter::new(&directive)),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}
