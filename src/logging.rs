//! Tracing initialization.
//! Builds a subscriber with EnvFilter, supports compact or JSON formats, and optional file logging.
//!
//! Behavior:
//! - Log level is driven by `Config::log_level`.
//! - JSON/compact stdout formatting is selected via `Config::json_logs`.
//! - If `Config::log_file` is set and passes safety checks, a non-blocking file layer is added.
//! - A second initialization returns an error instead of panicking.
//!
//! File logging uses tracing_appender::non_blocking; the returned WorkerGuard must be
//! held until shutdown to flush buffered lines. File logging is refused if any ancestor
//! of the log path is a symlink.

use anyhow::{Context, Result};
use chrono::Local;
use std::fmt as stdfmt;
use std::path::Path;
use tracing::warn;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Config, LogLevel, path_has_symlink_ancestor};
use crate::platform::open_log_file_secure_append;

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS)
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%d/%m/%y %H:%M:%S"))
    }
}

#[inline]
fn to_level_filter(lvl: &LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

#[inline]
fn env_filter_from_level(level_filter: LevelFilter) -> EnvFilter {
    let level_str = match level_filter {
        LevelFilter::ERROR => "error",
        LevelFilter::WARN => "warn",
        LevelFilter::INFO => "info",
        LevelFilter::DEBUG => "debug",
        LevelFilter::TRACE => "trace",
        _ => "info",
    };
    EnvFilter::new(level_str)
}

/// Open a non-blocking file writer for logging.
/// Refuses symlinked ancestors and reports why file logging stays off.
fn open_non_blocking_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let has_link = path_has_symlink_ancestor(path)
        .with_context(|| format!("check log path '{}' for symlinks", path.display()))?;
    if has_link {
        anyhow::bail!("ancestor of log path '{}' is a symlink", path.display());
    }
    let file = open_log_file_secure_append(path)
        .with_context(|| format!("open log file '{}'", path.display()))?;
    Ok(tracing_appender::non_blocking(file))
}

/// Initialize tracing from the config. Returns an optional WorkerGuard if a file
/// appender was created.
pub fn init_tracing(cfg: &Config) -> Result<Option<WorkerGuard>> {
    let env_filter = env_filter_from_level(to_level_filter(&cfg.log_level));

    // A refused log file degrades to stdout-only logging; the reason is logged once the
    // subscriber is up.
    let mut file_error = None;
    let file_writer = match cfg.log_file.as_deref() {
        Some(path) => match open_non_blocking_writer(path) {
            Ok(pair) => Some(pair),
            Err(e) => {
                file_error = Some(e);
                None
            }
        },
        None => None,
    };

    let guard = match (file_writer, cfg.json_logs) {
        (Some((writer, guard)), true) => {
            let stdout_layer = tsfmt::layer()
                .event_format(tsfmt::format().json())
                .with_timer(LocalHumanTime)
                .with_level(true)
                .with_target(true)
                .with_thread_ids(true);
            let file_layer = tsfmt::layer()
                .event_format(tsfmt::format().json())
                .with_timer(LocalHumanTime)
                .with_level(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(writer);
            registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .try_init()
                .context("install tracing subscriber")?;
            Some(guard)
        }
        (Some((writer, guard)), false) => {
            let stdout_layer = tsfmt::layer()
                .with_timer(LocalHumanTime)
                .with_level(true)
                .with_target(true)
                .with_thread_ids(true)
                .compact();
            let file_layer = tsfmt::layer()
                .with_timer(LocalHumanTime)
                .with_level(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .compact()
                .with_writer(writer);
            registry()
                .with(env_filter)
                .with(stdout_layer)
                .with(file_layer)
                .try_init()
                .context("install tracing subscriber")?;
            Some(guard)
        }
        (None, true) => {
            let stdout_layer = tsfmt::layer()
                .event_format(tsfmt::format().json())
                .with_timer(LocalHumanTime)
                .with_level(true)
                .with_target(true)
                .with_thread_ids(true);
            registry()
                .with(env_filter)
                .with(stdout_layer)
                .try_init()
                .context("install tracing subscriber")?;
            None
        }
        (None, false) => {
            let stdout_layer = tsfmt::layer()
                .with_timer(LocalHumanTime)
                .with_level(true)
                .with_target(true)
                .with_thread_ids(true)
                .compact();
            registry()
                .with(env_filter)
                .with(stdout_layer)
                .try_init()
                .context("install tracing subscriber")?;
            None
        }
    };

    if let Some(e) = file_error {
        warn!("file logging not enabled: {e:#}; logs continue to stdout");
    }
    Ok(guard)
}
