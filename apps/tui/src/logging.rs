//! Tracing setup.
//!
//! The terminal UI owns stdout, so interactive sessions log to a file through a
//! non-blocking writer. Headless runs log to stderr and keep stdout for the
//! report. `DEBUG` (or `--debug`) raises the guardwatch crates to `debug`.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::AppConfig;

pub fn filter_directive(debug: bool) -> &'static str {
    if debug {
        "info,guardwatch=debug,guardwatch_tui=debug,guardwatch_core=debug"
    } else {
        "info"
    }
}

/// Returns the writer guard for file logging. It must live until exit so
/// buffered lines are flushed.
pub fn init(config: &AppConfig, headless: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::new(filter_directive(config.debug));

    if headless {
        init_stderr(filter);
        return None;
    }

    let directory = config
        .log_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let Some(file_name) = config.log_file.file_name() else {
        eprintln!(
            "Log path {} has no file name, logging to stderr",
            config.log_file.display()
        );
        init_stderr(filter);
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(directory) {
        eprintln!("Failed to create log directory {}: {e}", directory.display());
        init_stderr(filter);
        return None;
    }

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(filter)
        .try_init();

    if installed.is_ok() {
        tracing::info!(
            log_file = %config.log_file.display(),
            debug = config.debug,
            "guardwatch logging initialized"
        );
    }

    Some(guard)
}

fn init_stderr(filter: EnvFilter) {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    if tracing_subscriber::registry()
        .with(stderr_layer)
        .with(filter)
        .try_init()
        .is_ok()
    {
        tracing::debug!("guardwatch logging initialized (stderr)");
    }
}
