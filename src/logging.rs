use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::fmt::{self, format::Writer, time::FormatTime};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::app::{Result, ReviewtapError};
use crate::config::{LoggingConfig, Rotation};

/// Local wall-clock timestamps with milliseconds.
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Filter used when `RUST_LOG` is unset. The browser driver is chatty
/// below `warn`.
fn default_directives(level: &str) -> String {
    format!("{},chromiumoxide=warn,tungstenite=warn", level)
}

fn appender(config: &LoggingConfig, logs_dir: &Path) -> rolling::RollingFileAppender {
    match config.rotation {
        Rotation::Daily => rolling::daily(logs_dir, &config.file_name),
        Rotation::Hourly => rolling::hourly(logs_dir, &config.file_name),
        Rotation::Never => rolling::never(logs_dir, &config.file_name),
    }
}

/// Install the global subscriber: a rotating file in `logs_dir` plus,
/// optionally, stderr. Keep the returned guard alive until exit or buffered
/// lines are lost.
pub fn init(config: &LoggingConfig, logs_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    let (file_writer, guard) = non_blocking(appender(config, logs_dir));
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_timer(LocalTime)
        .with_thread_names(true)
        .with_target(false)
        .with_ansi(false);

    let console_layer = config.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_timer(LocalTime)
            .with_thread_names(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| ReviewtapError::Other(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}
