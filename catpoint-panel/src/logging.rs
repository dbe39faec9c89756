//! Logging module for the Catpoint panel

use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with tracing
///
/// Returns a guard that must be kept alive for the duration of the program
pub fn init_logging(config: &LoggingConfig) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};

    std::fs::create_dir_all(&config.directory).ok();

    let file_appender = RollingFileAppender::new(
        Rotation::DAILY,
        &config.directory,
        &config.file_name,
    );

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // stdout carries console replies, so the terminal layer writes to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level))
        )
        .init();

    guard
}
