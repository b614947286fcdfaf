//! Logging setup for Tutorlink.
//!
//! All binaries call one of the `init*` functions once at startup. `RUST_LOG`
//! always wins over the configured level.

use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tutorlink_config::LoggingConfig;

/// Initialize the tracing subscriber at INFO.
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize the tracing subscriber with a specific log level.
pub fn init_with_level(level: Level) {
    // Subscriber only; the guard is irrelevant without a file layer.
    let _ = install(&level.to_string().to_lowercase(), None);
}

/// Initialize logging from the `[logging]` config section.
///
/// When `directory` is set, a daily rolling `tutorlink.log` is written there in
/// addition to stdout. The returned guard must be held for the lifetime of the
/// process so buffered file output gets flushed.
pub fn init_from_config(config: &LoggingConfig) -> Option<WorkerGuard> {
    install(&config.level, config.directory.as_deref())
}

fn install(level: &str, directory: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tutorlink.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // try_init: a global subscriber may already be set (tests, repeated init)
    let result = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true),
        )
        .with(file_layer)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
    guard
}
