//! Tracing initialization
//!
//! Internal diagnostics (including the failure causes the user-facing
//! surface swallows) go through `tracing`. The sink is chosen from the
//! config's logging section: a non-blocking file appender when file output
//! is enabled, stderr otherwise.

use crate::config::LoggingConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber
///
/// Returns the appender guard when logging to a file; the guard must stay
/// alive for the life of the process or buffered lines are lost.
pub fn init(config: &LoggingConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    if config.file_output {
        let path = Path::new(&config.file_path);
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "querychat.log".to_string());

        if let Err(e) = std::fs::create_dir_all(directory) {
            eprintln!("Failed to create log directory: {e}");
            return None;
        }

        let appender = tracing_appender::rolling::never(directory, file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();

        Some(guard)
    } else if config.console_output {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();

        None
    } else {
        None
    }
}
