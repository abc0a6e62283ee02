use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::core::config::AppPaths;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the global subscriber: stdout plus a daily file under `paths.log_dir`.
///
/// `file_name` is the prefix of the rolling log file (`server.log`, `indexer.log`).
/// When the log directory cannot be created only stdout is used.
pub fn init(paths: &AppPaths, file_name: &str) {
    let (file_writer, dir_error) = match file_writer(&paths.log_dir, file_name) {
        Ok(writer) => (Some(writer), None),
        Err(err) => (None, Some(err)),
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    let file_layer = file_writer.map(|writer| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer)
    });

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("logging already initialised: {}", err);
        return;
    }

    if let Some(err) = dir_error {
        tracing::warn!(
            "Cannot create log directory {}: {}; logging to stdout only",
            paths.log_dir.display(),
            err
        );
    }
}

fn file_writer(log_dir: &Path, file_name: &str) -> std::io::Result<NonBlocking> {
    std::fs::create_dir_all(log_dir)?;

    let appender = tracing_appender::rolling::daily(log_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    if LOG_GUARD.set(guard).is_err() {
        eprintln!("log file writer already installed; keeping the first one");
    }
    Ok(writer)
}
