use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Engine events at info, everything else from the host at warn.
pub const DEFAULT_DIRECTIVE: &str = "warn,adaptive_difficulty=info";

const LOG_FILE_PREFIX: &str = "adaptive-difficulty.log";

/// Keeps the non-blocking file writer alive; dropping it flushes and stops file logging.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// `ENABLE_FILE_LOGS` set to `true` or `1`.
pub fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

/// `LOG_DIR`, or `./logs`.
pub fn log_dir() -> PathBuf {
    std::env::var_os("LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Parses `directive`, falling back to [`DEFAULT_DIRECTIVE`] when it is
/// empty or malformed.
pub fn build_filter(directive: &str) -> EnvFilter {
    if directive.trim().is_empty() {
        return EnvFilter::new(DEFAULT_DIRECTIVE);
    }
    EnvFilter::try_new(directive).unwrap_or_else(|err| {
        eprintln!("invalid log directive {directive:?} ({err}), using {DEFAULT_DIRECTIVE}");
        EnvFilter::new(DEFAULT_DIRECTIVE)
    })
}

/// Installs the global subscriber for hosts embedding the engine.
///
/// Stdout always; a daily rolling file under [`log_dir`] when
/// [`file_logging_enabled`]. An already installed subscriber is left in
/// place.
pub fn init_tracing(directive: &str) -> Option<FileLogGuard> {
    let stdout_layer = fmt::layer().with_target(true);
    let registry = tracing_subscriber::registry()
        .with(build_filter(directive))
        .with(stdout_layer);

    if !file_logging_enabled() {
        if registry.try_init().is_err() {
            tracing::debug!("tracing subscriber already installed");
        }
        return None;
    }

    let dir = log_dir();
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("failed to create log directory {}: {err}", dir.display());
        let _ = registry.try_init();
        return None;
    }

    let (file_writer, guard) =
        tracing_appender::non_blocking(RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE_PREFIX));
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    registry
        .with(file_layer)
        .try_init()
        .is_ok()
        .then_some(FileLogGuard { _guard: guard })
}
