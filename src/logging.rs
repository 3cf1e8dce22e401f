//! File-based tracing setup.
//!
//! The terminal belongs to the TUI, so logs only ever go to a file.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Env var holding the tracing filter directive (e.g. `arpo=debug`).
pub const LOG_ENV: &str = "ARPO_LOG";

/// `<state dir>/arpo/arpo.log`, falling back to the local data dir.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|d| d.join("arpo").join("arpo.log"))
}

/// Install the global subscriber. Returns `None` (logging disabled) when the
/// log directory cannot be created; keep the guard alive until exit.
pub fn init_logging(path: Option<&Path>) -> Option<WorkerGuard> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_log_path()?,
    };
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = path.file_name()?;
    std::fs::create_dir_all(&dir).ok()?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let file_appender = tracing_appender::rolling::never(&dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false),
        )
        .with(filter)
        .try_init()
        .ok()?;

    Some(guard)
}
