//! Logging setup
//!
//! Installs a `tracing` subscriber with an env-driven filter, a stderr layer and
//! an optional daily-rolling log file.

use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Log file prefix; the appender adds the date suffix.
pub const LOG_FILE_NAME: &str = "wavecoach.log";

/// Installs the global subscriber.
///
/// `RUST_LOG` directives are honoured; `default_level` is always added on top.
/// Calling this more than once is harmless, later calls are ignored.
pub fn init_logging(log_dir: Option<&Path>, default_level: tracing::Level) {
    let env_filter = EnvFilter::from_default_env().add_directive(default_level.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let file_layer = log_dir.and_then(|dir| {
        // Best effort; console logging still works without the file.
        std::fs::create_dir_all(dir).ok()?;
        let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);

    // Avoid panics if already initialized (tests, repeated CLI setup).
    let _ = tracing::subscriber::set_global_default(subscriber);
}
