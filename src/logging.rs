//! Logging configuration.
//!
//! The batch CLI logs to the operator console (stderr). The dashboard owns the
//! terminal, so it logs to systemd's journal on Linux, with a rolling file
//! fallback for other platforms or when journald is unavailable.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where log output should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Console,
    /// journald when available, else a daily file in the given directory.
    Background { log_dir: Option<PathBuf> },
}

/// Initialize the logging system.
///
/// Log level can be controlled via the `EMOLENS_LOG` environment variable
/// (`debug`, `info` (default), `warn`, `error`, or any `EnvFilter` directive).
pub fn init(target: LogTarget) -> Result<()> {
    let env_filter = EnvFilter::try_from_env("EMOLENS_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let log_dir = match target {
        LogTarget::Console => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
                .try_init()?;
            return Ok(());
        }
        LogTarget::Background { log_dir } => log_dir,
    };

    #[cfg(target_os = "linux")]
    {
        if let Ok(journald_layer) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(journald_layer)
                .try_init()?;

            tracing::info!("Logging initialized with journald backend");
            return Ok(());
        }
    }

    let log_dir = log_dir.unwrap_or_else(default_log_dir);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "emolens.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The writer thread stops when the guard drops; keep it for the process lifetime.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()?;

    tracing::info!("Logging initialized with file backend at {:?}", log_dir);
    Ok(())
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("emolens")
        .join("logs")
}
