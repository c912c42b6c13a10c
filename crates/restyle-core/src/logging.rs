//! Tracing setup: compact stderr output plus a daily log file under `RESTYLE_HOME`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{Config, paths};

const LOG_ENV: &str = "RESTYLE_LOG";
const LOG_FILE_PREFIX: &str = "restyle.log";

/// Builds the filter: `RESTYLE_LOG` wins over `log_level` from config.
fn filter_for(config: &Config) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(config.log_level.trim()))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Installs the global subscriber.
///
/// Keep the returned guard alive until exit so buffered file lines are flushed.
/// When the log directory cannot be created only stderr is used. A second call is
/// a no-op.
pub fn init(config: &Config) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact();

    let logs_dir = paths::logs_dir();
    let (file_layer, guard) = match std::fs::create_dir_all(&logs_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("Warning: cannot create {}: {e}", logs_dir.display());
            (None, None)
        }
    };

    let installed = tracing_subscriber::registry()
        .with(filter_for(config))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(dir = %logs_dir.display(), "logging initialized");
    }
    guard
}
