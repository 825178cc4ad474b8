use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use jarvault::config;

/// Filter used when `RUST_LOG` is unset or invalid
const DEFAULT_LOG_FILTER: &str = "info";

const LOG_FILE_PREFIX: &str = "jarvault.log";

/// Install the global subscriber.
///
/// Logs go to stderr, or to a daily rolling file under the data directory so
/// stdout stays clean for JSON output. Keep the guard alive until exit or
/// buffered lines are lost.
pub fn init(json: bool, to_file: bool) -> anyhow::Result<WorkerGuard> {
    let (writer, guard) = if to_file {
        let dir = config::log_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX))
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let layer = fmt::layer().with_writer(writer).with_ansi(!to_file);
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(layer.json()).try_init()?;
    } else {
        registry.with(layer).try_init()?;
    }

    Ok(guard)
}
