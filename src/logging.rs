use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "linia=info";

/// Where log records go. The TUI owns the terminal, so it logs to a file.
pub enum LogSink<'a> {
    File(&'a Path),
    Stderr,
}

/// Install the global subscriber. `log::` macros are bridged into it.
pub fn init_logging(sink: LogSink<'_>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match sink {
        LogSink::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false)
                        .with_filter(filter),
                )
                .try_init()
                .context("Failed to install logger")?;
        }
        LogSink::Stderr => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(false)
                        .with_filter(filter),
                )
                .try_init()
                .context("Failed to install logger")?;
        }
    }
    Ok(())
}

/// `~/.config/linia/linia.log`
pub fn default_log_path() -> Option<PathBuf> {
    crate::config::config_dir().map(|d| d.join("linia.log"))
}
