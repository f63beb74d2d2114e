//! Logging setup: stdout plus an optional timestamped log file

use anyhow::Result;
use chrono::{DateTime, Local};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// `YYYY-mm-dd-HHMMSS.txt` for the given start time
pub fn log_file_name(started: DateTime<Local>) -> String {
    started.format("%Y-%m-%d-%H%M%S.txt").to_string()
}

/// Default filter directives when `RUST_LOG` is not set
pub fn default_filter(level: &str) -> String {
    format!("zodmap={level},tower_http={level}")
}

/// Install the global subscriber. Returns the log file path when a log
/// directory is configured.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let (file_layer, log_path) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(log_file_name(Local::now()));
            let file = File::create(&path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(log_path)
}
