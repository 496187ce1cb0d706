use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::formatter::BracketedFormatter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber: bracketed output on stdout and, when
/// `log_dir` is given, a timestamped log file in that directory as well.
///
/// Returns the log file path when one was created. Fails if the log file
/// cannot be created or a global subscriber is already installed.
pub fn setup_logging(log_dir: Option<&Path>) -> io::Result<Option<PathBuf>> {
    let log_file = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            let path = dir.join(format!("pv_dataset_{}.log", timestamp));
            let file = fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)?;
            Some((path, file))
        }
        None => None,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stdout_layer = fmt::layer()
        .event_format(BracketedFormatter)
        .with_writer(io::stdout);

    let (log_path, file_layer) = match log_file {
        Some((path, file)) => {
            let layer = fmt::layer()
                .event_format(BracketedFormatter)
                .with_writer(Mutex::new(file))
                .with_ansi(false);
            (Some(path), Some(layer))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    if let Some(path) = &log_path {
        info!("Log file created at: {:?}", path);
    }
    Ok(log_path)
}
