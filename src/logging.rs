use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
};

use color_eyre::{Result, eyre::WrapErr};
use directories::ProjectDirs;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "MENTORBOARD_LOG";
const LOG_FILE_NAME: &str = "mentorboard.log";

pub enum LogTarget {
    /// Append to the log file; the terminal belongs to the UI.
    File,
    Stderr,
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn log_file_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mentorboard").map(|dirs| dirs.data_local_dir().join(LOG_FILE_NAME))
}

/// Installs the global subscriber. Returns the log file path when logging to
/// a file.
pub fn init(verbosity: u8, target: LogTarget) -> Result<Option<PathBuf>> {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .wrap_err_with(|| format!("Invalid {LOG_ENV} filter: {directives}"))?,
        _ => EnvFilter::new(default_directive(verbosity)),
    };
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(ErrorLayer::default());

    match target {
        LogTarget::Stderr => {
            registry
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
            Ok(None)
        }
        LogTarget::File => {
            let Some(path) = log_file_path() else {
                registry.try_init()?;
                return Ok(None);
            };
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .wrap_err_with(|| format!("Failed to create log directory {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .wrap_err_with(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    fmt::layer()
                        .with_writer(Mutex::new(file))
                        .with_ansi(false),
                )
                .try_init()?;
            Ok(Some(path))
        }
    }
}
