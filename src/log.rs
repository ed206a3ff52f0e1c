// src/log.rs
// Subscriber setup; call sites use the `tracing` macros directly.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::Uptime;

use crate::config::consts::{LOG_ENV, LOG_FILE};
use crate::error::{MenuError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogOptions {
    /// Used when neither `MENU_LOG` nor `RUST_LOG` is set.
    pub level: Level,
    /// Append to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self { level: Level::INFO, file: None }
    }
}

impl LogOptions {
    pub fn verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.level = Level::DEBUG;
        }
        self
    }

    /// Log to the default debug log file.
    pub fn to_file(mut self) -> Self {
        self.file = Some(PathBuf::from(LOG_FILE));
        self
    }
}

/// Install the global subscriber. A second call leaves the first one in place.
pub fn init(opts: &LogOptions) -> Result<()> {
    let filter = filter_from(|k| std::env::var(k).ok(), opts.level);
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_timer(Uptime::default());

    let installed = match &opts.file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .map_err(|e| MenuError::Internal(format!("create {}: {e}", parent.display())))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| MenuError::Internal(format!("open {}: {e}", path.display())))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    if installed.is_err() {
        tracing::debug!("log subscriber already installed");
    }
    Ok(())
}

fn filter_from<F>(lookup: F, fallback: Level) -> EnvFilter
where
    F: Fn(&str) -> Option<String>,
{
    [LOG_ENV, "RUST_LOG"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .find(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v.trim()).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(LevelFilter::from_level(fallback).into()))
}
