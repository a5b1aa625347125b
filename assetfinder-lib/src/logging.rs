//! Log sink setup for discovery runs.
//!
//! A run either logs through whatever `tracing` subscriber the host
//! application installed, or into a dedicated log file. Either way the
//! result is a `Dispatch` that the engine attaches to every task it spawns,
//! so records from concurrent source lookups all land in the same place.

use crate::error::AssetFinderError;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Dispatch, Level};

/// Where the log records of a discovery run go.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LogSink {
    /// The subscriber that is current when the run starts
    #[default]
    Ambient,

    /// Append plain-text records to this file
    File(PathBuf),
}

impl LogSink {
    /// Log to a file, creating it (and its parent directories) on first use.
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        Self::File(path.into())
    }

    /// Pick the sink a config asks for.
    pub fn from_path(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::file(path),
            None => Self::Ambient,
        }
    }

    /// Prepare the sink and return the dispatcher to log through.
    ///
    /// # Errors
    ///
    /// Returns `AssetFinderError::Setup` if the log directory cannot be
    /// created or the log file cannot be opened for appending.
    pub fn init(&self) -> Result<Dispatch, AssetFinderError> {
        match self {
            Self::Ambient => Ok(tracing::dispatcher::get_default(Dispatch::clone)),
            Self::File(path) => open_file_dispatch(path),
        }
    }
}

fn open_file_dispatch(path: &Path) -> Result<Dispatch, AssetFinderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AssetFinderError::setup(
                "log file",
                format!("cannot create directory '{}': {}", parent.display(), e),
            )
        })?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            AssetFinderError::setup(
                "log file",
                format!("cannot open '{}': {}", path.display(), e),
            )
        })?;

    let subscriber = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(Level::DEBUG)
        .finish();

    Ok(Dispatch::new(subscriber))
}
