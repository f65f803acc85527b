//! Output location and scratch file setup.
//!
//! Watchlists land in the TWS settings directory (`Jts`) under the platform
//! base directory, optionally inside a dedicated watchlist subdirectory so
//! they are easy to find from the TWS import dialog.

use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::config::WatchlistConfig;

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("could not determine the home directory")]
    NoHomeDir,

    #[error("TWS directory does not exist: {0}")]
    MissingTwsDir(PathBuf),

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not resolve the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    #[error("scratch file error: {0}")]
    Scratch(#[source] std::io::Error),
}

/// Base directory TWS is installed under: the drive root on Windows, the
/// user's home directory everywhere else.
pub fn platform_base_dir() -> Result<PathBuf, EnvError> {
    if cfg!(windows) {
        Ok(PathBuf::from("/"))
    } else {
        dirs::home_dir().ok_or(EnvError::NoHomeDir)
    }
}

/// Create a directory and any missing parents. Existing directories are fine.
pub fn ensure_dir(path: &Path) -> Result<(), EnvError> {
    std::fs::create_dir_all(path).map_err(|source| EnvError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolved output directories for a run.
#[derive(Debug, Clone)]
pub struct Environment {
    tws_dir: PathBuf,
    output_root: PathBuf,
}

impl Environment {
    /// Resolve the TWS directory and create the watchlist directory.
    ///
    /// The TWS directory itself must already exist. Paths are absolute, so
    /// they stay valid if the process later changes directory.
    pub fn prepare(config: &WatchlistConfig) -> Result<Self, EnvError> {
        let base = match &config.base_dir {
            Some(dir) if dir.is_relative() => std::env::current_dir()
                .map_err(EnvError::CurrentDir)?
                .join(dir),
            Some(dir) => dir.clone(),
            None => platform_base_dir()?,
        };
        let tws_dir = base.join(&config.tws_dir);
        if !tws_dir.is_dir() {
            return Err(EnvError::MissingTwsDir(tws_dir));
        }

        let output_root = if config.watchlists.is_empty() {
            tws_dir.clone()
        } else {
            let dir = tws_dir.join(&config.watchlists);
            ensure_dir(&dir)?;
            dir
        };
        debug!(output_root = %output_root.display(), "environment prepared");

        Ok(Self {
            tws_dir,
            output_root,
        })
    }

    pub fn tws_dir(&self) -> &Path {
        &self.tws_dir
    }

    /// Directory all watchlist paths are resolved against.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }
}

/// Uniquely named temp file each download is written into before parsing.
///
/// Removed when dropped, whether the run finished or failed.
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    /// Create an empty scratch file with the given extension (e.g. `.xlsx`).
    pub fn create(extension: &str) -> Result<Self, EnvError> {
        let file = tempfile::Builder::new()
            .prefix("spdrlists-")
            .suffix(extension)
            .tempfile()
            .map_err(EnvError::Scratch)?;
        debug!(path = %file.path().display(), "scratch file created");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Replace the file's contents with `bytes`.
    pub fn overwrite(&mut self, bytes: &[u8]) -> Result<(), EnvError> {
        let f = self.file.as_file_mut();
        f.set_len(0).map_err(EnvError::Scratch)?;
        f.rewind().map_err(EnvError::Scratch)?;
        f.write_all(bytes).map_err(EnvError::Scratch)?;
        f.flush().map_err(EnvError::Scratch)
    }
}
