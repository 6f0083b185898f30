//! Single-instance guard.
//!
//! Holds an exclusive OS lock on a file for as long as the guard lives. The
//! lock file itself is left behind on exit; only the lock is released.

use std::fs::{File, OpenOptions, TryLockError};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Lock file name, placed next to the executable
pub const LOCK_FILE: &str = "s1monitor.lock";

#[derive(Error, Debug)]
pub enum LockError {
    #[error("Another instance is already running (lock {0} is held)")]
    AlreadyRunning(PathBuf),

    #[error("Failed to lock {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Take the lock without waiting.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let io_err = |source| LockError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(io_err)?;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(LockError::AlreadyRunning(path.to_path_buf()))
            }
            Err(TryLockError::Error(e)) => return Err(io_err(e)),
        }

        info!(path = %path.display(), "Instance lock acquired");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    #[cfg(test)]
    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            debug!(error = %e, "Failed to unlock instance lock");
        }
        info!(path = %self.path.display(), "Instance lock released");
    }
}
