//! Error types for restraint.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("A block is already active in {path:?}")]
    AlreadyActive { path: PathBuf },

    #[error("Permission denied on {path:?} (elevated privileges are usually required)")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to lock {path:?}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Block session failed: {0}")]
    Session(String),
}

impl GuardError {
    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::PermissionDenied {
            GuardError::PermissionDenied {
                path: path.to_path_buf(),
                source,
            }
        } else {
            GuardError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Returns the error kind as a short stable name.
    pub fn kind(&self) -> &'static str {
        match self {
            GuardError::AlreadyActive { .. } => "AlreadyActive",
            GuardError::PermissionDenied { .. } => "PermissionDenied",
            GuardError::Io { .. } => "IOFailure",
            GuardError::Lock { .. } => "Lock",
            GuardError::Session(_) => "Session",
        }
    }
}

pub type Result<T> = std::result::Result<T, GuardError>;
