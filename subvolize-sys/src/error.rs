// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use thiserror::Error;

/// Error types for system-level operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Destination already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Unsupported file type at {0}")]
    UnsupportedFileType(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl SysError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SysError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;
