// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Error types for BTRFS operations
#[derive(Error, Debug)]
pub enum BtrfsError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("BTRFS operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BtrfsError {
    /// The query failed only because the path is gone
    pub fn is_not_found(&self) -> bool {
        matches!(self, BtrfsError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Result type alias for BTRFS operations
pub type Result<T> = std::result::Result<T, BtrfsError>;
