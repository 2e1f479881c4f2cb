// SPDX-License-Identifier: GPL-3.0-only

use crate::error::{BtrfsError, Result};
use crate::probe::is_subvolume_root;
use btrfsutil::subvolume::Subvolume;
use std::path::Path;

/// Subvolume queries and mutations the conversion engine relies on
pub trait SubvolumeOps {
    /// Whether `path` is a subvolume.
    ///
    /// Must return `Ok(false)` when the path does not exist or is not on BTRFS.
    /// `Err` is reserved for failures unrelated to either.
    fn is_subvolume(&self, path: &Path) -> Result<bool>;

    /// Create a new, empty subvolume at `path`
    fn create(&self, path: &Path) -> Result<()>;
}

/// Manager for BTRFS subvolume operations on the live system
#[derive(Debug, Default, Clone, Copy)]
pub struct SubvolumeManager;

impl SubvolumeManager {
    pub fn new() -> Self {
        Self
    }
}

impl SubvolumeOps for SubvolumeManager {
    fn is_subvolume(&self, path: &Path) -> Result<bool> {
        is_subvolume_root(path)
    }

    fn create(&self, path: &Path) -> Result<()> {
        tracing::debug!("Creating subvolume at {}", path.display());

        Subvolume::create(path, None).map_err(|e| {
            BtrfsError::OperationFailed(format!(
                "Failed to create subvolume '{}': {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }
}
