// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::Path;

use subvolize_btrfs::{BtrfsError, SubvolumeOps};
use subvolize_types::TargetStatus;

use crate::error::ClassificationError;

/// Work out which of the three states `path` is in. Read-only.
pub fn classify(
    subvolumes: &dyn SubvolumeOps,
    path: &Path,
) -> Result<TargetStatus, ClassificationError> {
    let is_subvolume = match subvolumes.is_subvolume(path) {
        Ok(is_subvolume) => is_subvolume,
        Err(e) if e.is_not_found() => false,
        Err(source) => {
            return Err(ClassificationError {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if is_subvolume {
        return Ok(TargetStatus::IsSubvolume);
    }

    match fs::symlink_metadata(path) {
        Ok(_) => Ok(TargetStatus::ExistsAsPlainPath),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TargetStatus::NotPresent),
        Err(e) => Err(ClassificationError {
            path: path.to_path_buf(),
            source: BtrfsError::Io(e),
        }),
    }
}
