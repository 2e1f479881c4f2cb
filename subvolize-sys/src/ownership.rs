// SPDX-License-Identifier: GPL-3.0-only

use crate::error::{Result, SysError};
use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use subvolize_types::OwnershipRecord;

/// Read owner and group of `path` itself, without following a final symlink
pub fn capture_ownership(path: &Path) -> Result<OwnershipRecord> {
    let metadata = fs::symlink_metadata(path).map_err(|e| SysError::io(path, e))?;

    Ok(OwnershipRecord {
        uid: metadata.uid(),
        gid: metadata.gid(),
    })
}

/// Apply `record` to `path` and everything beneath it.
///
/// Symlinks get their own ownership changed; their targets are never touched, so
/// links pointing outside the tree cannot leak the change. Returns the number of
/// entries updated.
pub fn restore_ownership(path: &Path, record: OwnershipRecord) -> Result<u64> {
    let mut updated = 0;
    let mut stack = vec![path.to_path_buf()];

    while let Some(current) = stack.pop() {
        lchown_path(&current, record.uid, record.gid)?;
        updated += 1;

        let metadata = fs::symlink_metadata(&current).map_err(|e| SysError::io(&current, e))?;
        if !metadata.is_dir() {
            continue;
        }

        for entry in fs::read_dir(&current).map_err(|e| SysError::io(&current, e))? {
            let entry = entry.map_err(|e| SysError::io(&current, e))?;
            stack.push(entry.path());
        }
    }

    tracing::debug!(
        "Restored ownership {} on {} entries under {}",
        record,
        updated,
        path.display()
    );

    Ok(updated)
}

/// Ownership capture and restore as used by the conversion engine
pub trait OwnershipOps {
    fn capture(&self, path: &Path) -> Result<OwnershipRecord>;
    fn restore(&self, path: &Path, record: OwnershipRecord) -> Result<u64>;
}

/// `lchown`-backed ownership handling on the live filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOwnership;

impl OwnershipOps for SystemOwnership {
    fn capture(&self, path: &Path) -> Result<OwnershipRecord> {
        capture_ownership(path)
    }

    fn restore(&self, path: &Path, record: OwnershipRecord) -> Result<u64> {
        restore_ownership(path, record)
    }
}

fn lchown_path(path: &Path, uid: u32, gid: u32) -> Result<()> {
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|e| {
        SysError::OperationFailed(format!("Invalid path for chown {}: {}", path.display(), e))
    })?;
    let result = unsafe { libc::lchown(c_path.as_ptr(), uid as libc::uid_t, gid as libc::gid_t) };
    if result != 0 {
        let error = std::io::Error::last_os_error();
        if error.kind() == std::io::ErrorKind::PermissionDenied {
            return Err(SysError::PermissionDenied(format!(
                "Cannot chown {} to {}:{}",
                path.display(),
                uid,
                gid
            )));
        }
        return Err(SysError::io(path, error));
    }
    Ok(())
}
