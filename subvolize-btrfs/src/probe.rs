// SPDX-License-Identifier: GPL-3.0-only

use crate::error::{BtrfsError, Result};
use std::ffi::CString;
use std::fs;
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// `f_type` reported by statfs for BTRFS
pub const BTRFS_SUPER_MAGIC: u32 = 0x9123_683E;

/// Inode number of the root directory of every subvolume
const BTRFS_FIRST_FREE_OBJECTID: u64 = 256;

/// Read the filesystem magic number for the filesystem containing `path`
fn filesystem_magic(path: &Path) -> Result<u32> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| BtrfsError::InvalidPath(format!("{}: {}", path.display(), e)))?;

    let mut stat: MaybeUninit<libc::statfs> = MaybeUninit::uninit();
    let result = unsafe { libc::statfs(c_path.as_ptr(), stat.as_mut_ptr()) };

    if result != 0 {
        return Err(BtrfsError::Io(std::io::Error::last_os_error()));
    }

    let stat = unsafe { stat.assume_init() };

    // f_type is signed on some targets; the magic only occupies the low 32 bits
    Ok(stat.f_type as u32)
}

/// Whether `path` lives on a BTRFS filesystem
pub fn is_btrfs(path: &Path) -> Result<bool> {
    Ok(filesystem_magic(path)? == BTRFS_SUPER_MAGIC)
}

/// Whether `path` is the root directory of a BTRFS subvolume
///
/// Same test libbtrfsutil performs: a directory on BTRFS whose inode number is the
/// subvolume root object id. A missing path is not an error here, it is simply not a
/// subvolume. Symlinks are never followed.
pub fn is_subvolume_root(path: &Path) -> Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(BtrfsError::Io(e)),
    };

    if !metadata.is_dir() || metadata.ino() != BTRFS_FIRST_FREE_OBJECTID {
        return Ok(false);
    }

    match is_btrfs(path) {
        Ok(on_btrfs) => Ok(on_btrfs),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}
