// SPDX-License-Identifier: GPL-3.0-only

//! Directory tree moves and copies
//!
//! Copies never dereference symlinks: a link is recreated as a link with the same
//! target text. Regular files keep their contents and permission bits, directories
//! keep their permission bits. Hard links are copied as independent files.

use crate::error::{Result, SysError};
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

/// How a tree reached its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Single atomic rename on the same filesystem
    Renamed,
    /// Cross-device copy, verified, then source removed
    Copied,
}

/// Shape of a tree, used to confirm a copy is complete before deleting its source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeManifest {
    pub directories: u64,
    pub files: u64,
    pub symlinks: u64,
    pub file_bytes: u64,
}

impl TreeManifest {
    pub fn entries(&self) -> u64 {
        self.directories + self.files + self.symlinks
    }
}

/// Count everything below `root` (the root itself excluded)
pub fn tree_manifest(root: &Path) -> Result<TreeManifest> {
    let mut manifest = TreeManifest::default();
    let mut stack = vec![root.to_path_buf()];

    while let Some(directory) = stack.pop() {
        for entry in fs::read_dir(&directory).map_err(|e| SysError::io(&directory, e))? {
            let entry = entry.map_err(|e| SysError::io(&directory, e))?;
            let path = entry.path();
            let metadata = fs::symlink_metadata(&path).map_err(|e| SysError::io(&path, e))?;
            let file_type = metadata.file_type();

            if file_type.is_symlink() {
                manifest.symlinks += 1;
            } else if file_type.is_dir() {
                manifest.directories += 1;
                stack.push(path);
            } else if file_type.is_file() {
                manifest.files += 1;
                manifest.file_bytes += metadata.len();
            } else {
                return Err(SysError::UnsupportedFileType(path));
            }
        }
    }

    Ok(manifest)
}

/// Copy the tree at `src` to `dst`, which must not exist yet
pub fn copy_tree(src: &Path, dst: &Path) -> Result<TreeManifest> {
    if fs::symlink_metadata(dst).is_ok() {
        return Err(SysError::AlreadyExists(dst.to_path_buf()));
    }

    let metadata = fs::symlink_metadata(src).map_err(|e| SysError::io(src, e))?;
    if !metadata.is_dir() {
        let mut manifest = TreeManifest::default();
        copy_leaf(src, dst, &metadata, &mut manifest)?;
        return Ok(manifest);
    }

    fs::create_dir(dst).map_err(|e| SysError::io(dst, e))?;
    copy_contents(src, dst)
}

/// Copy every entry inside directory `src` into existing directory `dst`.
///
/// `dst` receives the permission bits of `src` once all children are in place.
pub fn copy_contents(src: &Path, dst: &Path) -> Result<TreeManifest> {
    let mut manifest = TreeManifest::default();
    // Directory permissions are applied last so read-only directories can still be filled
    let mut permission_fixups: Vec<(PathBuf, fs::Permissions)> = Vec::new();
    let mut stack = vec![(src.to_path_buf(), dst.to_path_buf())];

    let root_metadata = fs::symlink_metadata(src).map_err(|e| SysError::io(src, e))?;
    permission_fixups.push((dst.to_path_buf(), root_metadata.permissions()));

    while let Some((from_dir, to_dir)) = stack.pop() {
        for entry in fs::read_dir(&from_dir).map_err(|e| SysError::io(&from_dir, e))? {
            let entry = entry.map_err(|e| SysError::io(&from_dir, e))?;
            let from = entry.path();
            let to = to_dir.join(entry.file_name());
            let metadata = fs::symlink_metadata(&from).map_err(|e| SysError::io(&from, e))?;

            if metadata.is_dir() {
                fs::create_dir(&to).map_err(|e| SysError::io(&to, e))?;
                manifest.directories += 1;
                permission_fixups.push((to.clone(), metadata.permissions()));
                stack.push((from, to));
            } else {
                copy_leaf(&from, &to, &metadata, &mut manifest)?;
            }
        }
    }

    for (path, permissions) in permission_fixups.into_iter().rev() {
        fs::set_permissions(&path, permissions).map_err(|e| SysError::io(&path, e))?;
    }

    Ok(manifest)
}

fn copy_leaf(
    from: &Path,
    to: &Path,
    metadata: &fs::Metadata,
    manifest: &mut TreeManifest,
) -> Result<()> {
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        let target = fs::read_link(from).map_err(|e| SysError::io(from, e))?;
        symlink(&target, to).map_err(|e| SysError::io(to, e))?;
        manifest.symlinks += 1;
    } else if file_type.is_file() {
        let copied = fs::copy(from, to).map_err(|e| SysError::io(to, e))?;
        manifest.files += 1;
        manifest.file_bytes += copied;
    } else {
        return Err(SysError::UnsupportedFileType(from.to_path_buf()));
    }

    Ok(())
}

/// Move the tree at `src` to `dst`, creating `dst`'s parent directories as needed.
///
/// Uses a single rename when both sides share a filesystem. On `EXDEV` the tree is
/// copied, the copy is checked against the source manifest, and only then is the
/// source removed. An existing `dst` is never overwritten.
pub fn move_tree(src: &Path, dst: &Path) -> Result<MoveKind> {
    if fs::symlink_metadata(dst).is_ok() {
        return Err(SysError::AlreadyExists(dst.to_path_buf()));
    }

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| SysError::io(parent, e))?;
    }

    match fs::rename(src, dst) {
        Ok(()) => Ok(MoveKind::Renamed),
        Err(e) if e.raw_os_error() == Some(libc::EXDEV) => {
            tracing::debug!(
                "Cross-filesystem move detected ({} -> {}), using copy fallback",
                src.display(),
                dst.display()
            );
            copy_then_remove(src, dst)?;
            Ok(MoveKind::Copied)
        }
        Err(e) => Err(SysError::io(src, e)),
    }
}

fn copy_then_remove(src: &Path, dst: &Path) -> Result<()> {
    let expected = tree_manifest(src)?;

    if let Err(e) = copy_tree(src, dst) {
        // Source is untouched; drop the partial copy so a rerun starts clean
        let _ = fs::remove_dir_all(dst);
        return Err(e);
    }

    let found = tree_manifest(dst)?;
    if found != expected {
        let _ = fs::remove_dir_all(dst);
        return Err(SysError::OperationFailed(format!(
            "Copy of {} to {} is incomplete: expected {:?}, found {:?}",
            src.display(),
            dst.display(),
            expected,
            found
        )));
    }

    fs::remove_dir_all(src).map_err(|e| {
        SysError::OperationFailed(format!(
            "Verified copy at {} but failed to remove source {}: {}",
            dst.display(),
            src.display(),
            e
        ))
    })
}
