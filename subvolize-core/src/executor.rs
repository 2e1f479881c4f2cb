// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use subvolize_btrfs::SubvolumeOps;
use subvolize_sys::{
    MoveKind, OwnershipOps, SysError, SystemOwnership, TreeManifest, copy_contents, move_tree,
    tree_manifest,
};
use subvolize_types::{ConversionTarget, OwnershipRecord};

use crate::error::{MigrationCause, MigrationError, MigrationStep, OwnershipError};

/// Result of a completed migration
#[derive(Debug)]
pub struct Conversion {
    pub ownership: OwnershipRecord,
    pub quarantined: PathBuf,
    pub move_kind: MoveKind,
    pub copied: TreeManifest,
    /// Data is in place but ownership needs manual correction
    pub ownership_error: Option<OwnershipError>,
}

/// Converts one plain directory into a subvolume through the quarantine area
pub struct MigrationExecutor<'a> {
    subvolumes: &'a dyn SubvolumeOps,
    ownership: &'a dyn OwnershipOps,
    quarantine_root: PathBuf,
}

impl<'a> MigrationExecutor<'a> {
    pub fn new(subvolumes: &'a dyn SubvolumeOps, quarantine_root: PathBuf) -> Self {
        Self {
            subvolumes,
            ownership: &SystemOwnership,
            quarantine_root,
        }
    }

    pub fn with_ownership(mut self, ownership: &'a dyn OwnershipOps) -> Self {
        self.ownership = ownership;
        self
    }

    pub fn quarantine_root(&self) -> &Path {
        &self.quarantine_root
    }

    /// Where `target`'s safety copy goes
    pub fn quarantine_path(&self, target: &ConversionTarget) -> PathBuf {
        self.quarantine_root.join(&target.name)
    }

    /// Non-mutating checks that would make the conversion fail before it starts
    pub fn preflight(&self, target: &ConversionTarget) -> Result<(), MigrationError> {
        let path = &target.full_path;
        let metadata = fs::symlink_metadata(path).map_err(|e| {
            MigrationError::new(
                MigrationStep::Preflight,
                path.clone(),
                SysError::Io {
                    path: path.clone(),
                    source: e,
                },
            )
        })?;

        if !metadata.is_dir() {
            return Err(MigrationError::new(
                MigrationStep::Preflight,
                path.clone(),
                MigrationCause::NotADirectory,
            ));
        }

        let quarantined = self.quarantine_path(target);
        if fs::symlink_metadata(&quarantined).is_ok() {
            return Err(MigrationError::new(
                MigrationStep::Preflight,
                path.clone(),
                MigrationCause::QuarantineOccupied(quarantined),
            ));
        }

        // Sockets, FIFOs and device nodes cannot be copied back into the new subvolume
        tree_manifest(path)
            .map_err(|e| MigrationError::new(MigrationStep::Preflight, path.clone(), e))?;

        Ok(())
    }

    /// Run the full migration sequence for a target that exists as a plain directory
    pub fn convert(&self, target: &ConversionTarget) -> Result<Conversion, MigrationError> {
        let path = &target.full_path;
        let quarantined = self.quarantine_path(target);

        self.preflight(target)?;

        // 1. Capture ownership
        let ownership = self.ownership.capture(path).map_err(|e| {
            MigrationError::new(MigrationStep::CaptureOwnership, path.clone(), e)
        })?;
        tracing::info!("  Captured ownership {} of {}", ownership, path.display());

        // 2. Move to quarantine; the original stays put unless the move is confirmed
        let move_kind = move_tree(path, &quarantined).map_err(|e| {
            let mut error = MigrationError::new(MigrationStep::MoveToQuarantine, path.clone(), e);
            error.ownership = Some(ownership);
            if fs::symlink_metadata(&quarantined).is_ok() {
                error.quarantined = Some(quarantined.clone());
            }
            error
        })?;
        tracing::info!(
            "  Moved {} to {} ({:?})",
            path.display(),
            quarantined.display(),
            move_kind
        );

        let after_move = |step: MigrationStep, cause: MigrationCause| MigrationError {
            step,
            path: path.clone(),
            ownership: Some(ownership),
            quarantined: Some(quarantined.clone()),
            cause,
        };

        // 3. Create the subvolume in the now vacant location
        self.subvolumes
            .create(path)
            .map_err(|e| after_move(MigrationStep::CreateSubvolume, e.into()))?;
        tracing::info!("  Created subvolume: {}", path.display());

        // 4. Copy the data back, leaving the quarantine copy as a safety net
        let copied = copy_contents(&quarantined, path)
            .map_err(|e| after_move(MigrationStep::CopyBack, e.into()))?;
        tracing::info!(
            "  Copied {} entries ({} bytes) back into {}",
            copied.entries(),
            copied.file_bytes,
            path.display()
        );

        // 5. Restore ownership; failure here leaves the data usable
        let ownership_error = match self.ownership.restore(path, ownership) {
            Ok(_) => None,
            Err(source) => {
                let error = OwnershipError {
                    path: path.clone(),
                    record: ownership,
                    source,
                };
                tracing::warn!("  {}", error);
                Some(error)
            }
        };

        Ok(Conversion {
            ownership,
            quarantined,
            move_kind,
            copied,
            ownership_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSubvolumes, RefusingRestore, TempDir, snapshot_tree};
    use std::os::unix::fs::MetadataExt;
    use std::os::unix::net::UnixListener;

    fn plain_target(temp: &TempDir, name: &str) -> ConversionTarget {
        let target = ConversionTarget::new(&temp.path, name);
        fs::create_dir_all(target.full_path.join("sub")).expect("create target");
        fs::write(target.full_path.join("f.txt"), b"original").expect("write f.txt");
        fs::write(target.full_path.join("sub/g.bin"), [0u8, 1, 2, 3]).expect("write g.bin");
        std::os::unix::fs::symlink("f.txt", target.full_path.join("alias")).expect("link");
        target
    }

    #[test]
    fn converts_and_keeps_safety_copy() {
        let temp = TempDir::new("executor-convert");
        let subvolumes = FakeSubvolumes::default();
        let target = plain_target(&temp, "c");
        let before = snapshot_tree(&target.full_path);
        let executor = MigrationExecutor::new(&subvolumes, temp.path.join("quarantine"));

        let conversion = executor.convert(&target).expect("convert");

        assert!(conversion.ownership_error.is_none());
        assert_eq!(conversion.quarantined, temp.path.join("quarantine/c"));
        assert_eq!(conversion.copied.files, 2);
        assert!(subvolumes.is_subvolume(&target.full_path).expect("query"));
        assert_eq!(snapshot_tree(&target.full_path), before);
        assert_eq!(snapshot_tree(&conversion.quarantined), before);
    }

    #[test]
    fn restores_captured_ownership() {
        let temp = TempDir::new("executor-ownership");
        let subvolumes = FakeSubvolumes::default();
        let target = plain_target(&temp, "c");
        let root = fs::metadata(&target.full_path).expect("stat target");
        let executor = MigrationExecutor::new(&subvolumes, temp.path.join("quarantine"));

        let conversion = executor.convert(&target).expect("convert");

        assert_eq!(
            (conversion.ownership.uid, conversion.ownership.gid),
            (root.uid(), root.gid())
        );
        for entry in ["", "sub", "f.txt", "sub/g.bin", "alias"] {
            let metadata = fs::symlink_metadata(target.full_path.join(entry)).expect("stat");
            assert_eq!((metadata.uid(), metadata.gid()), (root.uid(), root.gid()));
        }
    }

    #[test]
    fn refuses_plain_file() {
        let temp = TempDir::new("executor-file");
        let subvolumes = FakeSubvolumes::default();
        let target = ConversionTarget::new(&temp.path, "file");
        fs::write(&target.full_path, b"x").expect("write file");
        let executor = MigrationExecutor::new(&subvolumes, temp.path.join("quarantine"));

        let error = executor.convert(&target).expect_err("file cannot be converted");

        assert_eq!(error.step, MigrationStep::Preflight);
        assert!(matches!(error.cause, MigrationCause::NotADirectory));
        assert_eq!(fs::read(&target.full_path).expect("file intact"), b"x");
        assert!(subvolumes.create_calls.borrow().is_empty());
    }

    #[test]
    fn refuses_to_reuse_occupied_quarantine() {
        let temp = TempDir::new("executor-occupied");
        let subvolumes = FakeSubvolumes::default();
        let target = plain_target(&temp, "c");
        fs::create_dir_all(temp.path.join("quarantine/c")).expect("stale quarantine");
        let executor = MigrationExecutor::new(&subvolumes, temp.path.join("quarantine"));

        let error = executor.convert(&target).expect_err("occupied quarantine");

        assert!(matches!(error.cause, MigrationCause::QuarantineOccupied(_)));
        assert!(error.quarantined.is_none());
        assert_eq!(
            fs::read(target.full_path.join("f.txt")).expect("original intact"),
            b"original"
        );
    }

    #[test]
    fn create_failure_leaves_data_in_quarantine() {
        let temp = TempDir::new("executor-create-fails");
        let subvolumes = FakeSubvolumes::default();
        let target = plain_target(&temp, "c");
        let before = snapshot_tree(&target.full_path);
        subvolumes.fail_create(&target.full_path);
        let executor = MigrationExecutor::new(&subvolumes, temp.path.join("quarantine"));

        let error = executor.convert(&target).expect_err("create fails");

        assert_eq!(error.step, MigrationStep::CreateSubvolume);
        assert_eq!(error.quarantined, Some(temp.path.join("quarantine/c")));
        assert!(error.ownership.is_some());
        assert!(fs::symlink_metadata(&target.full_path).is_err());
        assert_eq!(snapshot_tree(&temp.path.join("quarantine/c")), before);
    }

    #[test]
    fn nested_names_keep_their_layout_in_quarantine() {
        let temp = TempDir::new("executor-nested");
        let subvolumes = FakeSubvolumes::default();
        fs::create_dir(temp.path.join("projects")).expect("create parent");
        let target = plain_target(&temp, "projects/site");
        let executor = MigrationExecutor::new(&subvolumes, temp.path.join("quarantine"));

        let conversion = executor.convert(&target).expect("convert");

        assert_eq!(conversion.quarantined, temp.path.join("quarantine/projects/site"));
        assert!(conversion.quarantined.join("f.txt").is_file());
        assert!(target.full_path.join("f.txt").is_file());
    }

    #[test]
    fn special_files_fail_before_anything_moves() {
        let temp = TempDir::new("executor-socket");
        let subvolumes = FakeSubvolumes::default();
        let target = plain_target(&temp, "c");
        let _listener = UnixListener::bind(target.full_path.join("agent.sock")).expect("bind");
        let executor = MigrationExecutor::new(&subvolumes, temp.path.join("quarantine"));

        let error = executor.convert(&target).expect_err("socket cannot be copied");

        assert_eq!(error.step, MigrationStep::Preflight);
        assert!(matches!(
            error.cause,
            MigrationCause::Sys(SysError::UnsupportedFileType(ref path))
                if path.ends_with("agent.sock")
        ));
        assert!(error.quarantined.is_none());
        assert!(subvolumes.create_calls.borrow().is_empty());
        assert!(!temp.path.join("quarantine").exists());
        assert!(target.full_path.join("agent.sock").exists());
        assert_eq!(
            fs::read(target.full_path.join("f.txt")).expect("original intact"),
            b"original"
        );
    }

    #[test]
    fn copy_back_failure_keeps_quarantine_intact() {
        let temp = TempDir::new("executor-copy-back-fails");
        let subvolumes = FakeSubvolumes::default();
        let target = plain_target(&temp, "c");
        let before = snapshot_tree(&target.full_path);
        // A directory named like a file in the tree makes writing that file fail
        subvolumes.occupy_on_create(&target.full_path, "f.txt");
        let executor = MigrationExecutor::new(&subvolumes, temp.path.join("quarantine"));

        let error = executor.convert(&target).expect_err("copy back fails");

        assert_eq!(error.step, MigrationStep::CopyBack);
        assert_eq!(error.quarantined, Some(temp.path.join("quarantine/c")));
        assert!(error.ownership.is_some());
        assert!(error.recovery_hint().contains("quarantine/c"));
        assert!(subvolumes.is_subvolume(&target.full_path).expect("query"));
        assert_eq!(snapshot_tree(&temp.path.join("quarantine/c")), before);
    }

    #[test]
    fn refused_ownership_restore_still_converts() {
        let temp = TempDir::new("executor-chown-refused");
        let subvolumes = FakeSubvolumes::default();
        let target = plain_target(&temp, "c");
        let before = snapshot_tree(&target.full_path);
        let executor = MigrationExecutor::new(&subvolumes, temp.path.join("quarantine"))
            .with_ownership(&RefusingRestore);

        let conversion = executor.convert(&target).expect("data still converted");

        let error = conversion.ownership_error.expect("ownership error kept");
        assert_eq!(error.path, target.full_path);
        assert_eq!(error.record, conversion.ownership);
        assert!(matches!(error.source, SysError::PermissionDenied(_)));
        assert_eq!(snapshot_tree(&target.full_path), before);
    }
}
