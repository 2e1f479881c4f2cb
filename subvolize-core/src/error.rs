// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::path::PathBuf;

use subvolize_btrfs::BtrfsError;
use subvolize_sys::SysError;
use subvolize_types::{InvalidSpec, OwnershipRecord};
use thiserror::Error;

/// Errors that abort a whole run before any target is touched
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] InvalidSpec),

    #[error(
        "root privileges are required to modify {base} (effective uid {euid}); use --dry-run to preview"
    )]
    Permission { base: PathBuf, euid: u32 },
}

/// Querying the filesystem about a target failed for a reason other than absence
#[derive(Debug, Error)]
#[error("cannot determine status of {path}: {source}")]
pub struct ClassificationError {
    pub path: PathBuf,
    #[source]
    pub source: BtrfsError,
}

/// Step of the migration sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MigrationStep {
    Preflight,
    CaptureOwnership,
    MoveToQuarantine,
    CreateSubvolume,
    CopyBack,
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationStep::Preflight => "preflight",
            MigrationStep::CaptureOwnership => "capture ownership",
            MigrationStep::MoveToQuarantine => "move to quarantine",
            MigrationStep::CreateSubvolume => "create subvolume",
            MigrationStep::CopyBack => "copy back",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum MigrationCause {
    #[error(transparent)]
    Sys(#[from] SysError),

    #[error(transparent)]
    Btrfs(#[from] BtrfsError),

    #[error("not a directory")]
    NotADirectory,

    #[error("quarantine entry {0} already exists from an earlier run")]
    QuarantineOccupied(PathBuf),
}

/// A step of the migration sequence failed
#[derive(Debug, Error)]
#[error("{step} failed for {path}: {cause}")]
pub struct MigrationError {
    pub step: MigrationStep,
    pub path: PathBuf,
    /// Ownership captured before the failure, if step 1 completed
    pub ownership: Option<OwnershipRecord>,
    /// Where the safety copy lives, if one exists
    pub quarantined: Option<PathBuf>,
    #[source]
    pub cause: MigrationCause,
}

impl MigrationError {
    pub(crate) fn new(step: MigrationStep, path: PathBuf, cause: impl Into<MigrationCause>) -> Self {
        Self {
            step,
            path,
            ownership: None,
            quarantined: None,
            cause: cause.into(),
        }
    }

    /// Instructions for putting things right by hand
    pub fn recovery_hint(&self) -> String {
        match &self.quarantined {
            Some(quarantined) => {
                let mut hint = format!(
                    "original data is preserved at {}; recreate {} as a subvolume and copy it back",
                    quarantined.display(),
                    self.path.display()
                );
                if let Some(record) = self.ownership {
                    hint.push_str(&format!(", then chown -R {record}"));
                }
                hint
            }
            None => format!("original data was not moved and remains at {}", self.path.display()),
        }
    }
}

/// Data was converted but its ownership could not be put back
#[derive(Debug, Error)]
#[error("failed to restore ownership {record} on {path}: {source}")]
pub struct OwnershipError {
    pub path: PathBuf,
    pub record: OwnershipRecord,
    #[source]
    pub source: SysError,
}

/// Any failure confined to a single target
#[derive(Debug, Error)]
pub enum TargetError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Migration(#[from] MigrationError),
}
