// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// Where a target path stands before anything is done to it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    IsSubvolume,
    ExistsAsPlainPath,
    NotPresent,
}

impl TargetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetStatus::IsSubvolume => "subvolume",
            TargetStatus::ExistsAsPlainPath => "plain path",
            TargetStatus::NotPresent => "not present",
        }
    }
}

/// Final result for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationOutcome {
    AlreadySubvolume,
    Created,
    Converted,
    /// Conversion was declined or needs an interactive run
    Skipped,
    Failed,
}

impl MigrationOutcome {
    /// Whether this outcome leaves the target as a subvolume
    pub fn is_success(self) -> bool {
        matches!(
            self,
            MigrationOutcome::AlreadySubvolume
                | MigrationOutcome::Created
                | MigrationOutcome::Converted
        )
    }
}

/// Owner and group captured from a target before it is moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub uid: u32,
    pub gid: u32,
}

impl std::fmt::Display for OwnershipRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.uid, self.gid)
    }
}
