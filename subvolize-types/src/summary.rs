// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::status::{MigrationOutcome, OwnershipRecord, TargetStatus};

/// Running counts reported at the end of a run
///
/// `Converted` is folded into `created`; `Skipped` is folded into `failed`
/// because both need manual follow-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub existing: usize,
    pub created: usize,
    pub failed: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: MigrationOutcome) {
        match outcome {
            MigrationOutcome::AlreadySubvolume => self.existing += 1,
            MigrationOutcome::Created | MigrationOutcome::Converted => self.created += 1,
            MigrationOutcome::Skipped | MigrationOutcome::Failed => self.failed += 1,
        }
    }

    pub fn merge(&mut self, other: Tally) {
        self.existing += other.existing;
        self.created += other.created;
        self.failed += other.failed;
    }
}

/// What happened to a single target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetReport {
    pub name: String,
    pub path: PathBuf,
    /// `None` when classification itself failed
    pub status: Option<TargetStatus>,
    pub outcome: MigrationOutcome,
    /// True when the outcome is what a real run would do, with nothing mutated
    pub planned: bool,
    pub message: String,
    /// Ownership captured before a migration, kept for manual recovery
    pub ownership: Option<OwnershipRecord>,
    /// Set when data was converted but ownership could not be restored
    pub ownership_warning: Option<String>,
}

impl TargetReport {
    pub fn needs_attention(&self) -> bool {
        !self.outcome.is_success() || self.ownership_warning.is_some()
    }
}

/// Result of processing one volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub base_path: PathBuf,
    pub dry_run: bool,
    pub tally: Tally,
    pub targets: Vec<TargetReport>,
    /// Present when at least one target was (or would be) converted
    pub quarantine: Option<PathBuf>,
}

impl RunSummary {
    pub fn new(base_path: PathBuf, dry_run: bool) -> Self {
        Self {
            base_path,
            dry_run,
            tally: Tally::default(),
            targets: Vec::new(),
            quarantine: None,
        }
    }

    pub fn push(&mut self, report: TargetReport) {
        self.tally.record(report.outcome);
        self.targets.push(report);
    }

    /// Every target ended as a subvolume
    pub fn is_clean(&self) -> bool {
        self.tally.failed == 0
    }
}
