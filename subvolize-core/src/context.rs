// SPDX-License-Identifier: GPL-3.0-only

use subvolize_btrfs::SubvolumeOps;
use subvolize_sys::{OwnershipOps, SystemOwnership};

use crate::confirm::Confirm;
use crate::sink::ReportSink;

/// Policy flags for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Report intended actions without mutating anything. Overrides `interactive`.
    pub dry_run: bool,
    /// Prompt before converting a path that holds data; otherwise such paths are skipped
    pub interactive: bool,
    /// Whether the process holds the privilege needed for mutations
    pub privileged: bool,
    /// Effective uid, reported when privilege is missing
    pub euid: u32,
}

/// Everything a run needs, passed explicitly to each component
pub struct RunContext<'a> {
    pub options: RunOptions,
    pub subvolumes: &'a dyn SubvolumeOps,
    pub ownership: &'a dyn OwnershipOps,
    pub confirm: &'a mut dyn Confirm,
    pub sink: &'a mut dyn ReportSink,
}

impl<'a> RunContext<'a> {
    pub fn new(
        options: RunOptions,
        subvolumes: &'a dyn SubvolumeOps,
        confirm: &'a mut dyn Confirm,
        sink: &'a mut dyn ReportSink,
    ) -> Self {
        Self {
            options,
            subvolumes,
            ownership: &SystemOwnership,
            confirm,
            sink,
        }
    }

    pub fn with_ownership(mut self, ownership: &'a dyn OwnershipOps) -> Self {
        self.ownership = ownership;
        self
    }
}
