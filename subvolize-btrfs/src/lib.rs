// SPDX-License-Identifier: GPL-3.0-only

//! BTRFS operations library for subvolize
//!
//! This library answers "is this path a subvolume?" and creates new subvolumes.
//! Callers depend on the [`SubvolumeOps`] trait so the conversion engine can be
//! exercised against a fake backend on any filesystem.

pub mod error;
pub mod probe;
pub mod subvolume;

// Re-export commonly used types
pub use error::{BtrfsError, Result};
pub use probe::{BTRFS_SUPER_MAGIC, is_btrfs, is_subvolume_root};
pub use subvolume::{SubvolumeManager, SubvolumeOps};

// Re-export btrfsutil types for convenience
pub use btrfsutil;
