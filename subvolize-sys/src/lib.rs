// SPDX-License-Identifier: GPL-3.0-only

//! Low-level system operations for subvolume conversion
//!
//! This crate provides the filesystem primitives the conversion engine is built from:
//! - Ownership capture and recursive, symlink-safe restore
//! - Moving a directory tree, with a verified copy fallback across devices
//! - Copying a tree without dereferencing symlinks
//! - Effective privilege checks
//!
//! The mutating operations require elevated privileges for anything not owned by
//! the caller.

pub mod error;
pub mod ownership;
pub mod privilege;
pub mod tree;

pub use error::{Result, SysError};
pub use ownership::{OwnershipOps, SystemOwnership, capture_ownership, restore_ownership};
pub use privilege::{effective_uid, is_privileged};
pub use tree::{MoveKind, TreeManifest, copy_contents, copy_tree, move_tree, tree_manifest};

#[cfg(test)]
pub(crate) mod testing;
