// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for subvolize
//!
//! These types are shared by every layer of the workspace:
//!
//! - **subvolize-core**: Produces `TargetReport`s and a `RunSummary` per volume
//! - **subvolize-app**: Builds `VolumeSpec`s from btrbk configuration and renders
//!   the summary as text or JSON
//!
//! Everything here is transient and recomputed per invocation. The only state that
//! outlives a run is the quarantine area on disk, whose layout is described by
//! [`QUARANTINE_DIR_NAME`].

pub mod status;
pub mod summary;
pub mod volume;

pub use status::{MigrationOutcome, OwnershipRecord, TargetStatus};
pub use summary::{RunSummary, Tally, TargetReport};
pub use volume::{ConversionTarget, InvalidSpec, QUARANTINE_DIR_NAME, VolumeSpec};
