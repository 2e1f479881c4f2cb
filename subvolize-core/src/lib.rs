// SPDX-License-Identifier: GPL-3.0-only

//! Subvolume conversion engine
//!
//! Given a [`VolumeSpec`](subvolize_types::VolumeSpec), the orchestrator resolves
//! every target path, classifies it, and either leaves it alone, creates a fresh
//! subvolume, or migrates existing data through the quarantine area:
//!
//! 1. capture ownership
//! 2. move the tree to `<base>/migrating_to_subvolumes/<name>`
//! 3. create the subvolume
//! 4. copy the data back
//! 5. restore ownership
//!
//! After step 2 the data always exists in at least one complete place. The
//! quarantine copy is never removed here; deleting it is left to the operator.

pub mod classifier;
pub mod confirm;
pub mod context;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod resolver;
pub mod sink;

pub use classifier::classify;
pub use confirm::{Confirm, ConsolePrompt, ScriptedConfirm};
pub use context::{RunContext, RunOptions};
pub use error::{
    ClassificationError, MigrationCause, MigrationError, MigrationStep, OwnershipError, RunError,
    TargetError,
};
pub use executor::{Conversion, MigrationExecutor};
pub use orchestrator::{run, survey};
pub use resolver::resolve;
pub use sink::ReportSink;

#[cfg(test)]
pub(crate) mod testing;
