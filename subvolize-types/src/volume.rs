// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory under the volume base path that holds safety copies of migrated targets
pub const QUARANTINE_DIR_NAME: &str = "migrating_to_subvolumes";

/// Reasons a volume declaration cannot be processed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSpec {
    #[error("volume base path is empty")]
    EmptyBasePath,

    #[error("volume base path must be absolute: {0}")]
    RelativeBasePath(PathBuf),

    #[error("no subvolume targets declared for volume {0}")]
    NoTargets(PathBuf),

    #[error("invalid target name {name:?} for volume {base}")]
    InvalidTargetName { base: PathBuf, name: String },
}

/// A base path and the ordered target names that must become subvolumes beneath it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSpec {
    pub base_path: PathBuf,
    pub target_names: Vec<String>,
}

impl VolumeSpec {
    pub fn new(base_path: impl Into<PathBuf>, target_names: Vec<String>) -> Self {
        Self {
            base_path: base_path.into(),
            target_names,
        }
    }

    /// Check the invariants the engine relies on.
    ///
    /// Target names are relative paths below the base; absolute names and `..`
    /// components are rejected so a target can never escape the volume.
    pub fn validate(&self) -> Result<(), InvalidSpec> {
        if self.base_path.as_os_str().is_empty() {
            return Err(InvalidSpec::EmptyBasePath);
        }

        if !self.base_path.is_absolute() {
            return Err(InvalidSpec::RelativeBasePath(self.base_path.clone()));
        }

        if self.target_names.is_empty() {
            return Err(InvalidSpec::NoTargets(self.base_path.clone()));
        }

        for name in &self.target_names {
            let path = Path::new(name);
            let escapes = path.components().any(|component| {
                !matches!(component, std::path::Component::Normal(_))
            });

            if name.trim().is_empty() || escapes || name == QUARANTINE_DIR_NAME {
                return Err(InvalidSpec::InvalidTargetName {
                    base: self.base_path.clone(),
                    name: name.clone(),
                });
            }
        }

        Ok(())
    }

    /// Location of the quarantine area for this volume
    pub fn quarantine_path(&self) -> PathBuf {
        self.base_path.join(QUARANTINE_DIR_NAME)
    }
}

/// One path that must end up as a subvolume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionTarget {
    pub name: String,
    pub full_path: PathBuf,
}

impl ConversionTarget {
    pub fn new(base_path: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            full_path: base_path.join(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(base: &str, names: &[&str]) -> VolumeSpec {
        VolumeSpec::new(base, names.iter().map(|name| name.to_string()).collect())
    }

    #[test]
    fn accepts_nested_relative_names() {
        assert_eq!(spec("/srv/data", &["a", "projects/b"]).validate(), Ok(()));
    }

    #[test]
    fn rejects_empty_target_list() {
        assert_eq!(
            spec("/srv/data", &[]).validate(),
            Err(InvalidSpec::NoTargets(PathBuf::from("/srv/data")))
        );
    }

    #[test]
    fn rejects_relative_base() {
        assert!(matches!(
            spec("srv/data", &["a"]).validate(),
            Err(InvalidSpec::RelativeBasePath(_))
        ));
    }

    #[test]
    fn rejects_names_escaping_the_volume() {
        for name in ["../etc", "/etc", "", "a/../../b", QUARANTINE_DIR_NAME] {
            assert!(
                matches!(
                    spec("/srv/data", &[name]).validate(),
                    Err(InvalidSpec::InvalidTargetName { .. })
                ),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn target_path_joins_base_and_name() {
        let target = ConversionTarget::new(Path::new("/srv/data"), "c");
        assert_eq!(target.full_path, PathBuf::from("/srv/data/c"));
        assert_eq!(
            spec("/srv/data", &["c"]).quarantine_path(),
            PathBuf::from("/srv/data/migrating_to_subvolumes")
        );
    }
}
