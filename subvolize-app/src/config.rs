// SPDX-License-Identifier: GPL-3.0-only

//! btrbk configuration loader
//!
//! Only two declarations matter here:
//!
//! ```text
//! volume /home/alice
//!   subvolume code
//!   subvolume Documents
//! ```
//!
//! Every `subvolume` belongs to the closest preceding `volume`. All other btrbk
//! keywords (targets, retention policies, hooks) are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use subvolize_types::{InvalidSpec, VolumeSpec};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: '{keyword}' needs a value")]
    MissingValue { line: usize, keyword: &'static str },

    #[error("line {line}: 'subvolume {name}' appears before any 'volume' declaration")]
    SubvolumeWithoutVolume { line: usize, name: String },

    #[error("No 'volume' declaration found in config")]
    NoVolume,

    #[error("No 'subvolume' declarations found in config")]
    NoSubvolumes,

    #[error(transparent)]
    Invalid(#[from] InvalidSpec),
}

/// Read and parse the btrbk configuration at `path`
pub fn load_config(path: &Path) -> Result<Vec<VolumeSpec>, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_config(&text)
}

/// Parse btrbk configuration text into one spec per volume that declares subvolumes
pub fn parse_config(text: &str) -> Result<Vec<VolumeSpec>, ConfigError> {
    let mut volumes: Vec<VolumeSpec> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        let number = index + 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (keyword, value) = match line.split_once(char::is_whitespace) {
            Some((keyword, value)) => (keyword, value.trim()),
            None => (line, ""),
        };

        match keyword {
            "volume" => {
                if value.is_empty() {
                    return Err(ConfigError::MissingValue {
                        line: number,
                        keyword: "volume",
                    });
                }
                tracing::debug!("Found volume base: {}", value);
                volumes.push(VolumeSpec::new(value, Vec::new()));
            }
            "subvolume" => {
                if value.is_empty() {
                    return Err(ConfigError::MissingValue {
                        line: number,
                        keyword: "subvolume",
                    });
                }
                let Some(volume) = volumes.last_mut() else {
                    return Err(ConfigError::SubvolumeWithoutVolume {
                        line: number,
                        name: value.to_string(),
                    });
                };
                tracing::debug!("  Found subvolume: {}", value);
                volume.target_names.push(value.to_string());
            }
            _ => {}
        }
    }

    if volumes.is_empty() {
        return Err(ConfigError::NoVolume);
    }

    let specs: Vec<VolumeSpec> = volumes
        .into_iter()
        .filter(|spec| {
            if spec.target_names.is_empty() {
                tracing::debug!(
                    "Volume {} declares no subvolumes, ignoring",
                    spec.base_path.display()
                );
            }
            !spec.target_names.is_empty()
        })
        .collect();

    if specs.is_empty() {
        return Err(ConfigError::NoSubvolumes);
    }

    for spec in &specs {
        spec.validate()?;
    }

    Ok(specs)
}
