// SPDX-License-Identifier: GPL-3.0-only

use subvolize_types::{ConversionTarget, VolumeSpec};

/// One target per declared name, in declaration order
pub fn resolve(spec: &VolumeSpec) -> Vec<ConversionTarget> {
    spec.target_names
        .iter()
        .map(|name| ConversionTarget::new(&spec.base_path, name))
        .collect()
}
