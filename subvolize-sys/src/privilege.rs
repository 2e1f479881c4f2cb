// SPDX-License-Identifier: GPL-3.0-only

/// Effective user id of this process
pub fn effective_uid() -> u32 {
    unsafe { libc::geteuid() }
}

/// Whether the process may create subvolumes and change ownership of any file
pub fn is_privileged() -> bool {
    effective_uid() == 0
}
