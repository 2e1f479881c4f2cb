// SPDX-License-Identifier: GPL-3.0-only

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use subvolize_btrfs::{BtrfsError, SubvolumeOps};
use subvolize_sys::{OwnershipOps, SysError, SystemOwnership};
use subvolize_types::OwnershipRecord;

static COUNTER: AtomicU64 = AtomicU64::new(1);

pub(crate) struct TempDir {
    pub(crate) path: PathBuf,
}

impl TempDir {
    pub(crate) fn new(label: &str) -> Self {
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "subvolize-core-{label}-{}-{unique}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Subvolume backend that treats plain directories as subvolumes once "created"
#[derive(Default)]
pub(crate) struct FakeSubvolumes {
    subvolumes: RefCell<BTreeSet<PathBuf>>,
    broken: RefCell<BTreeSet<PathBuf>>,
    failing_creates: RefCell<BTreeSet<PathBuf>>,
    occupied: RefCell<BTreeMap<PathBuf, String>>,
    pub(crate) create_calls: RefCell<Vec<PathBuf>>,
}

impl FakeSubvolumes {
    /// Create a directory at `path` and report it as a subvolume from now on
    pub(crate) fn mark_subvolume(&self, path: &Path) {
        fs::create_dir_all(path).expect("create fake subvolume");
        self.subvolumes.borrow_mut().insert(path.to_path_buf());
    }

    pub(crate) fn break_queries(&self, path: &Path) {
        self.broken.borrow_mut().insert(path.to_path_buf());
    }

    pub(crate) fn fail_create(&self, path: &Path) {
        self.failing_creates.borrow_mut().insert(path.to_path_buf());
    }

    /// The subvolume created at `path` starts out holding a directory named `entry`
    pub(crate) fn occupy_on_create(&self, path: &Path, entry: &str) {
        self.occupied
            .borrow_mut()
            .insert(path.to_path_buf(), entry.to_string());
    }
}

impl SubvolumeOps for FakeSubvolumes {
    fn is_subvolume(&self, path: &Path) -> subvolize_btrfs::Result<bool> {
        if self.broken.borrow().contains(path) {
            return Err(BtrfsError::OperationFailed(format!(
                "injected query failure for {}",
                path.display()
            )));
        }
        Ok(self.subvolumes.borrow().contains(path))
    }

    fn create(&self, path: &Path) -> subvolize_btrfs::Result<()> {
        self.create_calls.borrow_mut().push(path.to_path_buf());
        if self.failing_creates.borrow().contains(path) {
            return Err(BtrfsError::OperationFailed(format!(
                "injected create failure for {}",
                path.display()
            )));
        }
        fs::create_dir(path)?;
        if let Some(entry) = self.occupied.borrow().get(path) {
            fs::create_dir(path.join(entry))?;
        }
        self.subvolumes.borrow_mut().insert(path.to_path_buf());
        Ok(())
    }
}

/// Captures real ownership but refuses every restore
pub(crate) struct RefusingRestore;

impl OwnershipOps for RefusingRestore {
    fn capture(&self, path: &Path) -> subvolize_sys::Result<OwnershipRecord> {
        SystemOwnership.capture(path)
    }

    fn restore(&self, path: &Path, record: OwnershipRecord) -> subvolize_sys::Result<u64> {
        Err(SysError::PermissionDenied(format!(
            "Cannot chown {} to {}",
            path.display(),
            record
        )))
    }
}

/// Observable state of one filesystem entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntryState {
    Directory { mode: u32, uid: u32, gid: u32 },
    File { contents: Vec<u8>, mode: u32, uid: u32, gid: u32 },
    Symlink { target: PathBuf },
}

/// Every entry below `root`, keyed by relative path
pub(crate) fn snapshot_tree(root: &Path) -> BTreeMap<PathBuf, EntryState> {
    let mut entries = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(directory) = stack.pop() {
        for entry in fs::read_dir(&directory).expect("read dir") {
            let path = entry.expect("dir entry").path();
            let metadata = fs::symlink_metadata(&path).expect("stat entry");
            let relative = path.strip_prefix(root).expect("relative path").to_path_buf();
            let state = if metadata.file_type().is_symlink() {
                EntryState::Symlink {
                    target: fs::read_link(&path).expect("read link"),
                }
            } else if metadata.is_dir() {
                stack.push(path.clone());
                EntryState::Directory {
                    mode: metadata.mode(),
                    uid: metadata.uid(),
                    gid: metadata.gid(),
                }
            } else {
                EntryState::File {
                    contents: fs::read(&path).expect("read file"),
                    mode: metadata.mode(),
                    uid: metadata.uid(),
                    gid: metadata.gid(),
                }
            };
            entries.insert(relative, state);
        }
    }

    entries
}
