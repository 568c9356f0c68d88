//! Inode bookkeeping for the FUSE glue.
//!
//! `fuser`'s `Filesystem` trait is inode-addressed, while `CacheEngine` and
//! `ControlSurface` are path-addressed; this table is the translation layer
//! between the two, allocating inodes lazily as the kernel discovers paths
//! via `lookup`/`readdir`.

use mirrorfs_core::OriginPath;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub const ROOT_INODE: u64 = 1;

/// Identifies a node exposed through the mount: either a path under the
/// mirrored origin tree, or a path under the control surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Origin(OriginPath),
    /// Raw control-surface path, e.g. `/.control` or `/.control/a/cached`.
    Control(String),
}

/// Bidirectional, lazily-populated map from inode number to `NodeKey`.
/// Entries are never evicted: the mount's lifetime is short enough, and the
/// kernel may hold an inode reference past a cache invalidation.
pub struct InodeTable {
    next: AtomicU64,
    forward: Mutex<HashMap<u64, NodeKey>>,
    reverse: Mutex<HashMap<NodeKey, u64>>,
}

impl InodeTable {
    pub fn new() -> Self {
        let mut forward = HashMap::new();
        let mut reverse = HashMap::new();
        let root = NodeKey::Origin(OriginPath::root());
        forward.insert(ROOT_INODE, root.clone());
        reverse.insert(root, ROOT_INODE);
        InodeTable {
            next: AtomicU64::new(ROOT_INODE + 1),
            forward: Mutex::new(forward),
            reverse: Mutex::new(reverse),
        }
    }

    pub fn lookup(&self, ino: u64) -> Option<NodeKey> {
        self.forward.lock().unwrap().get(&ino).cloned()
    }

    /// Returns the existing inode for `key`, or allocates and records a new
    /// one.
    pub fn intern(&self, key: NodeKey) -> u64 {
        let mut reverse = self.reverse.lock().unwrap();
        if let Some(ino) = reverse.get(&key) {
            return *ino;
        }
        let ino = self.next.fetch_add(1, Ordering::SeqCst);
        reverse.insert(key.clone(), ino);
        self.forward.lock().unwrap().insert(ino, key);
        ino
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}
