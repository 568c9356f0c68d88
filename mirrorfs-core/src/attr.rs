//! `AttrRecord`: a snapshot of origin-side file attributes.

use serde::{Deserialize, Serialize};

/// Seconds + nanoseconds, stored as fixed-width integers so the value
/// round-trips exactly through MessagePack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp {
    pub secs: i64,
    pub nanos: u32,
}

/// A snapshot of an origin path's attributes, as returned by `stat(2)` on the
/// origin adapter's backing filesystem.
///
/// This record is the snapshot DataBlob's length was sized against and is
/// never refreshed independently of the data it describes — only
/// invalidation replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttrRecord {
    pub mode: u32,
    pub nlink: u32,
    pub size: u64,
    pub atime: Timestamp,
    pub mtime: Timestamp,
    pub ctime: Timestamp,
    pub dev: u64,
    pub ino: u64,
    pub uid: u32,
    pub gid: u32,
    pub rdev: Option<u64>,
    pub blksize: Option<u32>,
}

impl AttrRecord {
    pub fn is_dir(&self) -> bool {
        (self.mode & libc::S_IFMT) == libc::S_IFDIR
    }

    pub fn is_file(&self) -> bool {
        (self.mode & libc::S_IFMT) == libc::S_IFREG
    }

    /// Builds the record this crate uses internally to describe synthetic
    /// directories (the control surface's own nodes, a fake origin's `Dir`
    /// entries), rather than anything read from a real `stat(2)` call.
    pub fn synthetic_dir() -> AttrRecord {
        AttrRecord {
            mode: libc::S_IFDIR | 0o755,
            nlink: 2,
            size: 0,
            atime: Timestamp { secs: 0, nanos: 0 },
            mtime: Timestamp { secs: 0, nanos: 0 },
            ctime: Timestamp { secs: 0, nanos: 0 },
            dev: 0,
            ino: 0,
            uid: 0,
            gid: 0,
            rdev: None,
            blksize: Some(4096),
        }
    }

    /// Builds the record this crate uses internally to describe synthetic
    /// regular files of a given size (e.g. a fake origin's file entries, or
    /// the control surface's `cached` pseudo-files).
    pub fn synthetic_file(size: u64) -> AttrRecord {
        AttrRecord {
            mode: libc::S_IFREG | 0o644,
            nlink: 1,
            size,
            atime: Timestamp { secs: 0, nanos: 0 },
            mtime: Timestamp { secs: 0, nanos: 0 },
            ctime: Timestamp { secs: 0, nanos: 0 },
            dev: 0,
            ino: 0,
            uid: 0,
            gid: 0,
            rdev: None,
            blksize: Some(4096),
        }
    }

    #[cfg(unix)]
    pub fn from_metadata(meta: &std::fs::Metadata) -> AttrRecord {
        use std::os::unix::fs::MetadataExt;
        AttrRecord {
            mode: meta.mode(),
            nlink: meta.nlink() as u32,
            size: meta.size(),
            atime: Timestamp {
                secs: meta.atime(),
                nanos: meta.atime_nsec() as u32,
            },
            mtime: Timestamp {
                secs: meta.mtime(),
                nanos: meta.mtime_nsec() as u32,
            },
            ctime: Timestamp {
                secs: meta.ctime(),
                nanos: meta.ctime_nsec() as u32,
            },
            dev: meta.dev(),
            ino: meta.ino(),
            uid: meta.uid(),
            gid: meta.gid(),
            rdev: Some(meta.rdev()),
            blksize: Some(meta.blksize() as u32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_inferred_from_mode() {
        assert!(AttrRecord::synthetic_dir().is_dir());
        assert!(!AttrRecord::synthetic_dir().is_file());
        assert!(AttrRecord::synthetic_file(0).is_file());
        assert!(!AttrRecord::synthetic_file(0).is_dir());
    }
}
