//! `MirrorFs`: a thin `fuser::Filesystem` adapter over `CacheEngine` and
//! `ControlSurface`.
//!
//! This module contains no cache logic of its own. Every request is
//! translated to an inode-free path, handed to the engine or the control
//! surface, and the result translated back into a `fuser` reply. The only
//! state this module owns is the inode table, which `fuser`'s inode-addressed
//! protocol requires but the path-addressed engine does not.

use crate::errno::to_errno;
use crate::inode::{InodeTable, NodeKey, ROOT_INODE};
use fuser::{
    FileAttr, FileType, Filesystem, ReplyAttr, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry,
    ReplyOpen, Request,
};
use mirrorfs_core::{AttrRecord, CacheEngine, ControlSurface, EngineError, OpenFlags, Origin, OriginPath};
use std::ffi::OsStr;
use std::time::{Duration, UNIX_EPOCH};
use tracing::{debug, warn};

/// Attribute cache TTL handed back to the kernel. Since the mirror never
/// refreshes an entry's attributes behind the kernel's back except through
/// explicit invalidation, a generous TTL is safe.
const ATTR_TTL: Duration = Duration::from_secs(1);

pub struct MirrorFs<O: Origin> {
    engine: CacheEngine<O>,
    control_name: String,
    inodes: InodeTable,
}

impl<O: Origin> MirrorFs<O> {
    pub fn new(engine: CacheEngine<O>, control_name: String) -> Self {
        MirrorFs {
            engine,
            control_name,
            inodes: InodeTable::new(),
        }
    }

    fn control_root(&self) -> String {
        format!("/{}", self.control_name)
    }

    fn surface(&self) -> ControlSurface<'_, O> {
        ControlSurface::new(self.control_name.clone(), &self.engine)
    }

    fn to_file_attr(&self, ino: u64, attr: &AttrRecord) -> FileAttr {
        let kind = if attr.is_dir() {
            FileType::Directory
        } else {
            FileType::RegularFile
        };
        let to_time = |t: mirrorfs_core::attr::Timestamp| {
            UNIX_EPOCH + Duration::new(t.secs.max(0) as u64, t.nanos)
        };
        FileAttr {
            ino,
            size: attr.size,
            blocks: (attr.size + 511) / 512,
            atime: to_time(attr.atime),
            mtime: to_time(attr.mtime),
            ctime: to_time(attr.ctime),
            crtime: UNIX_EPOCH,
            kind,
            perm: (attr.mode & 0o7777) as u16,
            nlink: attr.nlink,
            uid: attr.uid,
            gid: attr.gid,
            rdev: attr.rdev.unwrap_or(0) as u32,
            blksize: attr.blksize.unwrap_or(4096),
            flags: 0,
        }
    }

    /// Resolves `(parent, name)` to the `NodeKey` the kernel is asking
    /// about, without touching the engine.
    fn child_key(&self, parent: &NodeKey, name: &str) -> NodeKey {
        match parent {
            NodeKey::Origin(path) if path.is_root() && name == self.control_name => {
                NodeKey::Control(self.control_root())
            }
            NodeKey::Origin(path) => NodeKey::Origin(path.child(name)),
            NodeKey::Control(raw) => NodeKey::Control(format!("{raw}/{name}")),
        }
    }

    fn getattr_for(&self, key: &NodeKey) -> Result<AttrRecord, EngineError> {
        match key {
            NodeKey::Origin(path) => self.engine.getattr(path),
            NodeKey::Control(raw) => self.surface().getattr(raw),
        }
    }
}

impl<O: Origin> Filesystem for MirrorFs<O> {
    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let name = match name.to_str() {
            Some(n) => n,
            None => return reply.error(libc::EINVAL),
        };
        let parent_key = match self.inodes.lookup(parent) {
            Some(k) => k,
            None => return reply.error(libc::ENOENT),
        };
        let key = self.child_key(&parent_key, name);
        match self.getattr_for(&key) {
            Ok(attr) => {
                let ino = self.inodes.intern(key);
                reply.entry(&ATTR_TTL, &self.to_file_attr(ino, &attr), 0);
            }
            Err(e) => {
                debug!(%name, "lookup failed: {e}");
                reply.error(to_errno(&e));
            }
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyAttr) {
        let key = match self.inodes.lookup(ino) {
            Some(k) => k,
            None => return reply.error(libc::ENOENT),
        };
        match self.getattr_for(&key) {
            Ok(attr) => reply.attr(&ATTR_TTL, &self.to_file_attr(ino, &attr)),
            Err(e) => reply.error(to_errno(&e)),
        }
    }

    fn readdir(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, offset: i64, mut reply: ReplyDirectory) {
        let key = match self.inodes.lookup(ino) {
            Some(k) => k,
            None => return reply.error(libc::ENOENT),
        };

        let names = match &key {
            NodeKey::Origin(path) => {
                let mut names = match self.engine.readdir(path, 0) {
                    Ok(n) => n,
                    Err(e) => return reply.error(to_errno(&e)),
                };
                if path.is_root() {
                    names.push(self.control_name.clone());
                }
                names
            }
            NodeKey::Control(raw) => match self.surface().readdir(raw) {
                Ok(n) => n,
                Err(e) => return reply.error(to_errno(&e)),
            },
        };

        let mut entries: Vec<(u64, FileType, String)> = vec![
            (ino, FileType::Directory, ".".to_string()),
            (ino, FileType::Directory, "..".to_string()),
        ];
        for name in names {
            let child_key = self.child_key(&key, &name);
            let attr = match self.getattr_for(&child_key) {
                Ok(a) => a,
                Err(e) => {
                    warn!(%name, "skipping directory entry: {e}");
                    continue;
                }
            };
            let child_ino = self.inodes.intern(child_key);
            let kind = if attr.is_dir() {
                FileType::Directory
            } else {
                FileType::RegularFile
            };
            entries.push((child_ino, kind, name));
        }

        for (i, (entry_ino, kind, name)) in entries.into_iter().enumerate().skip(offset.max(0) as usize) {
            if reply.add(entry_ino, (i + 1) as i64, kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        let key = match self.inodes.lookup(ino) {
            Some(k) => k,
            None => return reply.error(libc::ENOENT),
        };
        let open_flags = OpenFlags {
            write: flags & libc::O_WRONLY != 0 || flags & libc::O_RDWR != 0,
            append: flags & libc::O_APPEND != 0,
            truncate: flags & libc::O_TRUNC != 0,
            create: flags & libc::O_CREAT != 0,
        };
        match &key {
            NodeKey::Origin(path) => match self.engine.open(path, open_flags) {
                Ok(()) => reply.opened(0, 0),
                Err(e) => reply.error(to_errno(&e)),
            },
            // Writes to `cached` arrive through `write`, not via open flags;
            // the control surface has no file-descriptor state to set up.
            NodeKey::Control(_) => reply.opened(0, 0),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let key = match self.inodes.lookup(ino) {
            Some(k) => k,
            None => return reply.error(libc::ENOENT),
        };
        let offset = offset.max(0) as u64;
        match &key {
            NodeKey::Origin(path) => match self.engine.read(path, offset, size as u64) {
                Ok(bytes) => reply.data(&bytes),
                Err(e) => reply.error(to_errno(&e)),
            },
            NodeKey::Control(raw) => {
                let origin_path = match control_target(raw, &self.control_root()) {
                    Some(p) => p,
                    None => return reply.error(libc::EISDIR),
                };
                match self.surface().read_cached(&origin_path) {
                    Ok(text) => {
                        let bytes = text.into_bytes();
                        let start = (offset as usize).min(bytes.len());
                        let end = (start + size as usize).min(bytes.len());
                        reply.data(&bytes[start..end]);
                    }
                    Err(e) => reply.error(to_errno(&e)),
                }
            }
        }
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: fuser::ReplyWrite,
    ) {
        let key = match self.inodes.lookup(ino) {
            Some(k) => k,
            None => return reply.error(libc::ENOENT),
        };
        match &key {
            NodeKey::Control(raw) => {
                let origin_path = match control_target(raw, &self.control_root()) {
                    Some(p) => p,
                    None => return reply.error(libc::EISDIR),
                };
                match self.surface().write_cached(&origin_path, data) {
                    Ok(()) => reply.written(data.len() as u32),
                    Err(e) => reply.error(to_errno(&e)),
                }
            }
            NodeKey::Origin(path) => match self.engine.write(path, offset.max(0) as u64, data) {
                Ok(n) => reply.written(n as u32),
                Err(e) => reply.error(to_errno(&e)),
            },
        }
    }

    fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        let parent_key = match self.inodes.lookup(parent) {
            Some(k) => k,
            None => return reply.error(libc::ENOENT),
        };
        let name = name.to_str().unwrap_or_default();
        match self.child_key(&parent_key, name) {
            NodeKey::Origin(path) => match self.engine.unlink(&path) {
                Ok(()) => reply.ok(),
                Err(e) => reply.error(to_errno(&e)),
            },
            NodeKey::Control(_) => reply.error(libc::EROFS),
        }
    }

    fn mknod(
        &mut self,
        _req: &Request<'_>,
        _parent: u64,
        _name: &OsStr,
        _mode: u32,
        _umask: u32,
        _rdev: u32,
        reply: ReplyEntry,
    ) {
        reply.error(to_errno(&EngineError::ReadOnlyFs));
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _mode: Option<u32>,
        _uid: Option<u32>,
        _gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<fuser::TimeOrNow>,
        _mtime: Option<fuser::TimeOrNow>,
        _ctime: Option<std::time::SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<std::time::SystemTime>,
        _chgtime: Option<std::time::SystemTime>,
        _bkuptime: Option<std::time::SystemTime>,
        _flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        if size.is_some() {
            return reply.error(to_errno(&EngineError::ReadOnlyFs));
        }
        self.getattr(_req, ino, reply);
    }
}

/// Recovers the origin path a `cached` read/write targets from its raw
/// control path, or `None` if `raw` names the directory node itself.
fn control_target(raw: &str, control_root: &str) -> Option<OriginPath> {
    let dir_part = raw.strip_suffix("/cached")?;
    let origin = if dir_part == control_root || dir_part.is_empty() {
        "/"
    } else {
        dir_part.strip_prefix(control_root)?
    };
    OriginPath::new(origin).ok()
}
