//! `CacheEngine`: orchestrates reads against the origin adapter, the
//! `MetaStore`, and the sparse `DataBlob`s, and owns cache-only mode,
//! invalidation, and prefetch.

use crate::attr::AttrRecord;
use crate::error::{EngineError, Result};
use crate::layout::CacheLayout;
use crate::metastore::MetaStore;
use crate::origin::Origin;
use crate::path::OriginPath;
use crate::range::{Range, RangeSet};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument, trace};

/// The access-mode bits a caller asked `open` for. The mirror is read-only,
/// so every bit here other than a bare read request is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    pub write: bool,
    pub append: bool,
    pub truncate: bool,
    pub create: bool,
}

impl OpenFlags {
    fn is_read_only(self) -> bool {
        !(self.write || self.append || self.truncate || self.create)
    }
}

/// Orchestrates the read path: consult the cache, fill gaps from the origin,
/// persist, serve from the sparse data file.
///
/// Designed for single-threaded cooperative invocation: every public entry
/// point takes an exclusive lock on its `OriginPath` before touching that
/// path's artifacts, so distinct paths may proceed in parallel while any one
/// path's sequence of (load RangeSet → fill gaps → persist → serve) is never
/// interleaved with itself.
pub struct CacheEngine<O: Origin> {
    layout: CacheLayout,
    meta: MetaStore,
    origin: O,
    cache_only: AtomicBool,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<O: Origin> CacheEngine<O> {
    pub fn new(cache_root: impl Into<PathBuf>, origin: O) -> Self {
        let layout = CacheLayout::new(cache_root);
        CacheEngine {
            meta: MetaStore::new(layout.clone()),
            layout,
            origin,
            cache_only: AtomicBool::new(false),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    pub fn set_cache_only(&self, enabled: bool) {
        self.cache_only.store(enabled, Ordering::SeqCst);
    }

    pub fn is_cache_only(&self) -> bool {
        self.cache_only.load(Ordering::SeqCst)
    }

    fn lock_for(&self, path: &OriginPath) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(path.as_str().to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[instrument(skip(self), fields(path = %path))]
    pub fn getattr(&self, path: &OriginPath) -> Result<AttrRecord> {
        let lock = self.lock_for(path);
        let _guard = lock.lock().unwrap();
        self.getattr_locked(path)
    }

    fn getattr_locked(&self, path: &OriginPath) -> Result<AttrRecord> {
        if let Some(attr) = self.meta.get_attr(path)? {
            return Ok(attr);
        }
        if self.is_cache_only() {
            return Err(EngineError::CacheMiss(path.to_string()));
        }
        let attr = self.origin.getattr(path)?;
        self.meta.put_attr(path, &attr)?;
        Ok(attr)
    }

    #[instrument(skip(self), fields(path = %path))]
    pub fn readdir(&self, path: &OriginPath, _offset: u64) -> Result<Vec<String>> {
        let lock = self.lock_for(path);
        let _guard = lock.lock().unwrap();
        if let Some(listing) = self.meta.get_listing(path)? {
            return Ok(listing);
        }
        if self.is_cache_only() {
            return Err(EngineError::CacheMiss(path.to_string()));
        }
        let listing = self.origin.readdir(path, 0)?;
        self.meta.put_listing(path, &listing)?;
        Ok(listing)
    }

    /// Succeeds only for a read-only access mode; any write/truncate/append
    /// bit is rejected.
    pub fn open(&self, path: &OriginPath, flags: OpenFlags) -> Result<()> {
        if flags.is_read_only() {
            Ok(())
        } else {
            debug!(%path, "rejecting open with write-capable flags");
            Err(EngineError::PermissionDenied(format!(
                "{path} is part of a read-only mirror"
            )))
        }
    }

    #[instrument(skip(self), fields(path = %path))]
    pub fn read(&self, path: &OriginPath, offset: u64, size: u64) -> Result<Vec<u8>> {
        if size == 0 {
            return Ok(Vec::new());
        }
        let probe = Range::new(offset, offset + size)?;

        let lock = self.lock_for(path);
        let _guard = lock.lock().unwrap();

        let mut rangeset = self.meta.get_rangeset(path)?.unwrap_or_default();
        let gaps = rangeset.gaps(probe);

        let data_path = self.meta.data_path(path);
        if !gaps.is_empty() {
            if self.is_cache_only() {
                return Err(EngineError::CacheMiss(path.to_string()));
            }
            let attr = self.getattr_locked(path)?;
            self.ensure_data_blob(path, &attr, &data_path)?;

            let mut file = OpenOptions::new().write(true).read(true).open(&data_path)?;
            for gap in &gaps {
                trace!(%path, gap.start, gap.end, "filling gap from origin");
                let bytes = self.origin.read(path, gap.start, gap.size())?;
                if bytes.is_empty() {
                    // Origin is at EOF for this gap; nothing to record.
                    continue;
                }
                let filled_end = gap.start + bytes.len() as u64;
                file.seek(SeekFrom::Start(gap.start))?;
                file.write_all(&bytes)?;
                rangeset.insert(Range::new(gap.start, filled_end)?);
            }
            self.meta.put_rangeset(path, &rangeset)?;
        }

        let mut file = std::fs::File::open(&data_path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; size as usize];
        let n = file.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Creates the DataBlob sparsely, sized exactly to `attr.size`, if it
    /// does not already exist. `set_len` relies on the host filesystem's
    /// sparse-file support rather than zero-filling.
    fn ensure_data_blob(&self, path: &OriginPath, attr: &AttrRecord, data_path: &std::path::Path) -> Result<()> {
        if data_path.exists() {
            return Ok(());
        }
        self.meta.ensure_entry_dir(path)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(data_path)?;
        file.set_len(attr.size)?;
        Ok(())
    }

    /// Total bytes of `path`'s data currently backed by authoritative origin
    /// content, used by the control surface's coverage fraction.
    pub fn covered_bytes(&self, path: &OriginPath) -> Result<u64> {
        let lock = self.lock_for(path);
        let _guard = lock.lock().unwrap();
        Ok(self
            .meta
            .get_rangeset(path)?
            .unwrap_or_default()
            .covered_bytes())
    }

    #[instrument(skip(self), fields(path = %path))]
    pub fn invalidate(&self, path: &OriginPath) -> Result<()> {
        let lock = self.lock_for(path);
        let _guard = lock.lock().unwrap();
        self.meta.remove_entry(path)
    }

    /// Drives the read path over the file's full extent so the RangeSet ends
    /// up covering `[0, size)`.
    #[instrument(skip(self), fields(path = %path))]
    pub fn prefetch(&self, path: &OriginPath) -> Result<()> {
        let attr = self.getattr(path)?;
        if attr.size == 0 {
            return Ok(());
        }
        self.read(path, 0, attr.size)?;
        Ok(())
    }

    /// Every mutating entry point on a mirrored path signals the same
    /// read-only-filesystem error.
    pub fn write(&self, _path: &OriginPath, _offset: u64, _data: &[u8]) -> Result<usize> {
        Err(EngineError::ReadOnlyFs)
    }

    pub fn unlink(&self, _path: &OriginPath) -> Result<()> {
        Err(EngineError::ReadOnlyFs)
    }

    pub fn mknod(&self, _path: &OriginPath) -> Result<()> {
        Err(EngineError::ReadOnlyFs)
    }

    pub fn truncate(&self, _path: &OriginPath, _size: u64) -> Result<()> {
        Err(EngineError::ReadOnlyFs)
    }
}
