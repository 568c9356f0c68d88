//! The `Origin` trait and its real, `std::fs`-backed implementation.
//!
//! The engine is generic over `Origin` rather than calling into `std::fs`
//! directly, so tests can swap in [`crate::fake_origin::FakeOrigin`] instead
//! of monkey-patching global filesystem state.

use crate::attr::AttrRecord;
use crate::error::{EngineError, Result};
use crate::path::OriginPath;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

/// Abstracts read-only access to the real filesystem being mirrored.
pub trait Origin: Send + Sync {
    fn getattr(&self, path: &OriginPath) -> Result<AttrRecord>;
    fn readdir(&self, path: &OriginPath, offset: u64) -> Result<Vec<String>>;
    /// Reads up to `size` bytes starting at `offset`. May return fewer bytes
    /// than requested at EOF; never an error for a short read by itself.
    fn read(&self, path: &OriginPath, offset: u64, size: u64) -> Result<Vec<u8>>;
}

/// The production `Origin`: reads directly against a real directory tree.
#[derive(Debug, Clone)]
pub struct RealOrigin {
    root: PathBuf,
}

impl RealOrigin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RealOrigin { root: root.into() }
    }

    fn real_path(&self, path: &OriginPath) -> PathBuf {
        self.root.join(path.relative())
    }
}

fn map_io_error(e: std::io::Error, path: &OriginPath) -> EngineError {
    if e.kind() == std::io::ErrorKind::NotFound {
        EngineError::NotFound(path.to_string())
    } else {
        EngineError::IoError(e)
    }
}

impl Origin for RealOrigin {
    fn getattr(&self, path: &OriginPath) -> Result<AttrRecord> {
        let meta = fs::metadata(self.real_path(path)).map_err(|e| map_io_error(e, path))?;
        Ok(AttrRecord::from_metadata(&meta))
    }

    fn readdir(&self, path: &OriginPath, _offset: u64) -> Result<Vec<String>> {
        let dir = self.real_path(path);
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| map_io_error(e, path))? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    fn read(&self, path: &OriginPath, offset: u64, size: u64) -> Result<Vec<u8>> {
        let mut file = File::open(self.real_path(path)).map_err(|e| map_io_error(e, path))?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; size as usize];
        let n = file.read(&mut buf)?;
        buf.truncate(n);
        Ok(buf)
    }
}
