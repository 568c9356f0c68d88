//! `FakeOrigin`: an in-memory `Origin` used by the test suite in place of
//! monkey-patching `std::fs`, in the same spirit as this codebase's `Mem`
//! repository backend.

use crate::attr::AttrRecord;
use crate::error::{EngineError, Result};
use crate::origin::Origin;
use crate::path::OriginPath;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct FakeFile {
    data: Vec<u8>,
}

#[derive(Default)]
struct Inner {
    files: HashMap<String, FakeFile>,
    dirs: HashMap<String, Vec<String>>,
    reads: Vec<(String, u64, u64)>,
}

/// A handle to an in-memory origin tree. Clones share the same underlying
/// storage, so a test can hold one clone to drive `CacheEngine` and another
/// to mutate the "real" content behind its back, simulating the origin
/// changing independently of the mount.
#[derive(Clone, Default)]
pub struct FakeOrigin {
    inner: Arc<Mutex<Inner>>,
}

impl FakeOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or overwrites) a file's content.
    pub fn put_file(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.inner
            .lock()
            .unwrap()
            .files
            .insert(path.to_string(), FakeFile { data: data.into() });
    }

    /// Registers (or overwrites) a directory's children.
    pub fn put_dir(&self, path: &str, children: Vec<String>) {
        self.inner
            .lock()
            .unwrap()
            .dirs
            .insert(path.to_string(), children);
    }

    /// Every `(path, offset, size)` the engine has requested from this
    /// origin, in order, for asserting "minimal origin traffic" style
    /// properties in tests.
    pub fn read_calls(&self) -> Vec<(String, u64, u64)> {
        self.inner.lock().unwrap().reads.clone()
    }

    pub fn total_bytes_requested(&self) -> u64 {
        self.read_calls().iter().map(|(_, _, size)| size).sum()
    }
}

impl Origin for FakeOrigin {
    fn getattr(&self, path: &OriginPath) -> Result<AttrRecord> {
        let inner = self.inner.lock().unwrap();
        if let Some(file) = inner.files.get(path.as_str()) {
            Ok(AttrRecord::synthetic_file(file.data.len() as u64))
        } else if inner.dirs.contains_key(path.as_str()) {
            Ok(AttrRecord::synthetic_dir())
        } else {
            Err(EngineError::NotFound(path.to_string()))
        }
    }

    fn readdir(&self, path: &OriginPath, _offset: u64) -> Result<Vec<String>> {
        self.inner
            .lock()
            .unwrap()
            .dirs
            .get(path.as_str())
            .cloned()
            .ok_or_else(|| EngineError::NotFound(path.to_string()))
    }

    fn read(&self, path: &OriginPath, offset: u64, size: u64) -> Result<Vec<u8>> {
        let mut inner = self.inner.lock().unwrap();
        let data = inner
            .files
            .get(path.as_str())
            .ok_or_else(|| EngineError::NotFound(path.to_string()))?
            .data
            .clone();
        inner.reads.push((path.to_string(), offset, size));
        let len = data.len() as u64;
        let start = offset.min(len);
        let end = offset.saturating_add(size).min(len);
        Ok(data[start as usize..end as usize].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_not_found() {
        let origin = FakeOrigin::new();
        let path = OriginPath::new("/nope").unwrap();
        assert!(matches!(
            origin.getattr(&path),
            Err(EngineError::NotFound(_))
        ));
    }

    #[test]
    fn read_clamps_at_eof_and_logs_the_call() {
        let origin = FakeOrigin::new();
        origin.put_file("/a", b"hello".to_vec());
        let path = OriginPath::new("/a").unwrap();
        let bytes = origin.read(&path, 3, 100).unwrap();
        assert_eq!(bytes, b"lo");
        assert_eq!(origin.read_calls(), vec![("/a".to_string(), 3, 100)]);
    }
}
