//! `MetaStore`: durable persistence of `AttrRecord`, `DirListing`, and
//! `RangeSet`, one file per artifact under the cache root.

use crate::attr::AttrRecord;
use crate::error::Result;
use crate::layout::{ArtifactKind, CacheLayout};
use crate::path::OriginPath;
use crate::range::RangeSet;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Owns the on-disk representation of every cache entry's metadata.
///
/// Each artifact is a single MessagePack-encoded file; `get_*`/`put_*` pairs
/// are the only way callers touch the cache directory's metadata.
#[derive(Debug, Clone)]
pub struct MetaStore {
    layout: CacheLayout,
}

impl MetaStore {
    pub fn new(layout: CacheLayout) -> Self {
        MetaStore { layout }
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    pub fn get_attr(&self, path: &OriginPath) -> Result<Option<AttrRecord>> {
        read_optional(&self.layout.artifact_path(path, ArtifactKind::Attr))
    }

    pub fn put_attr(&self, path: &OriginPath, attr: &AttrRecord) -> Result<()> {
        write_value(&self.layout.artifact_path(path, ArtifactKind::Attr), attr)
    }

    pub fn get_listing(&self, path: &OriginPath) -> Result<Option<Vec<String>>> {
        read_optional(&self.layout.artifact_path(path, ArtifactKind::Listing))
    }

    pub fn put_listing(&self, path: &OriginPath, listing: &[String]) -> Result<()> {
        write_value(
            &self.layout.artifact_path(path, ArtifactKind::Listing),
            &listing,
        )
    }

    pub fn get_rangeset(&self, path: &OriginPath) -> Result<Option<RangeSet>> {
        read_optional(&self.layout.artifact_path(path, ArtifactKind::RangeSet))
    }

    pub fn put_rangeset(&self, path: &OriginPath, rangeset: &RangeSet) -> Result<()> {
        write_value(
            &self.layout.artifact_path(path, ArtifactKind::RangeSet),
            rangeset,
        )
    }

    /// The path of the sparse `DataBlob`. Creating/writing it is the
    /// engine's job; `MetaStore` only knows where it lives.
    pub fn data_path(&self, path: &OriginPath) -> std::path::PathBuf {
        self.layout.artifact_path(path, ArtifactKind::Data)
    }

    /// Ensures the directory that will hold `path`'s artifacts exists.
    /// Idempotent.
    pub fn ensure_entry_dir(&self, path: &OriginPath) -> Result<()> {
        fs::create_dir_all(self.layout.entry_dir(path))?;
        Ok(())
    }

    /// Deletes all four artifacts for `path`. Never fails because some are
    /// already absent.
    pub fn remove_entry(&self, path: &OriginPath) -> Result<()> {
        for kind in ArtifactKind::all() {
            let artifact = self.layout.artifact_path(path, kind);
            match fs::remove_file(&artifact) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

fn read_optional<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(rmp_serde::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_value<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = rmp_serde::to_vec(value)?;
    fs::write(path, bytes)?;
    Ok(())
}
