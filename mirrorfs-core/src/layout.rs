//! `CacheLayout`: the pure mapping from an origin path to on-disk cache
//! artifact paths. Touches no filesystem state itself.

use crate::path::OriginPath;
use std::path::PathBuf;

/// The four fixed artifact files a cache entry may own. Names are part of
/// the external on-disk interface and must not change across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The sparse `DataBlob`.
    Data,
    /// The serialized `RangeSet` paired with `Data`.
    RangeSet,
    /// The serialized `AttrRecord`.
    Attr,
    /// The serialized `DirListing`.
    Listing,
}

impl ArtifactKind {
    fn filename(self) -> &'static str {
        match self {
            ArtifactKind::Data => "cache.data",
            ArtifactKind::RangeSet => "cache.data.range",
            ArtifactKind::Attr => "cache.stat",
            ArtifactKind::Listing => "cache.list",
        }
    }

    /// All four kinds, in a fixed order, used when removing an entry wholesale.
    pub fn all() -> [ArtifactKind; 4] {
        [
            ArtifactKind::Data,
            ArtifactKind::RangeSet,
            ArtifactKind::Attr,
            ArtifactKind::Listing,
        ]
    }
}

/// Maps `(origin_path, artifact_kind)` to a path beneath a cache root.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CacheLayout { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// The directory that holds every artifact for `path`.
    pub fn entry_dir(&self, path: &OriginPath) -> PathBuf {
        self.root.join(path.relative())
    }

    /// The file backing one artifact of `path`.
    pub fn artifact_path(&self, path: &OriginPath, kind: ArtifactKind) -> PathBuf {
        self.entry_dir(path).join(kind.filename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nests_origin_subpaths_as_directories() {
        let layout = CacheLayout::new("/var/cache/mirrorfs");
        let path = OriginPath::new("/a/b/c.txt").unwrap();
        assert_eq!(
            layout.artifact_path(&path, ArtifactKind::Data),
            PathBuf::from("/var/cache/mirrorfs/a/b/c.txt/cache.data")
        );
        assert_eq!(
            layout.artifact_path(&path, ArtifactKind::RangeSet),
            PathBuf::from("/var/cache/mirrorfs/a/b/c.txt/cache.data.range")
        );
        assert_eq!(
            layout.artifact_path(&path, ArtifactKind::Attr),
            PathBuf::from("/var/cache/mirrorfs/a/b/c.txt/cache.stat")
        );
        assert_eq!(
            layout.artifact_path(&path, ArtifactKind::Listing),
            PathBuf::from("/var/cache/mirrorfs/a/b/c.txt/cache.list")
        );
    }

    #[test]
    fn root_path_maps_to_cache_root_itself() {
        let layout = CacheLayout::new("/var/cache/mirrorfs");
        let root = OriginPath::root();
        assert_eq!(
            layout.artifact_path(&root, ArtifactKind::Attr),
            PathBuf::from("/var/cache/mirrorfs/cache.stat")
        );
    }
}
