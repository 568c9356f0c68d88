//! `ControlSurface`: a virtual namespace mirroring the origin tree, exposing
//! a `cached` pseudo-file per entry that reports and drives engine state.

use crate::attr::AttrRecord;
use crate::engine::CacheEngine;
use crate::error::{EngineError, Result};
use crate::origin::Origin;
use crate::path::OriginPath;

const CACHED_LEAF: &str = "cached";

/// What a control-surface path resolves to: either a directory node (the
/// control root, an origin directory mirrored structurally, or an origin
/// file presented as a directory containing only `cached`), or the `cached`
/// leaf itself for some origin path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlNode {
    Dir(OriginPath),
    Cached(OriginPath),
}

/// Overlays `/<root_name>/...` on top of a [`CacheEngine`], one-to-one with
/// the origin tree, without ever mutating cache entries directly — every
/// effect goes back through the engine.
pub struct ControlSurface<'a, O: Origin> {
    root_name: String,
    engine: &'a CacheEngine<O>,
}

impl<'a, O: Origin> ControlSurface<'a, O> {
    pub fn new(root_name: impl Into<String>, engine: &'a CacheEngine<O>) -> Self {
        ControlSurface {
            root_name: root_name.into(),
            engine,
        }
    }

    fn prefix(&self) -> String {
        format!("/{}", self.root_name)
    }

    /// True if `control_path` falls under this surface's root.
    pub fn contains(&self, control_path: &str) -> bool {
        let prefix = self.prefix();
        control_path == prefix || control_path.starts_with(&format!("{prefix}/"))
    }

    /// Resolves a control-surface path to the origin path it mirrors, and
    /// whether it names the directory node or the `cached` leaf.
    pub fn resolve(&self, control_path: &str) -> Result<ControlNode> {
        let prefix = self.prefix();
        let rest = control_path
            .strip_prefix(&prefix)
            .ok_or_else(|| EngineError::NotFound(control_path.to_string()))?;

        if let Some(dir_part) = rest.strip_suffix(&format!("/{CACHED_LEAF}")) {
            let origin = if dir_part.is_empty() { "/" } else { dir_part };
            return Ok(ControlNode::Cached(OriginPath::new(origin)?));
        }
        let origin = if rest.is_empty() { "/" } else { rest };
        Ok(ControlNode::Dir(OriginPath::new(origin)?))
    }

    /// Attributes for a control-surface node. Directory nodes are synthetic;
    /// the `cached` leaf reports the size of its own textual content.
    pub fn getattr(&self, control_path: &str) -> Result<AttrRecord> {
        match self.resolve(control_path)? {
            ControlNode::Dir(_) => Ok(AttrRecord::synthetic_dir()),
            ControlNode::Cached(origin_path) => {
                let text = self.read_cached(&origin_path)?;
                Ok(AttrRecord::synthetic_file(text.len() as u64))
            }
        }
    }

    /// Children of a control-surface directory node: the engine's listing
    /// for an origin directory, or `["cached"]` for an origin file.
    pub fn readdir(&self, control_path: &str) -> Result<Vec<String>> {
        match self.resolve(control_path)? {
            ControlNode::Cached(_) => Err(EngineError::NotFound(control_path.to_string())),
            ControlNode::Dir(origin_path) => {
                let attr = self.engine.getattr(&origin_path)?;
                if attr.is_dir() {
                    self.engine.readdir(&origin_path, 0)
                } else {
                    Ok(vec![CACHED_LEAF.to_string()])
                }
            }
        }
    }

    /// The deterministic, monotonic-in-coverage textual fraction reported by
    /// reading a `cached` pseudo-file.
    pub fn read_cached(&self, origin_path: &OriginPath) -> Result<String> {
        let attr = self.engine.getattr(origin_path)?;
        let covered = self.engine.covered_bytes(origin_path)?;
        let fraction = if attr.size == 0 {
            1.0
        } else {
            covered.min(attr.size) as f64 / attr.size as f64
        };
        Ok(format!("{fraction:.6}\n"))
    }

    /// Drives a write to a `cached` pseudo-file: `'1'` prefetches, `'0'`
    /// invalidates, anything else is rejected.
    pub fn write_cached(&self, origin_path: &OriginPath, payload: &[u8]) -> Result<()> {
        match payload {
            [b'1'] => self.engine.prefetch(origin_path),
            [b'0'] => self.engine.invalidate(origin_path),
            _ => Err(EngineError::NotImplemented),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_origin::FakeOrigin;
    use tempfile::tempdir;

    fn setup() -> (tempfile::TempDir, CacheEngine<FakeOrigin>) {
        let dir = tempdir().unwrap();
        let origin = FakeOrigin::new();
        origin.put_dir("/", vec!["a".to_string()]);
        origin.put_file("/a", b"hello world".to_vec());
        let engine = CacheEngine::new(dir.path(), origin);
        (dir, engine)
    }

    #[test]
    fn resolves_dir_and_cached_leaf() {
        let (_dir, engine) = setup();
        let surface = ControlSurface::new(".control", &engine);
        assert_eq!(
            surface.resolve("/.control").unwrap(),
            ControlNode::Dir(OriginPath::root())
        );
        assert_eq!(
            surface.resolve("/.control/a").unwrap(),
            ControlNode::Dir(OriginPath::new("/a").unwrap())
        );
        assert_eq!(
            surface.resolve("/.control/a/cached").unwrap(),
            ControlNode::Cached(OriginPath::new("/a").unwrap())
        );
    }

    #[test]
    fn file_node_lists_only_cached() {
        let (_dir, engine) = setup();
        let surface = ControlSurface::new(".control", &engine);
        assert_eq!(surface.readdir("/.control/a").unwrap(), vec!["cached"]);
    }

    /// Writing '1' fully populates the DataBlob; reading `cached` reports
    /// full coverage; writing '0' removes all four artifacts.
    #[test]
    fn prefetch_and_invalidate_through_cached() {
        let (_dir, engine) = setup();
        let surface = ControlSurface::new(".control", &engine);
        let a = OriginPath::new("/a").unwrap();

        assert_eq!(surface.read_cached(&a).unwrap(), "0.000000\n");

        surface.write_cached(&a, b"1").unwrap();
        assert_eq!(surface.read_cached(&a).unwrap(), "1.000000\n");
        assert_eq!(engine.read(&a, 0, 11).unwrap(), b"hello world");

        surface.write_cached(&a, b"0").unwrap();
        let attr_path = engine
            .layout()
            .artifact_path(&a, crate::layout::ArtifactKind::Attr);
        assert!(!attr_path.exists());
    }
}
