//! Caching engine for a read-only, persistently-cached mirror of a directory
//! tree.
//!
//! This crate is the core described by the design this binary implements: a
//! byte-range bookkeeping algebra ([`range`]), the cache's on-disk layout
//! ([`layout`]) and metadata persistence ([`metastore`]), the engine that
//! ties them to an [`origin::Origin`] adapter ([`engine`]), and the
//! per-file virtual control namespace built on top of it ([`control`]).
//!
//! The user-space filesystem glue that receives kernel requests lives in the
//! `mirrorfs-cli` crate; this crate knows nothing about FUSE.

pub mod attr;
pub mod control;
pub mod engine;
pub mod error;
pub mod fake_origin;
pub mod layout;
pub mod metastore;
pub mod origin;
pub mod path;
pub mod range;

pub use attr::AttrRecord;
pub use control::{ControlNode, ControlSurface};
pub use engine::{CacheEngine, OpenFlags};
pub use error::{EngineError, Result};
pub use fake_origin::FakeOrigin;
pub use layout::{ArtifactKind, CacheLayout};
pub use metastore::MetaStore;
pub use origin::{Origin, RealOrigin};
pub use path::OriginPath;
pub use range::{Range, RangeSet};
