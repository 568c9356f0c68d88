//! `OriginPath`, the validated key every cache entry is addressed by.

use crate::error::{EngineError, Result};
use std::fmt;

/// An absolute path string beginning with `/`, interpreted relative to the
/// origin root.
///
/// Every path presented to the engine is an `OriginPath`; construction is the
/// only place the leading-slash invariant is enforced.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OriginPath(String);

impl OriginPath {
    /// Validates and wraps a path string. Fails if it does not begin with `/`.
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if !path.starts_with('/') {
            return Err(EngineError::InvalidArgument(format!(
                "origin path must begin with '/', got {path:?}"
            )));
        }
        Ok(OriginPath(path))
    }

    /// The origin root itself.
    pub fn root() -> Self {
        OriginPath("/".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// This path with the leading slash stripped, suitable for joining
    /// beneath the cache root or the origin root.
    pub fn relative(&self) -> &str {
        self.0.trim_start_matches('/')
    }

    /// The path of a direct child, given its file name.
    pub fn child(&self, name: &str) -> OriginPath {
        if self.is_root() {
            OriginPath(format!("/{name}"))
        } else {
            OriginPath(format!("{}/{name}", self.0))
        }
    }
}

impl fmt::Display for OriginPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
