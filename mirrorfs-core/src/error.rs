//! Error taxonomy shared by every component in this crate.

use thiserror::Error;

/// Errors that can surface from the cache layout, metadata store, origin
/// adapter, or cache engine.
///
/// This mirrors the split this codebase draws elsewhere between a single
/// library-wide error enum and the `anyhow`-wrapped errors used at binary
/// boundaries: everything in `mirrorfs-core` returns `EngineError`, and the
/// CLI/glue crate is responsible for turning that into whatever its caller
/// expects (a libc errno, a process exit code).
#[derive(Error, Debug)]
pub enum EngineError {
    /// No such path on the origin, or (in cache-only mode) no such path in
    /// the cache.
    #[error("no such path: {0}")]
    NotFound(String),
    /// Open for write, or a write directed at a mirrored path.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// A mutating operation against the read-only mirror.
    #[error("read-only filesystem")]
    ReadOnlyFs,
    /// A control-surface write whose payload the surface does not recognize.
    #[error("operation not implemented")]
    NotImplemented,
    /// Cache-only mode is active and the request cannot be served from the
    /// cache alone.
    #[error("cache miss (cache-only mode): {0}")]
    CacheMiss(String),
    /// An I/O failure against the origin or the cache directory.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// A cache artifact failed to decode.
    #[error("cache artifact decode error: {0}")]
    DecodeError(#[from] rmp_serde::decode::Error),
    /// A cache artifact failed to encode.
    #[error("cache artifact encode error: {0}")]
    EncodeError(#[from] rmp_serde::encode::Error),
    /// A programming error: a malformed `OriginPath` or an empty `Range`.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
