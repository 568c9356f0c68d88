//! Integration tests for `CacheEngine`, built exclusively against
//! `FakeOrigin` — the real filesystem is never touched here, only the cache
//! root under a `tempfile::TempDir`.

use mirrorfs_core::{CacheEngine, EngineError, FakeOrigin, OpenFlags, OriginPath};
use tempfile::TempDir;

fn path(s: &str) -> OriginPath {
    OriginPath::new(s).unwrap()
}

fn setup(content: &[u8]) -> (TempDir, CacheEngine<FakeOrigin>, FakeOrigin) {
    let dir = TempDir::new().unwrap();
    let origin = FakeOrigin::new();
    origin.put_dir("/", vec!["a".to_string()]);
    origin.put_file("/a", content.to_vec());
    let engine = CacheEngine::new(dir.path(), origin.clone());
    (dir, engine, origin)
}

/// Property 5: byte faithfulness. Bytes returned by `read` match what the
/// origin holds at the time each byte was first populated.
#[test]
fn byte_faithfulness_across_overlapping_reads() {
    let content: Vec<u8> = (0u8..=255).cycle().take(1024).collect();
    let (_dir, engine, _origin) = setup(&content);
    let a = path("/a");

    let first = engine.read(&a, 0, 100).unwrap();
    assert_eq!(first, content[0..100]);

    let second = engine.read(&a, 50, 100).unwrap();
    assert_eq!(second, content[50..150]);

    let whole = engine.read(&a, 0, content.len() as u64).unwrap();
    assert_eq!(whole, content);
}

/// The origin receives exactly the gaps, and only the gaps, across a
/// sequence of overlapping reads.
#[test]
fn minimal_origin_traffic_across_overlapping_reads() {
    let content = vec![7u8; 1024];
    let (_dir, engine, origin) = setup(&content);
    let a = path("/a");

    engine.read(&a, 100, 100).unwrap(); // [100, 200)
    engine.read(&a, 150, 150).unwrap(); // [150, 300): only [200,300) is new

    assert_eq!(
        origin.read_calls(),
        vec![
            ("/a".to_string(), 100, 100),
            ("/a".to_string(), 200, 100),
        ]
    );
    assert_eq!(origin.total_bytes_requested(), 200);
}

/// Once a region is fully covered, re-reading it makes no further origin
/// calls (the fast path in step 6 of the read algorithm).
#[test]
fn fully_covered_reads_touch_the_origin_no_further() {
    let content = vec![9u8; 64];
    let (_dir, engine, origin) = setup(&content);
    let a = path("/a");

    engine.read(&a, 0, 64).unwrap();
    let calls_after_first = origin.read_calls().len();
    engine.read(&a, 10, 20).unwrap();
    engine.read(&a, 0, 64).unwrap();

    assert_eq!(origin.read_calls().len(), calls_after_first);
}

/// Property 7: persistence. A fresh engine over the same cache root serves
/// cached bytes without ever invoking a (now-empty) origin.
#[test]
fn persistence_across_restart() {
    let dir = TempDir::new().unwrap();
    let content = b"persisted content".to_vec();

    {
        let origin = FakeOrigin::new();
        origin.put_file("/a", content.clone());
        let engine = CacheEngine::new(dir.path(), origin);
        assert_eq!(engine.read(&path("/a"), 0, content.len() as u64).unwrap(), content);
    }

    // A brand new engine, same cache root, origin now empty (simulating the
    // origin being disconnected).
    let empty_origin = FakeOrigin::new();
    let engine = CacheEngine::new(dir.path(), empty_origin.clone());
    let bytes = engine.read(&path("/a"), 0, content.len() as u64).unwrap();
    assert_eq!(bytes, content);
    assert!(empty_origin.read_calls().is_empty());
}

/// Property 8 / cache-only mode. With cache-only enabled, an uncached
/// getattr/read/readdir never reaches the origin, and fails with CacheMiss.
#[test]
fn cache_only_isolation() {
    let (_dir, engine, origin) = setup(b"abc");
    engine.set_cache_only(true);

    let err = engine.getattr(&path("/a")).unwrap_err();
    assert!(matches!(err, EngineError::CacheMiss(_)));
    let err = engine.read(&path("/a"), 0, 1).unwrap_err();
    assert!(matches!(err, EngineError::CacheMiss(_)));
    assert!(origin.read_calls().is_empty());

    // Once warmed while cache-only is off, cache-only reads of covered
    // regions still succeed.
    engine.set_cache_only(false);
    engine.read(&path("/a"), 0, 3).unwrap();
    engine.set_cache_only(true);
    assert_eq!(engine.read(&path("/a"), 0, 3).unwrap(), b"abc");
}

/// Property 9: every mutating entry point is read-only/permission-denied and
/// leaves the cache untouched.
#[test]
fn read_only_contract() {
    let (_dir, engine, _origin) = setup(b"abc");
    let a = path("/a");

    assert!(matches!(engine.write(&a, 0, b"x").unwrap_err(), EngineError::ReadOnlyFs));
    assert!(matches!(engine.unlink(&a).unwrap_err(), EngineError::ReadOnlyFs));
    assert!(matches!(engine.mknod(&a).unwrap_err(), EngineError::ReadOnlyFs));
    assert!(matches!(engine.truncate(&a, 0).unwrap_err(), EngineError::ReadOnlyFs));

    let write_flags = OpenFlags {
        write: true,
        ..Default::default()
    };
    assert!(matches!(
        engine.open(&a, write_flags).unwrap_err(),
        EngineError::PermissionDenied(_)
    ));
    assert!(engine.open(&a, OpenFlags::default()).is_ok());
}

/// Once cached, the mount keeps serving the stale bytes even after the
/// origin changes underneath it — staleness is the contract, not a bug.
#[test]
fn cached_reads_are_stale_by_design() {
    let (_dir, engine, origin) = setup(b"1");
    let a = path("/a");

    assert_eq!(engine.read(&a, 0, 1).unwrap(), b"1");
    origin.put_file("/a", b"2".to_vec());
    assert_eq!(engine.read(&a, 0, 1).unwrap(), b"1");
}

/// A change to the origin before any cached entry exists is picked up in
/// full by the first read through the mount.
#[test]
fn first_read_sees_latest_content_when_no_entry_existed() {
    let (_dir, engine, origin) = setup(b"1");
    let a = path("/a");

    origin.put_file("/a", b"2".to_vec());
    assert_eq!(engine.read(&a, 0, 1).unwrap(), b"2");
}

/// Open question resolution: a short read at EOF clamps the inserted range
/// rather than erroring or recording bytes that were never written.
#[test]
fn short_read_at_eof_clamps_rangeset_and_returns_what_exists() {
    let (_dir, engine, _origin) = setup(b"abc");
    let a = path("/a");

    let bytes = engine.read(&a, 0, 10).unwrap();
    assert_eq!(bytes, b"abc");

    // Re-reading the same (out of bounds) probe makes no further origin
    // calls: the gap was already recorded as covered up to the actual size.
    let bytes_again = engine.read(&a, 0, 10).unwrap();
    assert_eq!(bytes_again, b"abc");
}

/// A zero-size read is a pure no-op and never touches the origin.
#[test]
fn zero_size_read_is_a_no_op() {
    let (_dir, engine, origin) = setup(b"abc");
    assert_eq!(engine.read(&path("/a"), 0, 0).unwrap(), Vec::<u8>::new());
    assert!(origin.read_calls().is_empty());
}

/// readdir caches a directory listing exactly once.
#[test]
fn readdir_is_cached_after_first_listing() {
    let (_dir, engine, origin) = setup(b"abc");
    origin.put_dir("/", vec!["a".to_string(), "b".to_string()]);
    let root = path("/");

    assert_eq!(engine.readdir(&root, 0).unwrap(), vec!["a", "b"]);
    origin.put_dir("/", vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    // Still the original listing: directories are never refreshed except by
    // invalidation.
    assert_eq!(engine.readdir(&root, 0).unwrap(), vec!["a", "b"]);
}

/// `invalidate` removes every artifact, and a subsequent read rebuilds from
/// scratch against the (possibly now-different) origin.
#[test]
fn invalidate_forces_a_full_rebuild() {
    let (_dir, engine, origin) = setup(b"1");
    let a = path("/a");

    engine.read(&a, 0, 1).unwrap();
    origin.put_file("/a", b"22".to_vec());
    engine.invalidate(&a).unwrap();

    assert_eq!(engine.read(&a, 0, 2).unwrap(), b"22");
}

/// `prefetch` drives the full extent of the file so the RangeSet ends up
/// covering `[0, size)` in one call.
#[test]
fn prefetch_populates_the_whole_file() {
    let content = vec![3u8; 4096];
    let (_dir, engine, origin) = setup(&content);
    let a = path("/a");

    engine.prefetch(&a).unwrap();
    assert_eq!(origin.total_bytes_requested(), 4096);

    // A subsequent full read makes no further origin calls.
    engine.read(&a, 0, 4096).unwrap();
    assert_eq!(origin.total_bytes_requested(), 4096);
}
