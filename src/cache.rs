// src/cache.rs

//! Content-addressed cache for transform outputs
//!
//! Keys hash the transform identity, the archive identifier, the input
//! archive bytes and the registry entry that was applied, so a renamed,
//! changed or reconfigured input never hits a stale entry.
//!
//! Within a process, concurrent requests for the same key are coalesced:
//! the first caller runs the transform and everyone else waits for its
//! result. Optionally, output bytes are also kept in a directory so later
//! runs can skip the rewrite.

use crate::error::{Error, Result};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Identity of the transform; part of every key
pub const TRANSFORM_IDENTITY: &str = concat!("legacy-module-info/", env!("CARGO_PKG_VERSION"));

/// Compute the cache key for an archive, its bytes and the fingerprint of
/// the registry entry applied to it
pub fn cache_key(archive: &str, input: &[u8], entry_fingerprint: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(TRANSFORM_IDENTITY.as_bytes());
    hasher.update([0u8]);
    hasher.update((archive.len() as u64).to_le_bytes());
    hasher.update(archive.as_bytes());
    hasher.update((input.len() as u64).to_le_bytes());
    hasher.update(input);
    hasher.update(entry_fingerprint.as_bytes());
    hex::encode(hasher.finalize())
}

/// Stored outcome of one computation
#[derive(Clone)]
enum CachedResult<T> {
    Success(T),
    /// Error message; errors themselves are not `Clone`
    Failure(String),
}

/// Single-flight result cache with an optional on-disk byte store
pub struct TransformCache<T> {
    slots: DashMap<String, Arc<OnceLock<CachedResult<T>>>>,
    hits: AtomicU64,
    dir: Option<PathBuf>,
}

impl<T: Clone> TransformCache<T> {
    /// In-memory only
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
            hits: AtomicU64::new(0),
            dir: None,
        }
    }

    /// Also persist output bytes under `dir`
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: Some(dir),
            ..Self::new()
        })
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Return the cached value for `key`, computing it at most once
    ///
    /// The caller that computes gets its own error back; callers that
    /// waited on a failed computation get [`Error::TransformFailed`].
    pub fn get_or_compute<F>(&self, key: &str, label: &str, compute: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        // clone the slot out so the map shard is not locked while computing
        let slot = self
            .slots
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(OnceLock::new()))
            .clone();

        let mut own_error = None;
        let mut computed = false;
        let cached = slot.get_or_init(|| {
            computed = true;
            match compute() {
                Ok(value) => CachedResult::Success(value),
                Err(e) => {
                    let message = e.to_string();
                    own_error = Some(e);
                    CachedResult::Failure(message)
                }
            }
        });

        if !computed {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Transform cache hit for {} ({})", label, &key[..key.len().min(12)]);
        }

        match cached {
            CachedResult::Success(value) => Ok(value.clone()),
            CachedResult::Failure(message) => Err(own_error.unwrap_or_else(|| Error::TransformFailed {
                archive: label.to_string(),
                message: message.clone(),
            })),
        }
    }

    /// Number of requests answered from memory
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of distinct keys seen
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn blob_path(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(format!("{}.jar", key)))
    }

    /// Output bytes stored on disk for `key`, if any
    pub fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(path) = self.blob_path(key) else {
            return Ok(None);
        };
        match std::fs::read(&path) {
            Ok(bytes) => {
                debug!("Disk cache hit: {}", path.display());
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Store output bytes on disk; a no-op without a cache directory
    pub fn store(&self, key: &str, bytes: &[u8]) -> Result<()> {
        match self.blob_path(key) {
            Some(path) => write_atomically(&path, bytes),
            None => Ok(()),
        }
    }
}

impl<T: Clone> Default for TransformCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `bytes` to `path` through a temporary file in the same directory
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_key_depends_on_every_input() {
        let base = cache_key("a-1.0.jar", b"jar bytes", "explicit\nname=a");
        assert_eq!(base.len(), 64);
        assert_eq!(base, cache_key("a-1.0.jar", b"jar bytes", "explicit\nname=a"));
        assert_ne!(base, cache_key("b-1.0.jar", b"jar bytes", "explicit\nname=a"));
        assert_ne!(base, cache_key("a-1.0.jar", b"jar bytes!", "explicit\nname=a"));
        assert_ne!(base, cache_key("a-1.0.jar", b"jar bytes", "explicit\nname=b"));
    }

    #[test]
    fn test_key_has_no_boundary_ambiguity() {
        assert_ne!(cache_key("x", b"ab", "c"), cache_key("x", b"a", "bc"));
        assert_ne!(cache_key("xa", b"b", "c"), cache_key("x", b"ab", "c"));
    }

    #[test]
    fn test_computes_once() {
        let cache = TransformCache::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let value = cache
                .get_or_compute("k", "a.jar", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .unwrap();
            assert_eq!(value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_callers_coalesce() {
        let cache = Arc::new(TransformCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_compute("shared", "a.jar", || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(std::time::Duration::from_millis(20));
                            Ok(String::from("out"))
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "out");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failure_shared_with_followers() {
        let cache: TransformCache<u32> = TransformCache::new();
        let first = cache
            .get_or_compute("k", "bad.jar", || Err(Error::malformed("bad.jar", "truncated")))
            .unwrap_err();
        assert!(matches!(first, Error::MalformedArchive { .. }));

        let second = cache.get_or_compute("k", "bad.jar", || Ok(1)).unwrap_err();
        assert!(matches!(second, Error::TransformFailed { ref archive, .. } if archive == "bad.jar"));
    }

    #[test]
    fn test_disk_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache: TransformCache<()> = TransformCache::with_dir(dir.path().join("cache")).unwrap();
        assert_eq!(cache.load("abc").unwrap(), None);
        cache.store("abc", b"payload").unwrap();
        assert_eq!(cache.load("abc").unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn test_store_without_dir_is_noop() {
        let cache: TransformCache<()> = TransformCache::new();
        cache.store("abc", b"payload").unwrap();
        assert_eq!(cache.load("abc").unwrap(), None);
    }

    #[test]
    fn test_write_atomically_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jar");
        write_atomically(&path, b"one").unwrap();
        write_atomically(&path, b"two").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"two");
    }
}
