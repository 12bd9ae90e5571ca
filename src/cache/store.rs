use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use anyhow::Context;

use crate::{
    compile::cache_key::CacheKey,
    foundation::error::{SceneError, SceneResult},
};

/// Persistent store for rendered scenes, keyed by [`CacheKey`].
///
/// `get` returning `Ok(None)` is a miss. Errors from either call are never fatal to a render:
/// a failed `get` is a miss and a failed `put` is dropped.
pub trait CacheStore: Send + Sync {
    /// Cached PNG bytes for `key`; `Ok(None)` is a miss.
    fn get(&self, key: &CacheKey) -> SceneResult<Option<Vec<u8>>>;

    /// Store PNG bytes under `key`.
    fn put(&self, key: &CacheKey, bytes: &[u8]) -> SceneResult<()>;
}

/// Distinguishes concurrent writes of one key within the process.
static NEXT_TEMP_ID: AtomicU64 = AtomicU64::new(0);

/// Store writing `{root}/generated/{key}.png`.
#[derive(Clone, Debug)]
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    /// Create a store rooted at `root`; `generated/` is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// On-disk location of the entry for `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join("generated")
            .join(format!("{}.png", key.as_str()))
    }
}

impl CacheStore for FsCacheStore {
    fn get(&self, key: &CacheKey) -> SceneResult<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SceneError::cache(format!(
                "read cache entry '{}': {e}",
                path.display()
            ))),
        }
    }

    fn put(&self, key: &CacheKey, bytes: &[u8]) -> SceneResult<()> {
        let path = self.path_for(key);
        let dir = path
            .parent()
            .ok_or_else(|| SceneError::cache("cache entry path has no parent"))?;
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create cache dir '{}'", dir.display()))?;

        // Readers never observe a partially written entry.
        let tmp = dir.join(format!(
            ".{}.{}.{}.tmp",
            key.as_str(),
            std::process::id(),
            NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::write(&tmp, bytes)
            .with_context(|| format!("write cache temp file '{}'", tmp.display()))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(SceneError::cache(format!(
                "commit cache entry '{}': {e}",
                path.display()
            )));
        }
        Ok(())
    }
}

/// In-process cache store.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<CacheKey, Vec<u8>>>,
}

impl MemoryCacheStore {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an entry exists for `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .read()
            .map(|m| m.contains_key(key))
            .unwrap_or(false)
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &CacheKey) -> SceneResult<Option<Vec<u8>>> {
        let map = self
            .entries
            .read()
            .map_err(|_| SceneError::cache("memory cache lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &CacheKey, bytes: &[u8]) -> SceneResult<()> {
        let mut map = self
            .entries
            .write()
            .map_err(|_| SceneError::cache("memory cache lock poisoned"))?;
        map.insert(key.clone(), bytes.to_vec());
        Ok(())
    }
}

/// Always misses and discards writes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopCacheStore;

impl CacheStore for NoopCacheStore {
    fn get(&self, _key: &CacheKey) -> SceneResult<Option<Vec<u8>>> {
        Ok(None)
    }

    fn put(&self, _key: &CacheKey, _bytes: &[u8]) -> SceneResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
