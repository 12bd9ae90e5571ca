use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    assets::decode as assets_decode,
    foundation::error::{SceneError, SceneResult},
    scene::descriptor::SceneDescriptor,
};

#[derive(Clone, Debug)]
/// Decoded raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Address of a piece of artwork in the asset store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum AssetRef {
    /// Character sprite, id `"{base}_{emotion}"`.
    Character(String),
    /// Background image, id is the background id.
    Background(String),
}

impl AssetRef {
    /// Bare id without the kind prefix.
    pub fn id(&self) -> &str {
        match self {
            AssetRef::Character(id) | AssetRef::Background(id) => id,
        }
    }

    /// Store-relative path: `characters/{id}.png` or `backgrounds/{id}.png`.
    pub fn rel_path(&self) -> String {
        match self {
            AssetRef::Character(id) => format!("characters/{id}.png"),
            AssetRef::Background(id) => format!("backgrounds/{id}.png"),
        }
    }

    /// Every asset a descriptor needs: background first, then characters left to right.
    pub fn for_descriptor(descriptor: &SceneDescriptor) -> Vec<AssetRef> {
        let mut out = Vec::with_capacity(4);
        if let Some(bg) = &descriptor.background {
            out.push(AssetRef::Background(bg.clone()));
        }
        for (_, c) in descriptor.present() {
            out.push(AssetRef::Character(c.asset_name()));
        }
        out
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.rel_path())
    }
}

/// Remote or local source of artwork bytes.
///
/// `Ok(None)` means "not found"; `Err` is a transport failure. Callers treat both as a miss.
/// Single attempt, no retries; wrap the store to add them.
pub trait AssetStore: Send + Sync {
    /// Encoded bytes for `asset`, or `Ok(None)` when it does not exist.
    fn fetch(&self, asset: &AssetRef) -> SceneResult<Option<Vec<u8>>>;
}

/// Asset store reading `{root}/characters/*.png` and `{root}/backgrounds/*.png`.
#[derive(Clone, Debug)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    /// Create a store resolving asset paths under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetStore for FsAssetStore {
    fn fetch(&self, asset: &AssetRef) -> SceneResult<Option<Vec<u8>>> {
        let rel = normalize_rel_path(&asset.rel_path())?;
        let path = self.root.join(Path::new(&rel));
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SceneError::Other(
                anyhow::Error::new(e)
                    .context(format!("read asset bytes from '{}'", path.display())),
            )),
        }
    }
}

/// In-process asset store, keyed by [`AssetRef`].
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    assets: RwLock<BTreeMap<AssetRef, Vec<u8>>>,
}

impl MemoryAssetStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register encoded bytes for `asset`, replacing any previous entry.
    pub fn insert(&self, asset: AssetRef, bytes: Vec<u8>) {
        if let Ok(mut map) = self.assets.write() {
            map.insert(asset, bytes);
        }
    }

    /// Builder form of [`MemoryAssetStore::insert`].
    pub fn with(self, asset: AssetRef, bytes: Vec<u8>) -> Self {
        self.insert(asset, bytes);
        self
    }
}

impl AssetStore for MemoryAssetStore {
    fn fetch(&self, asset: &AssetRef) -> SceneResult<Option<Vec<u8>>> {
        let map = self
            .assets
            .read()
            .map_err(|_| SceneError::asset("memory asset store lock poisoned"))?;
        Ok(map.get(asset).cloned())
    }
}

/// Decoded assets for one request. Missing or undecodable assets are simply absent.
#[derive(Clone, Debug, Default)]
pub struct PreparedAssets {
    images: HashMap<AssetRef, PreparedImage>,
}

impl PreparedAssets {
    /// Fetch and decode `assets` concurrently on the current rayon pool.
    ///
    /// Every fetch is independent; the call returns once each has produced bytes or a miss.
    pub fn fetch_all(assets: &[AssetRef], store: &dyn AssetStore) -> Self {
        let images = assets
            .par_iter()
            .filter_map(|asset| fetch_one(asset, store).map(|img| (asset.clone(), img)))
            .collect::<HashMap<_, _>>();
        Self { images }
    }

    /// Add an already decoded image.
    pub fn insert(&mut self, asset: AssetRef, image: PreparedImage) {
        self.images.insert(asset, image);
    }

    /// Decoded image for `asset`, if it resolved.
    pub fn get(&self, asset: &AssetRef) -> Option<&PreparedImage> {
        self.images.get(asset)
    }

    /// Intrinsic `(width, height)` of a resolved asset.
    pub fn size_of(&self, asset: &AssetRef) -> Option<(u32, u32)> {
        self.get(asset).map(|img| (img.width, img.height))
    }

    /// Number of resolved assets.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// True when nothing resolved.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

fn fetch_one(asset: &AssetRef, store: &dyn AssetStore) -> Option<PreparedImage> {
    let bytes = match store.fetch(asset) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::warn!(%asset, "asset not found");
            return None;
        }
        Err(e) => {
            tracing::warn!(%asset, error = %e, "asset fetch failed");
            return None;
        }
    };
    match assets_decode::decode_image(&bytes) {
        Ok(img) => {
            tracing::debug!(%asset, width = img.width, height = img.height, "asset decoded");
            Some(img)
        }
        Err(e) => {
            tracing::warn!(%asset, error = %e, "asset bytes could not be decoded");
            None
        }
    }
}

/// Normalize and validate store-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> SceneResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(SceneError::asset("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(SceneError::asset("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(SceneError::asset("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(SceneError::asset("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

/// Read a whole file, attaching the path to any error.
pub(crate) fn read_file(path: &Path) -> SceneResult<Vec<u8>> {
    std::fs::read(path)
        .with_context(|| format!("read '{}'", path.display()))
        .map_err(SceneError::from)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
