use sha2::Digest as _;

use crate::{
    codes::tables::HeightTable,
    config::engine::{BackgroundFills, DimTreatment, EngineConfig},
    foundation::core::Slot,
    layout::resolver::LayoutConfig,
    scene::descriptor::SceneDescriptor,
};

/// Cache key for a rendered scene: `"{version}-{sha256 hex}"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// The key as it appears in file names.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything outside the descriptor that changes the rendered pixels.
#[derive(serde::Serialize)]
struct RenderInputs<'a> {
    layout: &'a LayoutConfig,
    heights: &'a HeightTable,
    backgrounds: &'a BackgroundFills,
    dim: &'a DimTreatment,
}

/// Derive the cache key from the canonical decoded scene.
///
/// Raw codes that decode to the same descriptor share a key. The version tag and the
/// render-affecting configuration are mixed in, so a version bump or a geometry/crop change
/// produces fresh keys without purging the store. Fields are length-prefixed before hashing so
/// distinct descriptors never share an encoding.
pub fn derive_key(descriptor: &SceneDescriptor, config: &EngineConfig) -> CacheKey {
    let mut h = sha2::Sha256::new();

    write_str(&mut h, &config.version);
    let inputs = RenderInputs {
        layout: &config.layout,
        heights: &config.heights,
        backgrounds: &config.backgrounds,
        dim: &config.dim,
    };
    // BTreeMap-backed tables serialize in a stable order.
    let fingerprint = serde_json::to_vec(&inputs).unwrap_or_default();
    write_bytes(&mut h, &fingerprint);

    for slot in Slot::ALL {
        match descriptor.character(slot) {
            Some(c) => {
                h.update([1u8]);
                write_str(&mut h, &c.base_id);
                write_str(&mut h, &c.emotion_id);
            }
            None => h.update([0u8]),
        }
    }
    write_opt_str(&mut h, descriptor.background.as_deref());
    write_opt_str(&mut h, descriptor.active.map(Slot::as_str));

    let digest = h.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for b in digest {
        hex.push_str(&format!("{b:02x}"));
    }
    CacheKey(format!("{}-{hex}", filename_safe(&config.version)))
}

fn write_bytes(h: &mut sha2::Sha256, bytes: &[u8]) {
    h.update((bytes.len() as u64).to_le_bytes());
    h.update(bytes);
}

fn write_str(h: &mut sha2::Sha256, s: &str) {
    write_bytes(h, s.as_bytes());
}

fn write_opt_str(h: &mut sha2::Sha256, s: Option<&str>) {
    match s {
        Some(s) => {
            h.update([1u8]);
            write_str(h, s);
        }
        None => h.update([0u8]),
    }
}

fn filename_safe(tag: &str) -> String {
    tag.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/compile/cache_key.rs"]
mod tests;
