use std::{collections::BTreeMap, path::Path};

use crate::{
    assets::store::read_file,
    codes::tables::{CodeTables, HeightTable},
    foundation::core::Rgba8,
    foundation::error::{SceneError, SceneResult},
    layout::resolver::LayoutConfig,
};

/// Engine version tag mixed into every cache key.
///
/// Bump whenever rendering logic changes in a way configuration does not capture.
pub const ENGINE_VERSION: &str = "v14";

/// Fallback fill colours used when a background is absent or cannot be fetched.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BackgroundFills {
    /// Neutral fill for scenes without a usable background and without a specific entry.
    pub default: Rgba8,
    /// Fill per background id, used when that background cannot be fetched.
    pub by_id: BTreeMap<String, Rgba8>,
}

impl Default for BackgroundFills {
    fn default() -> Self {
        Self {
            default: Rgba8::opaque(240, 240, 240),
            by_id: [
                ("forest", Rgba8::opaque(196, 222, 178)),
                ("beach", Rgba8::opaque(242, 228, 194)),
                ("home", Rgba8::opaque(236, 224, 210)),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        }
    }
}

impl BackgroundFills {
    /// Fill for `background`, falling back to the neutral default.
    pub fn fill_for(&self, background: Option<&str>) -> Rgba8 {
        background
            .and_then(|id| self.by_id.get(id))
            .copied()
            .unwrap_or(self.default)
    }
}

/// Treatment applied to sprites that are not the active speaker.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DimTreatment {
    /// Multiplier on colour channels, `0..=1`.
    pub brightness: f32,
    /// Multiplier on saturation, `0..=1` (0 is greyscale).
    pub saturation: f32,
}

impl Default for DimTreatment {
    fn default() -> Self {
        Self {
            brightness: 0.7,
            saturation: 0.6,
        }
    }
}

/// Complete engine configuration: code tables, geometry, and visual treatment.
///
/// Built once at startup and shared read-only. Every field has a default, so a JSON file only
/// needs to name what it overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Version tag mixed into cache keys. Defaults to [`ENGINE_VERSION`].
    pub version: String,
    /// Symbol tables for decoding scene codes.
    pub codes: CodeTables,
    /// Height class per base character.
    pub heights: HeightTable,
    /// Canvas and stage geometry.
    pub layout: LayoutConfig,
    /// Fallback fills for missing backgrounds.
    pub backgrounds: BackgroundFills,
    /// Treatment for sprites that are not the active speaker.
    pub dim: DimTreatment,
    /// Fill of the image served when rendering fails.
    pub placeholder_rgba: Rgba8,
    /// Worker threads for concurrent asset fetches. `None` uses rayon defaults.
    pub fetch_threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: ENGINE_VERSION.to_string(),
            codes: CodeTables::default(),
            heights: HeightTable::default(),
            layout: LayoutConfig::default(),
            backgrounds: BackgroundFills::default(),
            dim: DimTreatment::default(),
            placeholder_rgba: Rgba8::opaque(255, 200, 200),
            fetch_threads: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> SceneResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| SceneError::serde(format!("parse engine config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> SceneResult<Self> {
        let bytes = read_file(path.as_ref())?;
        let json = std::str::from_utf8(&bytes)
            .map_err(|e| SceneError::serde(format!("engine config is not utf-8: {e}")))?;
        Self::from_json_str(json)
    }

    /// Check every table and numeric invariant.
    pub fn validate(&self) -> SceneResult<()> {
        if self.version.trim().is_empty() {
            return Err(SceneError::validation("version tag must be non-empty"));
        }
        self.codes.validate()?;
        self.layout.validate()?;
        for (name, v) in [
            ("brightness", self.dim.brightness),
            ("saturation", self.dim.saturation),
        ] {
            if !v.is_finite() || !(0.0..=1.0).contains(&v) {
                return Err(SceneError::validation(format!(
                    "dim.{name} must be in [0, 1], got {v}"
                )));
            }
        }
        if self.fetch_threads == Some(0) {
            return Err(SceneError::validation(
                "fetch_threads must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/engine.rs"]
mod tests;
