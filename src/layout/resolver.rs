use crate::{
    codes::tables::HeightClass,
    foundation::core::{Canvas, Slot},
    foundation::error::{SceneError, SceneResult},
    scene::descriptor::SceneDescriptor,
};

/// Sizing/spacing regime chosen from which slots are occupied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Zero or one character.
    Single,
    /// Exactly left and right, center empty.
    Paired,
    /// Two characters including center, or all three.
    Triple,
}

impl LayoutMode {
    /// Sizing bucket for this mode.
    pub fn bucket(self) -> SizeBucket {
        match self {
            LayoutMode::Single | LayoutMode::Paired => SizeBucket::Large,
            LayoutMode::Triple => SizeBucket::Small,
        }
    }
}

/// Sizing bucket shared by layout modes; `single` and `paired` size identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    /// Taller sprites, wider spacing.
    Large,
    /// Shorter sprites for three-up scenes.
    Small,
}

/// Fraction of the resized sprite height trimmed from the bottom, per height class.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropRatios {
    /// Ratio for short characters.
    pub short: f64,
    /// Ratio for medium characters.
    pub medium: f64,
    /// Always 0: tall characters are never cropped.
    pub tall: f64,
}

impl CropRatios {
    /// Ratio for `class`.
    pub fn ratio(&self, class: HeightClass) -> f64 {
        match class {
            HeightClass::Short => self.short,
            HeightClass::Medium => self.medium,
            HeightClass::Tall => self.tall,
        }
    }

    fn validate(&self, bucket: &str) -> SceneResult<()> {
        for (name, v) in [
            ("short", self.short),
            ("medium", self.medium),
            ("tall", self.tall),
        ] {
            if !v.is_finite() || !(0.0..1.0).contains(&v) {
                return Err(SceneError::validation(format!(
                    "crop ratio {bucket}.{name} must be in [0, 1), got {v}"
                )));
            }
        }
        if self.tall != 0.0 {
            return Err(SceneError::validation(format!(
                "crop ratio {bucket}.tall must be 0"
            )));
        }
        Ok(())
    }
}

/// `(bucket, HeightClass) -> ratio`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropPolicy {
    /// Ratios for `single` and `paired`.
    pub large: CropRatios,
    /// Ratios for `triple`.
    pub small: CropRatios,
}

impl Default for CropPolicy {
    fn default() -> Self {
        Self {
            large: CropRatios {
                short: 0.10,
                medium: 0.05,
                tall: 0.0,
            },
            small: CropRatios {
                short: 0.05,
                medium: 0.025,
                tall: 0.0,
            },
        }
    }
}

impl CropPolicy {
    /// Ratios for `bucket`.
    pub fn for_bucket(&self, bucket: SizeBucket) -> CropRatios {
        match bucket {
            SizeBucket::Large => self.large,
            SizeBucket::Small => self.small,
        }
    }
}

/// Horizontal anchor per slot, in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SlotAnchors {
    /// Left slot x.
    pub left: i32,
    /// Center slot x.
    pub center: i32,
    /// Right slot x.
    pub right: i32,
}

impl SlotAnchors {
    /// Anchor x for `slot`.
    pub fn x(&self, slot: Slot) -> i32 {
        match slot {
            Slot::Left => self.left,
            Slot::Center => self.center,
            Slot::Right => self.right,
        }
    }
}

/// Stage geometry constants. Treated as configuration.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Output canvas.
    pub canvas: Canvas,
    /// Sprite height for `single`/`paired`.
    pub large_height: u32,
    /// Sprite height for `triple`.
    pub small_height: u32,
    /// Anchors for `single` and `paired`.
    pub large_anchors: SlotAnchors,
    /// Anchors for `triple`.
    pub small_anchors: SlotAnchors,
    /// Bottom crop per bucket and height class.
    pub crop: CropPolicy,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 1440,
                height: 960,
            },
            large_height: 840,
            small_height: 740,
            large_anchors: SlotAnchors {
                left: 360,
                center: 720,
                right: 1080,
            },
            small_anchors: SlotAnchors {
                left: 260,
                center: 720,
                right: 1180,
            },
            crop: CropPolicy::default(),
        }
    }
}

impl LayoutConfig {
    /// Reject inconsistent geometry or crop ratios.
    pub fn validate(&self) -> SceneResult<()> {
        Canvas::new(self.canvas.width, self.canvas.height)?;
        if self.small_height == 0 {
            return Err(SceneError::validation("small_height must be > 0"));
        }
        if self.large_height <= self.small_height {
            return Err(SceneError::validation(
                "large_height must be greater than small_height",
            ));
        }
        if self.large_height >= self.canvas.height {
            return Err(SceneError::validation(
                "sprite heights must be less than the canvas height",
            ));
        }
        self.crop.large.validate("large")?;
        self.crop.small.validate("small")?;
        Ok(())
    }

    /// Sprite height for `bucket`.
    pub fn target_height(&self, bucket: SizeBucket) -> u32 {
        match bucket {
            SizeBucket::Large => self.large_height,
            SizeBucket::Small => self.small_height,
        }
    }

    /// Slot anchors for `bucket`.
    pub fn anchors(&self, bucket: SizeBucket) -> SlotAnchors {
        match bucket {
            SizeBucket::Large => self.large_anchors,
            SizeBucket::Small => self.small_anchors,
        }
    }
}

/// Geometry resolved for one scene.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedLayout {
    /// Selected layout mode.
    pub mode: LayoutMode,
    /// Output canvas.
    pub canvas: Canvas,
    /// Sprite height for every character in the scene.
    pub target_height: u32,
    /// Horizontal anchors for this mode.
    pub anchors: SlotAnchors,
    /// Shared vertical baseline: the canvas bottom edge.
    pub baseline_y: i32,
    /// Crop ratios for this mode's bucket.
    pub crop: CropRatios,
}

impl ResolvedLayout {
    /// `(x, baseline_y)` for `slot`.
    pub fn anchor(&self, slot: Slot) -> (i32, i32) {
        (self.anchors.x(slot), self.baseline_y)
    }
}

/// Pick the layout mode from slot occupancy.
pub fn select_layout_mode(left: bool, center: bool, right: bool) -> LayoutMode {
    let present = usize::from(left) + usize::from(center) + usize::from(right);
    match present {
        0 | 1 => LayoutMode::Single,
        2 if !center => LayoutMode::Paired,
        _ => LayoutMode::Triple,
    }
}

/// Resolve mode, sprite height, anchors and crop table for `descriptor`.
pub fn resolve_layout(descriptor: &SceneDescriptor, config: &LayoutConfig) -> ResolvedLayout {
    let mode = descriptor.layout_mode();
    let bucket = mode.bucket();
    ResolvedLayout {
        mode,
        canvas: config.canvas,
        target_height: config.target_height(bucket),
        anchors: config.anchors(bucket),
        baseline_y: i32::try_from(config.canvas.height).unwrap_or(i32::MAX),
        crop: config.crop.for_bucket(bucket),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/resolver.rs"]
mod tests;
