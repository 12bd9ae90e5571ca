use crate::{
    assets::store::{AssetRef, PreparedAssets},
    codes::tables::{HeightClass, HeightTable},
    config::engine::EngineConfig,
    foundation::core::{Canvas, Rgba8, Slot},
    foundation::math::floor_fraction,
    layout::resolver::{LayoutMode, ResolvedLayout},
    scene::descriptor::SceneDescriptor,
};

/// Fully resolved placement, size, crop, treatment and paint order for one character.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RenderInstruction {
    /// Stage slot this sprite occupies.
    pub slot: Slot,
    /// Sprite asset.
    pub asset: AssetRef,
    /// Height class of the base character; selects the crop ratio.
    pub height_class: HeightClass,
    /// Sprite height for the layout mode.
    pub target_height: u32,
    /// Sprite size after fitting to `target_height` with preserved aspect ratio.
    pub resized_width: u32,
    /// Always equal to `target_height`.
    pub resized_height: u32,
    /// Horizontal centre of the sprite.
    pub anchor_x: i32,
    /// Baseline the cropped sprite stands on.
    pub anchor_y: i32,
    /// Left edge of the resized sprite on the canvas.
    pub left: i32,
    /// Top edge of the resized sprite on the canvas.
    pub top: i32,
    /// Rows trimmed from the bottom of the resized sprite.
    pub vertical_crop_px: u32,
    /// Whether the dim treatment applies (another slot is active).
    pub dimmed: bool,
    /// Paint order; higher paints later. The active slot is always highest.
    pub z_order: i32,
}

impl RenderInstruction {
    /// Height actually painted, after the bottom crop.
    pub fn visible_height(&self) -> u32 {
        self.resized_height - self.vertical_crop_px
    }

    /// Canvas y of the painted bottom edge (exclusive).
    pub fn visible_bottom(&self) -> i32 {
        self.top + self.visible_height() as i32
    }
}

/// How the canvas is initialised before sprites are painted.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackgroundOp {
    /// Stretch the background asset to the canvas.
    Image {
        /// Background asset to draw.
        asset: AssetRef,
    },
    /// Flat fill, used when no background is requested or it could not be resolved.
    Fill {
        /// Fill colour.
        rgba: Rgba8,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
/// Backend-agnostic render plan for a single scene.
///
/// `instructions` are stored in left-center-right order; use [`RenderPlan::paint_order`] for
/// back-to-front painting.
pub struct RenderPlan {
    /// Output size.
    pub canvas: Canvas,
    /// Layout mode the plan was resolved for.
    pub mode: LayoutMode,
    /// Canvas initialisation.
    pub background: BackgroundOp,
    /// One entry per drawable character.
    pub instructions: Vec<RenderInstruction>,
}

impl RenderPlan {
    /// Instructions sorted back to front by `z_order`.
    pub fn paint_order(&self) -> Vec<&RenderInstruction> {
        let mut ordered = self.instructions.iter().collect::<Vec<_>>();
        ordered.sort_by_key(|i| i.z_order);
        ordered
    }
}

/// Build one instruction per present character whose asset size resolves.
///
/// Slots whose asset cannot be resolved are dropped without affecting the others. Non-active
/// instructions get ascending `z_order` in slot order; the active instruction, if present, gets
/// an order above all of them.
#[tracing::instrument(level = "debug", skip(descriptor, layout, heights, resolve_size))]
pub fn build_plan<F>(
    descriptor: &SceneDescriptor,
    layout: &ResolvedLayout,
    heights: &HeightTable,
    mut resolve_size: F,
) -> Vec<RenderInstruction>
where
    F: FnMut(&AssetRef) -> Option<(u32, u32)>,
{
    let active = descriptor.active;
    let mut out = Vec::with_capacity(3);

    for (slot, character) in descriptor.present() {
        let asset = AssetRef::Character(character.asset_name());
        let Some((width, height)) = resolve_size(&asset).filter(|(w, h)| *w > 0 && *h > 0) else {
            tracing::debug!(%slot, %asset, "dropping slot without a resolvable asset");
            continue;
        };

        let height_class = heights.class_of(&character.base_id);
        let resized_height = layout.target_height;
        let resized_width = fit_width(width, height, resized_height);
        let vertical_crop_px = floor_fraction(resized_height, layout.crop.ratio(height_class));
        let (anchor_x, anchor_y) = layout.anchor(slot);

        out.push(RenderInstruction {
            slot,
            asset,
            height_class,
            target_height: layout.target_height,
            resized_width,
            resized_height,
            anchor_x,
            anchor_y,
            left: anchor_x - (resized_width / 2) as i32,
            top: anchor_y - resized_height as i32 + vertical_crop_px as i32,
            vertical_crop_px,
            dimmed: active.is_some_and(|a| a != slot),
            z_order: 0,
        });
    }

    assign_z_order(&mut out, active);
    out
}

/// Resolve layout-independent inputs (background, asset sizes) into a complete plan.
pub fn compile_scene(
    descriptor: &SceneDescriptor,
    layout: &ResolvedLayout,
    config: &EngineConfig,
    assets: &PreparedAssets,
) -> RenderPlan {
    let background = match &descriptor.background {
        Some(id) if assets.get(&AssetRef::Background(id.clone())).is_some() => BackgroundOp::Image {
            asset: AssetRef::Background(id.clone()),
        },
        bg => BackgroundOp::Fill {
            rgba: config.backgrounds.fill_for(bg.as_deref()),
        },
    };

    let instructions = build_plan(descriptor, layout, &config.heights, |asset| {
        assets.size_of(asset)
    });

    RenderPlan {
        canvas: layout.canvas,
        mode: layout.mode,
        background,
        instructions,
    }
}

fn assign_z_order(instructions: &mut [RenderInstruction], active: Option<Slot>) {
    let mut next = 0i32;
    for inst in instructions.iter_mut() {
        if Some(inst.slot) != active {
            inst.z_order = next;
            next += 1;
        }
    }
    for inst in instructions.iter_mut() {
        if Some(inst.slot) == active {
            inst.z_order = next;
        }
    }
}

/// `round(width * target_height / height)`, at least 1.
fn fit_width(width: u32, height: u32, target_height: u32) -> u32 {
    let w = u64::from(width) * u64::from(target_height);
    let h = u64::from(height);
    u32::try_from((w + h / 2) / h).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
#[path = "../../tests/unit/compile/plan.rs"]
mod tests;
