use crate::{
    assets::store::{AssetRef, PreparedAssets, PreparedImage},
    compile::plan::{BackgroundOp, RenderInstruction, RenderPlan},
    foundation::error::{SceneError, SceneResult},
    render::backend::{FrameRGBA, RenderBackend, RenderSettings},
    render::composite::{blit_over, dim_in_place, fill_in_place, resize_premul},
};

/// CPU compositor: background, then sprites back to front.
///
/// A sprite that fails to paint is skipped so the rest of the scene survives. Only a background
/// failure fails the frame.
#[derive(Clone, Debug, Default)]
pub struct CpuBackend {
    settings: RenderSettings,
}

impl CpuBackend {
    /// Create a backend with the given resampling and dim settings.
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    fn paint_background(
        &self,
        plan: &RenderPlan,
        assets: &PreparedAssets,
        canvas: &mut [u8],
    ) -> SceneResult<()> {
        match &plan.background {
            BackgroundOp::Fill { rgba } => {
                fill_in_place(canvas, rgba.to_premul());
            }
            BackgroundOp::Image { asset } => {
                let img = require(assets, asset)?;
                let resized = resize_premul(
                    img,
                    plan.canvas.width,
                    plan.canvas.height,
                    self.settings.resize_filter,
                )?;
                fill_in_place(canvas, [0, 0, 0, 0]);
                blit_over(
                    canvas,
                    plan.canvas.width,
                    plan.canvas.height,
                    &resized,
                    plan.canvas.width,
                    plan.canvas.height,
                    0,
                    0,
                )?;
            }
        }
        Ok(())
    }

    fn paint_sprite(
        &self,
        plan: &RenderPlan,
        inst: &RenderInstruction,
        assets: &PreparedAssets,
        canvas: &mut [u8],
    ) -> SceneResult<()> {
        let img = require(assets, &inst.asset)?;
        if inst.vertical_crop_px >= inst.resized_height {
            return Err(SceneError::render(format!(
                "{} crop {} leaves nothing of height {}",
                inst.asset, inst.vertical_crop_px, inst.resized_height
            )));
        }
        let mut sprite = resize_premul(
            img,
            inst.resized_width,
            inst.resized_height,
            self.settings.resize_filter,
        )?;
        if inst.dimmed {
            dim_in_place(&mut sprite, self.settings.dim);
        }
        blit_over(
            canvas,
            plan.canvas.width,
            plan.canvas.height,
            &sprite,
            inst.resized_width,
            inst.visible_height(),
            inst.left,
            inst.top,
        )
    }
}

impl RenderBackend for CpuBackend {
    fn render_plan(&self, plan: &RenderPlan, assets: &PreparedAssets) -> SceneResult<FrameRGBA> {
        let mut data = vec![0u8; plan.canvas.pixel_count() * 4];
        self.paint_background(plan, assets, &mut data)?;
        for inst in plan.paint_order() {
            if let Err(e) = self.paint_sprite(plan, inst, assets, &mut data) {
                tracing::warn!(slot = %inst.slot, asset = %inst.asset, error = %e, "sprite skipped");
            }
        }
        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data,
            premultiplied: true,
        })
    }
}

fn require<'a>(assets: &'a PreparedAssets, asset: &AssetRef) -> SceneResult<&'a PreparedImage> {
    assets
        .get(asset)
        .ok_or_else(|| SceneError::render(format!("plan references unresolved asset {asset}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
