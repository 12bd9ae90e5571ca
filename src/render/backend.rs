use crate::{
    assets::store::PreparedAssets,
    compile::plan::RenderPlan,
    config::engine::DimTreatment,
    foundation::error::SceneResult,
    render::composite::ResizeFilter,
};

/// A rendered scene as RGBA8 pixels.
///
/// Frames are **premultiplied alpha** by default. The `premultiplied` flag is included to make
/// this explicit at API boundaries.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Read one premultiplied pixel; `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data.get(i..i + 4).map(|p| [p[0], p[1], p[2], p[3]])
    }
}

/// The image pipeline: executes a [`RenderPlan`] against decoded assets.
///
/// Backends hold no per-request state, so one instance serves concurrent requests.
pub trait RenderBackend: Send + Sync {
    /// Paint `plan` into a canvas-sized premultiplied frame.
    fn render_plan(&self, plan: &RenderPlan, assets: &PreparedAssets) -> SceneResult<FrameRGBA>;
}

/// Available backend kinds.
#[derive(Clone, Copy, Debug, Default)]
pub enum BackendKind {
    /// CPU raster backend built on the `image` crate.
    #[default]
    Cpu,
}

/// Backend-agnostic settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct RenderSettings {
    /// Treatment applied to dimmed sprites.
    pub dim: DimTreatment,
    /// Filter for sprite and background resampling.
    pub resize_filter: ResizeFilter,
}

/// Construct a backend of the given kind.
pub fn create_backend(kind: BackendKind, settings: RenderSettings) -> Box<dyn RenderBackend> {
    match kind {
        BackendKind::Cpu => Box::new(crate::render::cpu::CpuBackend::new(settings)),
    }
}
