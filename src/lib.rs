//! scenecomp turns compact scene codes into composited visual-novel stills.
//!
//! A scene code such as `"a1.b4.c7.h.c"` names up to three characters (left, center, right),
//! a background and the active speaker. The engine decodes it, lays the characters out on a
//! fixed canvas, paints them over the background and serves the PNG through a cache keyed on the
//! decoded scene.
//!
//! # Pipeline overview
//!
//! 1. **Decode**: `&str -> SceneDescriptor` (total; malformed fragments become absent fields)
//! 2. **Layout**: `SceneDescriptor -> ResolvedLayout` (mode, sprite height, anchors, crop table)
//! 3. **Compile**: `ResolvedLayout + PreparedAssets -> RenderPlan` (one instruction per sprite)
//! 4. **Render**: `RenderPlan -> FrameRGBA` (CPU backend), then PNG encoding
//!
//! [`SceneEngine`] sequences these behind a cache lookup keyed by [`derive_key`].
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No IO in renderers**: asset fetches are front-loaded into [`PreparedAssets`].
//! - **Premultiplied RGBA8** end-to-end until encoding.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod cache;
mod codes;
mod compile;
mod config;
mod engine;
mod foundation;
mod layout;
mod render;
mod scene;

pub use assets::decode::decode_image;
pub use assets::store::{
    AssetRef, AssetStore, FsAssetStore, MemoryAssetStore, PreparedAssets, PreparedImage,
    normalize_rel_path,
};
pub use cache::store::{CacheStore, FsCacheStore, MemoryCacheStore, NoopCacheStore};
pub use codes::tables::{CodeTables, HeightClass, HeightTable};
pub use compile::cache_key::{CacheKey, derive_key};
pub use compile::plan::{BackgroundOp, RenderInstruction, RenderPlan, build_plan, compile_scene};
pub use config::engine::{BackgroundFills, DimTreatment, ENGINE_VERSION, EngineConfig};
pub use engine::orchestrator::{
    CACHE_CONTROL_FALLBACK, CACHE_CONTROL_HIT, CACHE_CONTROL_MISS, CacheStatus, RenderResponse,
    SceneEngine,
};
pub use foundation::core::{Canvas, Rgba8, Slot};
pub use foundation::error::{SceneError, SceneResult};
pub use layout::resolver::{
    CropPolicy, CropRatios, LayoutConfig, LayoutMode, ResolvedLayout, SizeBucket, SlotAnchors,
    resolve_layout, select_layout_mode,
};
pub use render::backend::{BackendKind, FrameRGBA, RenderBackend, RenderSettings, create_backend};
pub use render::composite::ResizeFilter;
pub use render::cpu::CpuBackend;
pub use render::encode::{PNG_CONTENT_TYPE, encode_png, placeholder_frame};
pub use scene::descriptor::{CharacterRef, FRAGMENT_DELIMITER, SceneDescriptor};
