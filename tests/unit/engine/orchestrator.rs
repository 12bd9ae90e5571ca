use std::io::Cursor;

use super::*;
use crate::{
    assets::store::MemoryAssetStore,
    cache::store::{MemoryCacheStore, NoopCacheStore},
    foundation::core::{Canvas, Slot},
    layout::resolver::{LayoutConfig, SlotAnchors},
    render::backend::FrameRGBA,
};

fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn decode_png(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
        .unwrap()
        .to_rgba8()
}

fn assert_close(actual: [u8; 4], expected: [u8; 4]) {
    for (a, e) in actual.iter().zip(expected) {
        assert!(a.abs_diff(e) <= 1, "{actual:?} != {expected:?}");
    }
}

fn small_config() -> EngineConfig {
    EngineConfig {
        layout: LayoutConfig {
            canvas: Canvas {
                width: 144,
                height: 96,
            },
            large_height: 84,
            small_height: 74,
            large_anchors: SlotAnchors {
                left: 36,
                center: 72,
                right: 108,
            },
            small_anchors: SlotAnchors {
                left: 26,
                center: 72,
                right: 118,
            },
            ..LayoutConfig::default()
        },
        ..EngineConfig::default()
    }
}

fn character(id: &str) -> AssetRef {
    AssetRef::Character(id.to_string())
}

fn full_store() -> MemoryAssetStore {
    MemoryAssetStore::new()
        .with(character("girlA_angry"), png_bytes(10, 20, [255, 255, 255, 255]))
        .with(character("girlB_smile"), png_bytes(10, 20, [255, 255, 255, 255]))
        .with(character("girlC_v"), png_bytes(10, 20, [255, 255, 255, 255]))
        .with(
            AssetRef::Background("home".to_string()),
            png_bytes(4, 4, [0, 0, 80, 255]),
        )
}

fn engine_with(assets: MemoryAssetStore, cache: Arc<dyn CacheStore>) -> SceneEngine {
    SceneEngine::new(small_config(), Arc::new(assets), cache).unwrap()
}

struct BrokenCache;

impl CacheStore for BrokenCache {
    fn get(&self, _key: &CacheKey) -> SceneResult<Option<Vec<u8>>> {
        Err(SceneError::cache("unreachable"))
    }

    fn put(&self, _key: &CacheKey, _bytes: &[u8]) -> SceneResult<()> {
        Err(SceneError::cache("read-only"))
    }
}

struct FailingBackend;

impl RenderBackend for FailingBackend {
    fn render_plan(&self, _plan: &RenderPlan, _assets: &PreparedAssets) -> SceneResult<FrameRGBA> {
        Err(SceneError::render("gpu on fire"))
    }
}

#[test]
fn miss_then_hit_serves_identical_bytes() {
    let cache = Arc::new(MemoryCacheStore::new());
    let engine = engine_with(full_store(), cache.clone());

    let first = engine.render("a1.b4.c7.h.c").unwrap();
    assert_eq!(first.cache_status, CacheStatus::Miss);
    assert_eq!(first.cache_control, CACHE_CONTROL_MISS);
    assert_eq!(first.content_type, "image/png");
    assert_eq!(first.layout_mode, LayoutMode::Triple);
    assert!(cache.contains(&first.key));

    let second = engine.render("a1.b4.c7.h.c").unwrap();
    assert_eq!(second.cache_status, CacheStatus::Hit);
    assert_eq!(second.cache_control, CACHE_CONTROL_HIT);
    assert_eq!(second.key, first.key);
    assert_eq!(second.bytes, first.bytes);
    assert_eq!(cache.len(), 1);
}

#[test]
fn equivalent_codes_share_a_cache_entry() {
    let cache = Arc::new(MemoryCacheStore::new());
    let engine = engine_with(full_store(), cache.clone());
    let a = engine.render("a1.*.c7.h.r").unwrap();
    let b = engine.render("a1.zz.c7x.h.r.junk").unwrap();
    assert_eq!(a.key, b.key);
    assert_eq!(b.cache_status, CacheStatus::Hit);
    assert_eq!(engine.key_for("a1.*.c7.h.r"), a.key);
}

#[test]
fn missing_center_asset_drops_only_that_slot() {
    let assets = MemoryAssetStore::new()
        .with(character("girlA_angry"), png_bytes(10, 20, [255, 0, 0, 255]))
        .with(character("girlC_v"), png_bytes(10, 20, [0, 0, 255, 255]));
    let engine = engine_with(assets, Arc::new(NoopCacheStore));

    let (_, plan) = engine.plan("a1.b4.c7.h.c");
    let slots = plan.instructions.iter().map(|i| i.slot).collect::<Vec<_>>();
    assert_eq!(slots, vec![Slot::Left, Slot::Right]);
    assert_eq!(plan.mode, LayoutMode::Triple);

    let resp = engine.render("a1.b4.c7.h.c").unwrap();
    assert_eq!(resp.cache_status, CacheStatus::Miss);
    let img = decode_png(&resp.bytes);
    assert_eq!(img.dimensions(), (144, 96));
}

#[test]
fn missing_background_uses_fill_colour() {
    let engine = engine_with(MemoryAssetStore::new(), Arc::new(NoopCacheStore));
    let resp = engine.render("..*.f.").unwrap();
    let img = decode_png(&resp.bytes);
    let fill = engine.config().backgrounds.fill_for(Some("forest"));
    assert_eq!(img.get_pixel(0, 0).0, fill.0);
    assert_eq!(img.get_pixel(143, 95).0, fill.0);
}

#[test]
fn background_asset_is_painted_when_present() {
    let engine = engine_with(full_store(), Arc::new(NoopCacheStore));
    let img = decode_png(&engine.render("...h.").unwrap().bytes);
    assert_close(img.get_pixel(0, 0).0, [0, 0, 80, 255]);
}

#[test]
fn inactive_sprite_is_dimmed() {
    let engine = engine_with(full_store(), Arc::new(NoopCacheStore));
    let resp = engine.render("a1..c7..l").unwrap();
    assert_eq!(resp.layout_mode, LayoutMode::Paired);
    let img = decode_png(&resp.bytes);
    let active = img.get_pixel(36, 60).0;
    let dimmed = img.get_pixel(108, 60).0;
    assert_close(active, [255, 255, 255, 255]);
    assert!(dimmed[0] < 200);
    assert_eq!(dimmed[3], 255);
}

#[test]
fn cache_failures_never_reach_the_caller() {
    let engine = engine_with(full_store(), Arc::new(BrokenCache));
    let resp = engine.render("a1...h.").unwrap();
    assert_eq!(resp.cache_status, CacheStatus::Miss);
    assert!(!resp.bytes.is_empty());
}

#[test]
fn render_fault_serves_uncached_placeholder() {
    let cache = Arc::new(MemoryCacheStore::new());
    let engine = engine_with(full_store(), cache.clone()).with_backend(Box::new(FailingBackend));

    let resp = engine.render("a1.b4.c7.h.c").unwrap();
    assert_eq!(resp.cache_status, CacheStatus::Fallback);
    assert_eq!(resp.cache_control, CACHE_CONTROL_FALLBACK);
    assert!(cache.is_empty());

    let img = decode_png(&resp.bytes);
    assert_eq!(img.dimensions(), (144, 96));
    assert_eq!(img.get_pixel(10, 10).0, [255, 200, 200, 255]);
}

#[test]
fn dedicated_fetch_pool_renders_the_same_scene() {
    let mut cfg = small_config();
    cfg.fetch_threads = Some(2);
    let pooled = SceneEngine::new(cfg, Arc::new(full_store()), Arc::new(NoopCacheStore)).unwrap();
    let shared = engine_with(full_store(), Arc::new(NoopCacheStore));
    assert_eq!(
        pooled.render("a1.b4.c7.h.r").unwrap().bytes,
        shared.render("a1.b4.c7.h.r").unwrap().bytes
    );
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    let mut cfg = small_config();
    cfg.fetch_threads = Some(0);
    let err = SceneEngine::new(cfg, Arc::new(MemoryAssetStore::new()), Arc::new(NoopCacheStore))
        .unwrap_err();
    assert!(matches!(err, SceneError::Validation(_)));
}

#[test]
fn response_metadata_serializes_without_bytes() {
    let engine = engine_with(full_store(), Arc::new(NoopCacheStore));
    let resp = engine.render("b4...h.").unwrap();
    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["cache_status"], "miss");
    assert_eq!(json["content_type"], "image/png");
    assert_eq!(json["key"], resp.key.as_str());
    assert!(json.get("bytes").is_none());
    assert_eq!(json["descriptor"]["center"]["base_id"], "girlB");
}
