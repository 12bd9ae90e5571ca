use std::sync::Arc;

use crate::{
    assets::store::{AssetRef, AssetStore, PreparedAssets},
    cache::store::CacheStore,
    compile::cache_key::{CacheKey, derive_key},
    compile::plan::{RenderPlan, compile_scene},
    config::engine::EngineConfig,
    foundation::error::{SceneError, SceneResult},
    layout::resolver::{LayoutMode, resolve_layout},
    render::backend::{BackendKind, RenderBackend, RenderSettings, create_backend},
    render::encode::{PNG_CONTENT_TYPE, encode_png, placeholder_frame},
    scene::descriptor::SceneDescriptor,
};

/// `Cache-Control` for responses served from the cache.
pub const CACHE_CONTROL_HIT: &str = "public, max-age=31536000, immutable";
/// `Cache-Control` for freshly rendered responses.
pub const CACHE_CONTROL_MISS: &str = "public, max-age=300, s-maxage=300";
/// `Cache-Control` for the placeholder image.
pub const CACHE_CONTROL_FALLBACK: &str = "no-store";

/// Where the response bytes came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from the cache store.
    Hit,
    /// Rendered for this request.
    Miss,
    /// The pipeline failed; the body is the placeholder image.
    Fallback,
}

impl CacheStatus {
    /// `Cache-Control` header value for this status.
    pub fn cache_control(self) -> &'static str {
        match self {
            CacheStatus::Hit => CACHE_CONTROL_HIT,
            CacheStatus::Miss => CACHE_CONTROL_MISS,
            CacheStatus::Fallback => CACHE_CONTROL_FALLBACK,
        }
    }
}

/// An encoded image plus the metadata a transport layer needs to serve it.
#[derive(Clone, Debug, serde::Serialize)]
pub struct RenderResponse {
    /// Encoded PNG.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Always `image/png`.
    pub content_type: &'static str,
    /// Where the bytes came from.
    pub cache_status: CacheStatus,
    /// `Cache-Control` header value.
    pub cache_control: &'static str,
    /// Cache key of the decoded scene.
    pub key: CacheKey,
    /// Decoded scene, for observability.
    pub descriptor: SceneDescriptor,
    /// Layout mode of the decoded scene.
    pub layout_mode: LayoutMode,
}

/// Cache-fronted scene renderer.
///
/// Holds read-only configuration and the injected collaborators; safe to share across threads.
pub struct SceneEngine {
    config: Arc<EngineConfig>,
    assets: Arc<dyn AssetStore>,
    cache: Arc<dyn CacheStore>,
    backend: Box<dyn RenderBackend>,
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for SceneEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneEngine")
            .field("version", &self.config.version)
            .field("fetch_threads", &self.config.fetch_threads)
            .finish_non_exhaustive()
    }
}

impl SceneEngine {
    /// Validate `config` and build an engine rendering on the CPU backend.
    pub fn new(
        config: EngineConfig,
        assets: Arc<dyn AssetStore>,
        cache: Arc<dyn CacheStore>,
    ) -> SceneResult<Self> {
        config.validate()?;
        let pool = match config.fetch_threads {
            Some(n) => Some(build_thread_pool(n)?),
            None => None,
        };
        let backend = create_backend(
            BackendKind::Cpu,
            RenderSettings {
                dim: config.dim,
                ..RenderSettings::default()
            },
        );
        Ok(Self {
            config: Arc::new(config),
            assets,
            cache,
            backend,
            pool,
        })
    }

    /// Replace the image pipeline.
    pub fn with_backend(mut self, backend: Box<dyn RenderBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Validated configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decode `raw` with the configured code tables.
    pub fn decode(&self, raw: &str) -> SceneDescriptor {
        SceneDescriptor::decode(raw, &self.config.codes)
    }

    /// Cache key `raw` would be served under.
    pub fn key_for(&self, raw: &str) -> CacheKey {
        derive_key(&self.decode(raw), &self.config)
    }

    /// Decode `raw`, fetch its assets, and compile the render plan without painting.
    pub fn plan(&self, raw: &str) -> (SceneDescriptor, RenderPlan) {
        let descriptor = self.decode(raw);
        let (plan, _) = self.prepare(&descriptor);
        (descriptor, plan)
    }

    /// Serve the scene for `raw`, from cache when possible.
    ///
    /// Asset misses and cache failures are absorbed. A pipeline fault yields the placeholder
    /// image; the only error returned is failure to encode that placeholder.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn render(&self, raw: &str) -> SceneResult<RenderResponse> {
        let descriptor = self.decode(raw);
        let key = derive_key(&descriptor, &self.config);
        let layout_mode = descriptor.layout_mode();

        let respond = |bytes: Vec<u8>, status: CacheStatus, descriptor: SceneDescriptor| {
            RenderResponse {
                bytes,
                content_type: PNG_CONTENT_TYPE,
                cache_status: status,
                cache_control: status.cache_control(),
                key: key.clone(),
                descriptor,
                layout_mode,
            }
        };

        match self.cache.get(&key) {
            Ok(Some(bytes)) => {
                tracing::debug!(%key, "cache hit");
                return Ok(respond(bytes, CacheStatus::Hit, descriptor));
            }
            Ok(None) => tracing::debug!(%key, "cache miss"),
            Err(e) => tracing::warn!(%key, error = %e, "cache read failed; treating as miss"),
        }

        let (plan, assets) = self.prepare(&descriptor);
        match self.paint(&plan, &assets) {
            Ok(bytes) => {
                if let Err(e) = self.cache.put(&key, &bytes) {
                    tracing::warn!(%key, error = %e, "cache write failed");
                }
                Ok(respond(bytes, CacheStatus::Miss, descriptor))
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "render failed; serving placeholder");
                let frame = placeholder_frame(self.config.layout.canvas, self.config.placeholder_rgba);
                let bytes = encode_png(&frame)?;
                Ok(respond(bytes, CacheStatus::Fallback, descriptor))
            }
        }
    }

    fn prepare(&self, descriptor: &SceneDescriptor) -> (RenderPlan, PreparedAssets) {
        let layout = resolve_layout(descriptor, &self.config.layout);
        let refs = AssetRef::for_descriptor(descriptor);
        let store = self.assets.as_ref();
        let assets = match &self.pool {
            Some(pool) => pool.install(|| PreparedAssets::fetch_all(&refs, store)),
            None => PreparedAssets::fetch_all(&refs, store),
        };
        tracing::debug!(
            requested = refs.len(),
            resolved = assets.len(),
            mode = ?layout.mode,
            "assets prepared"
        );
        let plan = compile_scene(descriptor, &layout, &self.config, &assets);
        (plan, assets)
    }

    fn paint(&self, plan: &RenderPlan, assets: &PreparedAssets) -> SceneResult<Vec<u8>> {
        let frame = self.backend.render_plan(plan, assets)?;
        encode_png(&frame)
    }
}

fn build_thread_pool(threads: usize) -> SceneResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(SceneError::validation(
            "fetch_threads must be >= 1 when set",
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| SceneError::render(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/engine/orchestrator.rs"]
mod tests;
