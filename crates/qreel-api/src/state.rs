//! Application state.

use std::sync::Arc;

use qreel_media::{AssetLoader, FfmpegRenderer, RenderService, Renderer, ScratchDir};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub render: Arc<RenderService>,
}

impl AppState {
    /// Create application state backed by the FFmpeg renderer.
    pub fn new(config: ApiConfig) -> Self {
        let assets = AssetLoader::new(&config.assets_dir)
            .with_account_handle(config.account_handle.clone());
        let renderer = FfmpegRenderer::new(assets).with_encoding(config.encoding.clone());
        Self::with_renderer(config, Arc::new(renderer))
    }

    /// Create application state around any renderer.
    pub fn with_renderer(config: ApiConfig, renderer: Arc<dyn Renderer>) -> Self {
        let scratch = ScratchDir::resolve(config.environment, config.scratch_dir.clone());
        Self {
            render: Arc::new(RenderService::new(renderer, scratch)),
            config: Arc::new(config),
        }
    }

    pub fn scratch(&self) -> &ScratchDir {
        self.render.scratch()
    }
}
