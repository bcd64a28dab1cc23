//! Template assets (fonts, audio, background).
//!
//! Assets are probed once per process through [`AssetLoader`]; concurrent
//! first renders share a single in-flight probe. A failed probe is not cached,
//! so a later request retries after the assets are fixed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use qreel_models::template::DEFAULT_ACCOUNT_HANDLE;

use crate::error::{MediaError, MediaResult};

pub const FONT_REGULAR: &str = "fonts/SpoqaHanSansNeo-Regular.ttf";
pub const FONT_BOLD: &str = "fonts/SpoqaHanSansNeo-Bold.ttf";
pub const BACKGROUND_MUSIC: &str = "sounds/ukulele.mp3";
pub const TICK_SOUND: &str = "sounds/tick.wav";
pub const BACKGROUND_IMAGE: &str = "images/background.jpg";

/// Resolved template assets.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateAssets {
    pub font_regular: PathBuf,
    pub font_bold: PathBuf,
    /// Looped under the whole timeline when present
    pub background_music: Option<PathBuf>,
    /// One tick per countdown second when present
    pub tick_sound: Option<PathBuf>,
    /// Full-frame background; solid color when absent
    pub background_image: Option<PathBuf>,
    /// Handle shown on the outro
    pub account_handle: String,
}

impl TemplateAssets {
    /// Probe an assets directory. Fonts are required, everything else optional.
    pub async fn probe(dir: &Path, account_handle: impl Into<String>) -> MediaResult<Self> {
        let font_regular = require(dir.join(FONT_REGULAR)).await?;
        let font_bold = require(dir.join(FONT_BOLD)).await?;

        let assets = Self {
            font_regular,
            font_bold,
            background_music: optional(dir.join(BACKGROUND_MUSIC)).await,
            tick_sound: optional(dir.join(TICK_SOUND)).await,
            background_image: optional(dir.join(BACKGROUND_IMAGE)).await,
            account_handle: account_handle.into(),
        };

        info!(
            dir = %dir.display(),
            music = assets.background_music.is_some(),
            tick = assets.tick_sound.is_some(),
            background = assets.background_image.is_some(),
            "Template assets loaded"
        );

        Ok(assets)
    }
}

async fn require(path: PathBuf) -> MediaResult<PathBuf> {
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        Ok(path)
    } else {
        Err(MediaError::AssetMissing(path))
    }
}

async fn optional(path: PathBuf) -> Option<PathBuf> {
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        Some(path)
    } else {
        warn!(path = %path.display(), "Optional template asset not found, skipping");
        None
    }
}

/// Memoized asset probe.
#[derive(Debug)]
pub struct AssetLoader {
    dir: PathBuf,
    account_handle: String,
    loaded: OnceCell<Arc<TemplateAssets>>,
}

impl AssetLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            account_handle: DEFAULT_ACCOUNT_HANDLE.to_string(),
            loaded: OnceCell::new(),
        }
    }

    /// Override the outro account handle.
    pub fn with_account_handle(mut self, handle: impl Into<String>) -> Self {
        self.account_handle = handle.into();
        self
    }

    /// Loader that is already initialized (tests, preloaded assets).
    pub fn preloaded(assets: TemplateAssets) -> Self {
        Self {
            dir: PathBuf::new(),
            account_handle: assets.account_handle.clone(),
            loaded: OnceCell::new_with(Some(Arc::new(assets))),
        }
    }

    /// Get the assets, probing the directory on first use.
    pub async fn get(&self) -> MediaResult<Arc<TemplateAssets>> {
        self.loaded
            .get_or_try_init(|| async {
                TemplateAssets::probe(&self.dir, self.account_handle.clone())
                    .await
                    .map(Arc::new)
            })
            .await
            .cloned()
    }
}
