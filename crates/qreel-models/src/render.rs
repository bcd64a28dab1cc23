//! Render kinds and their output conventions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default deadline for a full video render.
pub const DEFAULT_VIDEO_TIMEOUT: Duration = Duration::from_millis(60_000);
/// Default deadline for a thumbnail render.
pub const DEFAULT_THUMBNAIL_TIMEOUT: Duration = Duration::from_millis(30_000);

/// What a render job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderKind {
    /// H.264 mp4 of the full composition
    Video,
    /// PNG of frame 0
    Thumbnail,
}

impl RenderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderKind::Video => "video",
            RenderKind::Thumbnail => "thumbnail",
        }
    }

    /// File extension (without dot).
    pub fn extension(&self) -> &'static str {
        match self {
            RenderKind::Video => "mp4",
            RenderKind::Thumbnail => "png",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            RenderKind::Video => "video/mp4",
            RenderKind::Thumbnail => "image/png",
        }
    }

    /// Prefix of the scratch file name.
    pub fn scratch_prefix(&self) -> &'static str {
        match self {
            RenderKind::Video => "quiz",
            RenderKind::Thumbnail => "quiz-thumbnail",
        }
    }

    /// Prefix of the attachment name sent to clients.
    pub fn attachment_prefix(&self) -> &'static str {
        match self {
            RenderKind::Video => "quiz-video",
            RenderKind::Thumbnail => "quiz-thumbnail",
        }
    }

    /// Attachment file name, keyed by question id or a fallback timestamp.
    pub fn attachment_name(&self, id: Option<i64>, fallback_millis: i64) -> String {
        format!(
            "{}-{}.{}",
            self.attachment_prefix(),
            id.unwrap_or(fallback_millis),
            self.extension()
        )
    }

    pub fn default_timeout(&self) -> Duration {
        match self {
            RenderKind::Video => DEFAULT_VIDEO_TIMEOUT,
            RenderKind::Thumbnail => DEFAULT_THUMBNAIL_TIMEOUT,
        }
    }

    /// Label used in timeout messages.
    pub fn timeout_label(&self) -> &'static str {
        match self {
            RenderKind::Video => "Rendering",
            RenderKind::Thumbnail => "Thumbnail rendering",
        }
    }
}

impl std::fmt::Display for RenderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
