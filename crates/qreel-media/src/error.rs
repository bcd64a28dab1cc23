//! Error types for media operations.

use std::path::PathBuf;
use std::time::Duration;

use qreel_models::RenderKind;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while composing or rendering.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("{label} timeout after {millis}ms")]
    Timeout { label: &'static str, millis: u128 },

    #[error("Template asset missing: {0}")]
    AssetMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    ///
    /// The message carries the tail of stderr so callers that only see
    /// `Display` still get the engine's explanation.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        let mut message = message.into();
        if let Some(code) = exit_code {
            message.push_str(&format!(" (exit code {})", code));
        }
        if let Some(tail) = stderr.as_deref().filter(|s| !s.trim().is_empty()) {
            message.push_str(": ");
            message.push_str(tail.trim());
        }
        Self::FfmpegFailed {
            message,
            stderr,
            exit_code,
        }
    }

    /// Create a timeout error for a render kind.
    pub fn timeout(kind: RenderKind, after: Duration) -> Self {
        Self::Timeout {
            label: kind.timeout_label(),
            millis: after.as_millis(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, MediaError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = MediaError::timeout(RenderKind::Video, Duration::from_millis(60_000));
        assert_eq!(err.to_string(), "Rendering timeout after 60000ms");
        assert!(err.is_timeout());

        let err = MediaError::timeout(RenderKind::Thumbnail, Duration::from_millis(30_000));
        assert_eq!(err.to_string(), "Thumbnail rendering timeout after 30000ms");
    }

    #[test]
    fn test_ffmpeg_failed_carries_stderr() {
        let err = MediaError::ffmpeg_failed(
            "FFmpeg exited with non-zero status",
            Some("No such filter: 'drawtext'\n".to_string()),
            Some(1),
        );
        let text = err.to_string();
        assert!(text.contains("exit code 1"));
        assert!(text.contains("No such filter"));
        assert!(!err.is_timeout());
    }
}
