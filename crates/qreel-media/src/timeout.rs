//! Deadline race around a render call.

use std::future::Future;
use std::time::Duration;

use qreel_models::RenderKind;
use tracing::warn;

use crate::error::{MediaError, MediaResult};

/// Race `future` against a wall-clock deadline.
///
/// Exactly one outcome is observable: the future's own result (success or
/// error) if it settles first, or [`MediaError::Timeout`] if the deadline
/// elapses first. On timeout the future is dropped, which stops the FFmpeg
/// child (kill-on-drop) and releases any partial scratch file it owned.
pub async fn with_timeout<F, T>(kind: RenderKind, timeout: Duration, future: F) -> MediaResult<T>
where
    F: Future<Output = MediaResult<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                kind = %kind,
                timeout_ms = timeout.as_millis() as u64,
                "Render deadline elapsed, abandoning render"
            );
            Err(MediaError::timeout(kind, timeout))
        }
    }
}
