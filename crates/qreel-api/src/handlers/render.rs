//! Render handlers.
//!
//! Each request renders into its own scratch file and streams it back. The
//! file is owned by exactly one place at a time: the render service while
//! rendering, then the response body stream. Every exit path (validation is
//! the only one that never allocates) ends with the file removed.

use std::time::Instant;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use tracing::{info, warn};

use qreel_media::{with_timeout, ScratchFileStream};
use qreel_models::{QuizRequest, RenderKind};

use crate::error::{ApiError, ApiResult};
use crate::metrics::{self, RenderOutcome};
use crate::state::AppState;

/// `POST /render`: full quiz video as mp4.
pub async fn render_video(
    State(state): State<AppState>,
    payload: Result<Json<QuizRequest>, JsonRejection>,
) -> ApiResult<Response> {
    render(state, RenderKind::Video, payload).await
}

/// `POST /thumbnail`: first frame as PNG.
pub async fn render_thumbnail(
    State(state): State<AppState>,
    payload: Result<Json<QuizRequest>, JsonRejection>,
) -> ApiResult<Response> {
    render(state, RenderKind::Thumbnail, payload).await
}

fn missing_output_message(kind: RenderKind) -> &'static str {
    match kind {
        RenderKind::Video => "Rendered file does not exist",
        RenderKind::Thumbnail => "Rendered thumbnail file does not exist",
    }
}

async fn render(
    state: AppState,
    kind: RenderKind,
    payload: Result<Json<QuizRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload?;
    let question = request.validate()?;

    info!(
        kind = %kind,
        question_id = ?question.id,
        question = %question.question,
        "Render request accepted"
    );

    let start = Instant::now();
    let timeout = state.config.timeout_for(kind);
    let rendered = with_timeout(kind, timeout, state.render.render(kind, &question)).await;
    let elapsed = start.elapsed().as_secs_f64();

    let file = match rendered {
        Ok(file) => file,
        Err(e) => {
            let outcome = if e.is_timeout() {
                RenderOutcome::Timeout
            } else {
                RenderOutcome::Failed
            };
            metrics::record_render(kind, outcome, elapsed);
            return Err(ApiError::render(kind, e));
        }
    };

    if !tokio::fs::try_exists(file.path()).await.unwrap_or(false) {
        warn!(path = %file.path().display(), "Renderer reported success without output");
        metrics::record_render(kind, RenderOutcome::Failed, elapsed);
        return Err(ApiError::render_failed(kind, missing_output_message(kind)));
    }

    let stream = ScratchFileStream::open(file).await.map_err(|e| {
        metrics::record_render(kind, RenderOutcome::Failed, elapsed);
        ApiError::render_failed(kind, format!("Failed to open rendered file: {}", e))
    })?;

    metrics::record_render(kind, RenderOutcome::Success, elapsed);
    metrics::record_render_output(kind, stream.len());

    let filename = kind.attachment_name(question.id, Utc::now().timestamp_millis());
    info!(
        kind = %kind,
        filename = %filename,
        size_bytes = stream.len(),
        elapsed_ms = (elapsed * 1000.0) as u64,
        "Streaming rendered file"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, kind.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .header(header::CONTENT_LENGTH, stream.len())
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}
