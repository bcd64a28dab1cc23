//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use qreel_media::MediaError;
use qreel_models::{QuizValidationError, RenderKind};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("{} failed: {message}", .kind.timeout_label())]
    Render {
        kind: RenderKind,
        message: String,
        timed_out: bool,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid_body(msg: impl Into<String>) -> Self {
        Self::InvalidBody(msg.into())
    }

    /// Render failure that is not a timeout.
    pub fn render_failed(kind: RenderKind, msg: impl Into<String>) -> Self {
        Self::Render {
            kind,
            message: msg.into(),
            timed_out: false,
        }
    }

    /// Wrap a media error raised while rendering `kind`.
    pub fn render(kind: RenderKind, err: MediaError) -> Self {
        Self::Render {
            kind,
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Render {
                timed_out: true, ..
            } => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Render { .. } | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short error label sent as `error`.
    fn label(&self) -> &'static str {
        match self {
            ApiError::InvalidBody(_) => "Invalid request body",
            ApiError::PayloadTooLarge(_) => "Payload too large",
            ApiError::Render {
                kind: RenderKind::Video,
                ..
            } => "Rendering failed",
            ApiError::Render {
                kind: RenderKind::Thumbnail,
                ..
            } => "Thumbnail rendering failed",
            ApiError::Internal(_) => "Internal server error",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::InvalidBody(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::Internal(msg)
            | ApiError::Render { message: msg, .. } => msg.clone(),
        }
    }
}

impl From<QuizValidationError> for ApiError {
    fn from(err: QuizValidationError) -> Self {
        Self::InvalidBody(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(rejection.body_text())
        } else {
            Self::InvalidBody(rejection.body_text())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", self);
        }

        let body = ErrorResponse {
            error: self.label().to_string(),
            message: self.message(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::from(QuizValidationError::MissingFields).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::render(
                RenderKind::Video,
                MediaError::timeout(RenderKind::Video, Duration::from_millis(60_000))
            )
            .status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::render(RenderKind::Thumbnail, MediaError::internal("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_labels() {
        let err = ApiError::from(QuizValidationError::OptionCount(3));
        assert_eq!(err.label(), "Invalid request body");
        assert_eq!(err.message(), "options must be an array with exactly 4 elements");

        let err = ApiError::render_failed(RenderKind::Thumbnail, "Rendered thumbnail file does not exist");
        assert_eq!(err.label(), "Thumbnail rendering failed");
        assert_eq!(err.to_string(), "Thumbnail rendering failed: Rendered thumbnail file does not exist");
    }

    #[test]
    fn test_timeout_message_is_kept() {
        let err = ApiError::render(
            RenderKind::Thumbnail,
            MediaError::timeout(RenderKind::Thumbnail, Duration::from_millis(30_000)),
        );
        assert!(err.message().contains("timeout"));
        assert_eq!(err.message(), "Thumbnail rendering timeout after 30000ms");
    }
}
