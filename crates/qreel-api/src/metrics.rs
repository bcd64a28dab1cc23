//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use qreel_media::SweepReport;
use qreel_models::RenderKind;

/// Install the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "qreel_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "qreel_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "qreel_http_requests_in_flight";

    // Render metrics
    pub const RENDERS_TOTAL: &str = "qreel_renders_total";
    pub const RENDER_DURATION_SECONDS: &str = "qreel_render_duration_seconds";
    pub const RENDER_OUTPUT_BYTES: &str = "qreel_render_output_bytes";

    // Scratch metrics
    pub const SCRATCH_FILES_SWEPT_TOTAL: &str = "qreel_scratch_files_swept_total";
    pub const SCRATCH_SWEEP_FAILURES_TOTAL: &str = "qreel_scratch_sweep_failures_total";
}

/// How a render request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Success,
    Failed,
    Timeout,
}

impl RenderOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderOutcome::Success => "success",
            RenderOutcome::Failed => "failed",
            RenderOutcome::Timeout => "timeout",
        }
    }
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished render.
pub fn record_render(kind: RenderKind, outcome: RenderOutcome, duration_secs: f64) {
    let labels = [
        ("kind", kind.as_str().to_string()),
        ("outcome", outcome.as_str().to_string()),
    ];
    counter!(names::RENDERS_TOTAL, &labels).increment(1);
    histogram!(names::RENDER_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record the size of a rendered file.
pub fn record_render_output(kind: RenderKind, bytes: u64) {
    let labels = [("kind", kind.as_str().to_string())];
    histogram!(names::RENDER_OUTPUT_BYTES, &labels).record(bytes as f64);
}

/// Record a scratch sweep.
pub fn record_sweep(report: &SweepReport) {
    counter!(names::SCRATCH_FILES_SWEPT_TOTAL).increment(report.removed as u64);
    counter!(names::SCRATCH_SWEEP_FAILURES_TOTAL).increment(report.failed as u64);
}

/// Counts a request as in flight until dropped, including when the request
/// future is cancelled by a client disconnect.
struct InFlightGuard;

impl InFlightGuard {
    fn new() -> Self {
        gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
        Self
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);
    }
}

/// Metrics middleware for HTTP requests.
///
/// Requests are labelled by their matched route so unknown paths collapse
/// into a single series.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    let in_flight = InFlightGuard::new();
    let response = next.run(request).await;
    drop(in_flight);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
