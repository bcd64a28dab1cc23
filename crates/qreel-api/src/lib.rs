//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /render` and `POST /thumbnail`, streaming the rendered file
//! - Health and readiness probes
//! - Request id, logging and security headers middleware
//! - Prometheus metrics
//! - The background scratch sweeper

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::ScratchSweeper;
pub use state::AppState;
