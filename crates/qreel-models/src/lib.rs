//! Shared data models for the qreel backend.
//!
//! This crate provides Serde-serializable types for:
//! - Quiz questions and their validation
//! - Render kinds (video / thumbnail) and their output conventions
//! - Template timing, layout and color constants
//! - Encoding configuration
//! - Deployment environment

pub mod encoding;
pub mod environment;
pub mod quiz;
pub mod render;
pub mod template;

// Re-export common types
pub use encoding::EncodingConfig;
pub use environment::Environment;
pub use quiz::{QuizQuestion, QuizRequest, QuizType, QuizValidationError};
pub use render::RenderKind;
