//! Render side of the quiz shorts pipeline.
//!
//! This crate provides:
//! - Scratch directory management with single-fire file cleanup
//! - Type-safe FFmpeg command building and a kill-on-drop runner
//! - The quiz composition (four timed segments plus audio cues)
//! - The render service and its timeout race

pub mod assets;
pub mod command;
pub mod composition;
pub mod error;
pub mod escape;
pub mod progress;
pub mod renderer;
pub mod scratch;
pub mod stream;
pub mod timeout;

pub use assets::{AssetLoader, TemplateAssets};
pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use composition::QuizComposition;
pub use error::{MediaError, MediaResult};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use renderer::{FfmpegRenderer, RenderService, Renderer};
pub use scratch::{ScratchDir, ScratchFile, SweepReport, DEFAULT_SWEEP_MAX_AGE};
pub use stream::ScratchFileStream;
pub use timeout::with_timeout;
