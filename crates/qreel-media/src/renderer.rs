//! Rendering quiz questions to files.

use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use qreel_models::template::TOTAL_DURATION;
use qreel_models::{EncodingConfig, QuizQuestion, RenderKind};

use crate::assets::AssetLoader;
use crate::command::FfmpegRunner;
use crate::composition::QuizComposition;
use crate::error::MediaResult;
use crate::progress::{FfmpegProgress, ProgressCallback};
use crate::scratch::{ScratchDir, ScratchFile};

/// Produces render outputs at a given path.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render the full composition as mp4.
    async fn render_video(&self, question: &QuizQuestion, output: &Path) -> MediaResult<()>;

    /// Render one frame of the composition as PNG.
    async fn render_still(&self, question: &QuizQuestion, frame: u32, output: &Path)
        -> MediaResult<()>;
}

/// FFmpeg-backed renderer.
#[derive(Debug)]
pub struct FfmpegRenderer {
    runner: FfmpegRunner,
    assets: AssetLoader,
    encoding: EncodingConfig,
}

impl FfmpegRenderer {
    pub fn new(assets: AssetLoader) -> Self {
        Self {
            runner: FfmpegRunner::new(),
            assets,
            encoding: EncodingConfig::default(),
        }
    }

    pub fn with_runner(mut self, runner: FfmpegRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Bind the template to a question. Loads assets on first use.
    pub async fn composition(&self, question: &QuizQuestion) -> MediaResult<QuizComposition> {
        let assets = self.assets.get().await?;
        Ok(QuizComposition::build(question, assets))
    }
}

/// Logs every 10% of encode progress.
fn progress_logger(question_id: Option<i64>) -> ProgressCallback {
    let last_bucket = AtomicU8::new(0);
    let total_ms = i64::from(TOTAL_DURATION) * 1000;

    Box::new(move |progress: FfmpegProgress| {
        let bucket = (progress.percentage(total_ms) / 10.0).floor() as u8;
        if bucket > last_bucket.fetch_max(bucket, Ordering::Relaxed) {
            info!(
                question_id = ?question_id,
                "Rendering progress: {}%",
                u32::from(bucket) * 10
            );
        }
    })
}

#[async_trait]
impl Renderer for FfmpegRenderer {
    async fn render_video(&self, question: &QuizQuestion, output: &Path) -> MediaResult<()> {
        let composition = self.composition(question).await?;
        let cmd = composition.video_command(output, &self.encoding);

        debug!(
            composition = composition.id(),
            layers = composition.layers().len(),
            "Starting video encode"
        );

        self.runner
            .run_with_progress(&cmd, progress_logger(question.id))
            .await
    }

    async fn render_still(
        &self,
        question: &QuizQuestion,
        frame: u32,
        output: &Path,
    ) -> MediaResult<()> {
        let composition = self.composition(question).await?;
        let cmd = composition.still_command(frame, output);
        self.runner.run(&cmd).await
    }
}

/// Allocates a scratch file per job and renders into it.
#[derive(Clone)]
pub struct RenderService {
    renderer: Arc<dyn Renderer>,
    scratch: ScratchDir,
}

impl RenderService {
    pub fn new(renderer: Arc<dyn Renderer>, scratch: ScratchDir) -> Self {
        Self { renderer, scratch }
    }

    pub fn scratch(&self) -> &ScratchDir {
        &self.scratch
    }

    /// Render one job.
    ///
    /// On success the caller owns the returned file. On failure the partial
    /// output is removed before the error is returned. Dropping the future
    /// mid-render releases the file too.
    pub async fn render(&self, kind: RenderKind, question: &QuizQuestion) -> MediaResult<ScratchFile> {
        self.scratch.ensure().await?;
        let mut file = self.scratch.allocate(kind);
        let start = Instant::now();

        info!(
            kind = %kind,
            question_id = ?question.id,
            quiz_type = %question.quiz_type,
            output = %file.path().display(),
            "Rendering quiz"
        );

        let result = match kind {
            RenderKind::Video => self.renderer.render_video(question, file.path()).await,
            RenderKind::Thumbnail => self.renderer.render_still(question, 0, file.path()).await,
        };

        match result {
            Ok(()) => {
                info!(
                    kind = %kind,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Render completed"
                );
                Ok(file)
            }
            Err(e) => {
                warn!(kind = %kind, "Render failed: {}", e);
                file.release();
                Err(e)
            }
        }
    }

    pub async fn render_video(&self, question: &QuizQuestion) -> MediaResult<ScratchFile> {
        self.render(RenderKind::Video, question).await
    }

    pub async fn render_thumbnail(&self, question: &QuizQuestion) -> MediaResult<ScratchFile> {
        self.render(RenderKind::Thumbnail, question).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use qreel_models::QuizRequest;
    use tempfile::TempDir;

    struct WritingRenderer;

    #[async_trait]
    impl Renderer for WritingRenderer {
        async fn render_video(&self, _question: &QuizQuestion, output: &Path) -> MediaResult<()> {
            tokio::fs::write(output, b"mp4").await?;
            Ok(())
        }

        async fn render_still(
            &self,
            _question: &QuizQuestion,
            frame: u32,
            output: &Path,
        ) -> MediaResult<()> {
            assert_eq!(frame, 0);
            tokio::fs::write(output, b"png").await?;
            Ok(())
        }
    }

    /// Writes a partial file, then fails.
    struct FailingRenderer;

    #[async_trait]
    impl Renderer for FailingRenderer {
        async fn render_video(&self, _question: &QuizQuestion, output: &Path) -> MediaResult<()> {
            tokio::fs::write(output, b"partial").await?;
            Err(MediaError::ffmpeg_failed("encode failed", None, Some(1)))
        }

        async fn render_still(
            &self,
            question: &QuizQuestion,
            _frame: u32,
            output: &Path,
        ) -> MediaResult<()> {
            self.render_video(question, output).await
        }
    }

    fn question() -> QuizQuestion {
        QuizRequest {
            question: Some("勉強".to_string()),
            options: Some(vec!["a".into(), "b".into(), "c".into(), "d".into()]),
            correct_answer: Some("c".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap()
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_render_returns_owned_file() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchDir::new(dir.path().join("renders"));
        let service = RenderService::new(Arc::new(WritingRenderer), scratch.clone());

        let video = service.render_video(&question()).await.unwrap();
        assert!(video.path().exists());
        assert_eq!(video.path().extension().unwrap(), "mp4");

        let thumb = service.render_thumbnail(&question()).await.unwrap();
        assert_eq!(thumb.path().extension().unwrap(), "png");
        assert_eq!(file_count(scratch.root()), 2);

        drop(video);
        drop(thumb);
        assert_eq!(file_count(scratch.root()), 0);
    }

    #[tokio::test]
    async fn test_failed_render_removes_partial_output() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchDir::new(dir.path());
        let service = RenderService::new(Arc::new(FailingRenderer), scratch.clone());

        let err = service.render_video(&question()).await.unwrap_err();
        assert!(err.to_string().contains("encode failed"));
        assert_eq!(file_count(scratch.root()), 0);
    }

    #[tokio::test]
    async fn test_missing_assets_fail_before_encode() {
        let dir = TempDir::new().unwrap();
        let renderer = FfmpegRenderer::new(AssetLoader::new(dir.path().join("assets")));
        let service = RenderService::new(Arc::new(renderer), ScratchDir::new(dir.path().join("out")));

        let err = service.render_thumbnail(&question()).await.unwrap_err();
        assert!(matches!(err, MediaError::AssetMissing(_)));
        assert_eq!(file_count(&dir.path().join("out")), 0);
    }

    #[test]
    fn test_progress_logger_accepts_updates() {
        let log = progress_logger(Some(1));
        for ms in [0, 2_300, 4_600, 23_000] {
            log(FfmpegProgress {
                out_time_ms: ms,
                ..Default::default()
            });
        }
    }
}
