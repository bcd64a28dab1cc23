//! End-to-end renders through a real FFmpeg binary.
//!
//! Skipped when FFmpeg or a system TrueType font is not installed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use qreel_media::{
    check_ffmpeg, AssetLoader, FfmpegRenderer, FfmpegRunner, RenderService, ScratchDir,
    TemplateAssets,
};
use qreel_models::{EncodingConfig, QuizQuestion, QuizRequest, QuizType};

const FONT_CANDIDATES: &[(&str, &str)] = &[
    (
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    ),
    (
        "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans-Bold.ttf",
    ),
    (
        "/Library/Fonts/Arial.ttf",
        "/Library/Fonts/Arial Bold.ttf",
    ),
];

fn system_fonts() -> Option<(PathBuf, PathBuf)> {
    FONT_CANDIDATES
        .iter()
        .map(|(regular, bold)| (PathBuf::from(regular), PathBuf::from(bold)))
        .find(|(regular, bold)| regular.exists() && bold.exists())
}

/// FFmpeg binary and fonts, or `None` when the machine cannot render.
fn toolchain() -> Option<(PathBuf, PathBuf, PathBuf)> {
    let ffmpeg = match check_ffmpeg() {
        Ok(path) => path,
        Err(e) => {
            println!("Skipping render test: {}", e);
            return None;
        }
    };
    match system_fonts() {
        Some((regular, bold)) => Some((ffmpeg, regular, bold)),
        None => {
            println!("Skipping render test: no system TrueType font found");
            None
        }
    }
}

/// Generate a short asset with FFmpeg's own sources.
async fn generate(ffmpeg: &Path, source: &str, extra: &[&str], output: &Path) {
    let status = tokio::process::Command::new(ffmpeg)
        .args(["-y", "-hide_banner", "-v", "error", "-f", "lavfi", "-i", source])
        .args(extra)
        .arg(output)
        .status()
        .await
        .unwrap();
    assert!(status.success(), "failed to generate {}", output.display());
}

fn question() -> QuizQuestion {
    QuizRequest {
        id: Some(7),
        question: Some("It's 50% done: [ok], yes; no".to_string()),
        options: Some(vec![
            "alpha".to_string(),
            "beta's".to_string(),
            "gamma, delta".to_string(),
            "c:\\path".to_string(),
        ]),
        correct_answer: Some("beta's".to_string()),
        explanation: Some("Quotes, colons: and brackets [x] survive escaping".to_string()),
        jlpt_level: Some(4),
        quiz_type: Some(QuizType::KanjiReading),
    }
    .validate()
    .unwrap()
}

fn service(ffmpeg: PathBuf, assets: TemplateAssets, scratch: &Path) -> RenderService {
    let renderer = FfmpegRenderer::new(AssetLoader::preloaded(assets))
        .with_runner(FfmpegRunner::new().with_binary(ffmpeg))
        .with_encoding(EncodingConfig::default().with_preset("ultrafast"));
    RenderService::new(Arc::new(renderer), ScratchDir::new(scratch))
}

fn scratch_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_render_video_and_thumbnail_with_plain_assets() {
    let Some((ffmpeg, regular, bold)) = toolchain() else {
        return;
    };
    let dir = TempDir::new().unwrap();
    let scratch = dir.path().join("renders");

    let assets = TemplateAssets {
        font_regular: regular,
        font_bold: bold,
        background_music: None,
        tick_sound: None,
        background_image: None,
        account_handle: "@qreel.test".to_string(),
    };
    let service = service(ffmpeg, assets, &scratch);

    let video = service.render_video(&question()).await.unwrap();
    let bytes = std::fs::read(video.path()).unwrap();
    assert!(bytes.len() > 1024);
    assert_eq!(&bytes[4..8], b"ftyp");

    let thumbnail = service.render_thumbnail(&question()).await.unwrap();
    let bytes = std::fs::read(thumbnail.path()).unwrap();
    assert!(bytes.starts_with(b"\x89PNG\r\n\x1a\n"));

    drop(video);
    drop(thumbnail);
    assert_eq!(scratch_files(&scratch), 0);
}

#[tokio::test]
async fn test_render_video_with_background_music_and_ticks() {
    let Some((ffmpeg, regular, bold)) = toolchain() else {
        return;
    };
    let dir = TempDir::new().unwrap();
    let music = dir.path().join("music.wav");
    let tick = dir.path().join("tick.wav");
    let background = dir.path().join("background.png");

    generate(&ffmpeg, "sine=frequency=220:duration=4", &[], &music).await;
    generate(&ffmpeg, "sine=frequency=1000:duration=0.3", &[], &tick).await;
    generate(
        &ffmpeg,
        "color=c=0x336699:s=640x480",
        &["-frames:v", "1"],
        &background,
    )
    .await;

    let assets = TemplateAssets {
        font_regular: regular,
        font_bold: bold,
        background_music: Some(music),
        tick_sound: Some(tick),
        background_image: Some(background),
        account_handle: "@qreel.test".to_string(),
    };
    let scratch = dir.path().join("renders");
    let service = service(ffmpeg, assets, &scratch);

    let video = service.render_video(&question()).await.unwrap();
    let bytes = std::fs::read(video.path()).unwrap();
    assert!(bytes.len() > 1024);
    assert_eq!(&bytes[4..8], b"ftyp");

    let thumbnail = service.render_thumbnail(&question()).await.unwrap();
    let bytes = std::fs::read(thumbnail.path()).unwrap();
    assert!(bytes.starts_with(b"\x89PNG"));

    drop(video);
    drop(thumbnail);
    assert_eq!(scratch_files(&scratch), 0);
}
