//! Scratch directory for transient render outputs.
//!
//! Every render job owns exactly one [`ScratchFile`]. The file is removed by
//! whichever cleanup trigger fires first (stream end, stream error, drop);
//! later triggers are no-ops. Removal is best-effort: a missing file counts as
//! clean and any other failure is logged, never returned.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rand::RngCore;
use tokio::fs;
use tracing::{debug, error, info, warn};

use qreel_models::{Environment, RenderKind};

use crate::error::MediaResult;

/// Scratch directory used on hosted/production machines.
pub const PRODUCTION_SCRATCH_DIR: &str = "/tmp/qreel-renders";
/// Scratch directory used in local development, relative to the working dir.
pub const LOCAL_SCRATCH_DIR: &str = "tmp/qreel-renders";
/// Default age after which [`ScratchDir::sweep_stale`] deletes a file.
pub const DEFAULT_SWEEP_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Location for transient render outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Use an explicit directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Pick the scratch directory for an environment.
    ///
    /// `override_dir` wins when set.
    pub fn resolve(environment: Environment, override_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = override_dir {
            return Self::new(dir);
        }
        match environment {
            Environment::Production => Self::new(PRODUCTION_SCRATCH_DIR),
            Environment::Development => Self::new(
                std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(LOCAL_SCRATCH_DIR),
            ),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory (and parents) if missing. Idempotent.
    pub async fn ensure(&self) -> MediaResult<PathBuf> {
        fs::create_dir_all(&self.root).await?;
        Ok(self.root.clone())
    }

    /// Fresh path for a render output: `<prefix>-<epoch_ms>-<16 hex>.<ext>`.
    pub fn new_path(&self, kind: RenderKind) -> PathBuf {
        let mut suffix = [0u8; 8];
        rand::rng().fill_bytes(&mut suffix);
        let suffix: String = suffix.iter().map(|b| format!("{:02x}", b)).collect();

        self.root.join(format!(
            "{}-{}-{}.{}",
            kind.scratch_prefix(),
            chrono::Utc::now().timestamp_millis(),
            suffix,
            kind.extension()
        ))
    }

    pub fn new_video_path(&self) -> PathBuf {
        self.new_path(RenderKind::Video)
    }

    pub fn new_image_path(&self) -> PathBuf {
        self.new_path(RenderKind::Thumbnail)
    }

    /// Allocate a guarded scratch file for a render job.
    pub fn allocate(&self, kind: RenderKind) -> ScratchFile {
        ScratchFile::new(self.new_path(kind))
    }

    /// Best-effort delete of a path.
    pub async fn remove(&self, path: &Path) {
        log_removal(path, fs::remove_file(path).await);
    }

    /// Delete files older than `max_age`.
    ///
    /// A missing directory is a no-op. Failures on individual entries are
    /// logged and counted; they never abort the sweep.
    pub async fn sweep_stale(&self, max_age: Duration) -> SweepReport {
        let mut report = SweepReport::default();

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return report,
            Err(e) => {
                error!(dir = %self.root.display(), "Failed to read scratch directory: {}", e);
                report.failed += 1;
                return report;
            }
        };

        let now = SystemTime::now();

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    error!(dir = %self.root.display(), "Failed to list scratch directory: {}", e);
                    report.failed += 1;
                    break;
                }
            };

            let path = entry.path();
            report.scanned += 1;

            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => {
                    warn!(path = %path.display(), "Failed to stat scratch file: {}", e);
                    report.failed += 1;
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }

            let age = metadata
                .modified()
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok())
                .unwrap_or_default();

            if age <= max_age {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    report.removed += 1;
                    info!(path = %path.display(), age_secs = age.as_secs(), "Removed stale scratch file");
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), "Failed to remove stale scratch file: {}", e);
                    report.failed += 1;
                }
            }
        }

        if report.removed > 0 {
            info!(
                removed = report.removed,
                scanned = report.scanned,
                "Scratch sweep completed"
            );
        }

        report
    }
}

/// Outcome of a stale sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
    pub failed: usize,
}

/// A render output path owned by one job.
///
/// Released at most once: explicitly via [`ScratchFile::release`] or
/// implicitly on drop.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    released: bool,
}

impl ScratchFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            released: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Delete the file. Returns `false` if it was already released.
    ///
    /// The unlink is synchronous, so the file is gone when this returns. It
    /// is called from `Drop` and `poll_next`, where nothing can be awaited;
    /// a single unlink does not block the worker for any meaningful time.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        log_removal(&self.path, std::fs::remove_file(&self.path));
        true
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        self.release();
    }
}

fn log_removal(path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => debug!(path = %path.display(), "Cleaned up scratch file"),
        // Already gone, or never created
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => error!(path = %path.display(), "Failed to clean up scratch file: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn set_age(path: &Path, age: Duration) {
        let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_resolve() {
        let prod = ScratchDir::resolve(Environment::Production, None);
        assert_eq!(prod.root(), Path::new(PRODUCTION_SCRATCH_DIR));

        let dev = ScratchDir::resolve(Environment::Development, None);
        assert!(dev.root().ends_with(LOCAL_SCRATCH_DIR));

        let custom = ScratchDir::resolve(Environment::Production, Some(PathBuf::from("/data/x")));
        assert_eq!(custom.root(), Path::new("/data/x"));
    }

    #[test]
    fn test_path_format() {
        let scratch = ScratchDir::new("/tmp/scratch");
        let video = scratch.new_video_path();
        let name = video.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("quiz-"));
        assert!(name.ends_with(".mp4"));

        let parts: Vec<&str> = name.trim_end_matches(".mp4").split('-').collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 16);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));

        let image = scratch.new_image_path();
        let name = image.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("quiz-thumbnail-"));
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_paths_are_unique() {
        let scratch = ScratchDir::new("/tmp/scratch");
        let paths: std::collections::HashSet<_> =
            (0..1000).map(|_| scratch.new_video_path()).collect();
        assert_eq!(paths.len(), 1000);
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchDir::new(dir.path().join("a").join("b"));

        let (first, second) = tokio::join!(scratch.ensure(), scratch.ensure());
        assert!(first.is_ok() && second.is_ok());
        assert!(scratch.root().is_dir());
    }

    #[tokio::test]
    async fn test_remove_missing_is_quiet() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchDir::new(dir.path());
        let path = dir.path().join("nothing.mp4");

        scratch.remove(&path).await;
        scratch.remove(&path).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_scratch_file_releases_once() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchDir::new(dir.path());
        let mut file = scratch.allocate(RenderKind::Video);
        fs::write(file.path(), b"frames").await.unwrap();

        assert!(file.release());
        assert!(!file.path().exists());
        assert!(!file.release());
        assert!(file.is_released());
    }

    #[tokio::test]
    async fn test_scratch_file_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchDir::new(dir.path());
        let file = scratch.allocate(RenderKind::Thumbnail);
        let path = file.path().to_path_buf();
        fs::write(&path, b"png").await.unwrap();

        drop(file);
        assert!(!path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_release_on_worker_thread_is_immediate() {
        let dir = TempDir::new().unwrap();
        let file = ScratchDir::new(dir.path()).allocate(RenderKind::Video);
        let path = file.path().to_path_buf();
        fs::write(&path, b"mp4").await.unwrap();

        let released = tokio::spawn(async move {
            let mut file = file;
            let first = file.release();
            (first, file.path().exists())
        })
        .await
        .unwrap();

        assert_eq!(released, (true, false));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_sweep_threshold() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchDir::new(dir.path());

        let old = dir.path().join("old.mp4");
        let fresh = dir.path().join("fresh.mp4");
        std::fs::write(&old, b"old").unwrap();
        std::fs::write(&fresh, b"fresh").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        set_age(&old, Duration::from_secs(2 * 60 * 60));
        set_age(&fresh, Duration::from_secs(30 * 60));

        let report = scratch.sweep_stale(DEFAULT_SWEEP_MAX_AGE).await;
        assert_eq!(report.removed, 1);
        assert_eq!(report.failed, 0);
        assert!(!old.exists());
        assert!(fresh.exists());
        assert!(dir.path().join("nested").is_dir());
    }

    #[tokio::test]
    async fn test_sweep_missing_directory() {
        let dir = TempDir::new().unwrap();
        let scratch = ScratchDir::new(dir.path().join("never-created"));
        assert_eq!(scratch.sweep_stale(DEFAULT_SWEEP_MAX_AGE).await, SweepReport::default());
    }
}
