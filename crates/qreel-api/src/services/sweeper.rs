//! Background sweep of stale scratch files.
//!
//! Render requests remove their own files, so the sweep only catches outputs
//! orphaned by a crash or a killed process. It runs once at startup and then
//! on a fixed interval. Production hosts reclaim their scratch storage on
//! their own, so the sweeper is disabled there.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use qreel_media::{ScratchDir, SweepReport};

use crate::config::ApiConfig;
use crate::metrics;

/// Scratch sweeper service.
#[derive(Debug, Clone)]
pub struct ScratchSweeper {
    scratch: ScratchDir,
    interval: Duration,
    max_age: Duration,
    enabled: bool,
}

impl ScratchSweeper {
    pub fn new(scratch: ScratchDir, interval: Duration, max_age: Duration) -> Self {
        Self {
            scratch,
            interval,
            max_age,
            enabled: true,
        }
    }

    /// Sweeper configured from the API config; disabled in production.
    pub fn from_config(scratch: ScratchDir, config: &ApiConfig) -> Self {
        Self::new(scratch, config.sweep_interval, config.sweep_max_age)
            .enabled(!config.is_production())
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start the background sweep loop.
    ///
    /// This function runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        if !self.enabled {
            info!("Scratch sweeper is disabled");
            return;
        }

        info!(
            dir = %self.scratch.root().display(),
            "Starting scratch sweeper (interval: {:?}, max age: {:?})",
            self.interval,
            self.max_age
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // First tick completes immediately
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    /// Run a single sweep.
    pub async fn sweep_once(&self) -> SweepReport {
        let report = self.scratch.sweep_stale(self.max_age).await;
        metrics::record_sweep(&report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sweep_once_removes_stale_files() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("quiz-1-00.mp4");
        std::fs::write(&stale, b"orphan").unwrap();
        std::fs::OpenOptions::new()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(7200))
            .unwrap();

        let sweeper = ScratchSweeper::new(
            ScratchDir::new(dir.path()),
            Duration::from_secs(600),
            Duration::from_secs(3600),
        );
        let report = sweeper.sweep_once().await;
        assert_eq!(report.removed, 1);
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn test_disabled_in_production() {
        let config = ApiConfig {
            environment: qreel_models::Environment::Production,
            ..Default::default()
        };
        let sweeper = ScratchSweeper::from_config(ScratchDir::new("/nonexistent"), &config);
        assert!(!sweeper.is_enabled());
        // Returns immediately
        sweeper.run().await;
    }
}
