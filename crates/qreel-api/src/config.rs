//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

use qreel_media::DEFAULT_SWEEP_MAX_AGE;
use qreel_models::render::{DEFAULT_THUMBNAIL_TIMEOUT, DEFAULT_VIDEO_TIMEOUT};
use qreel_models::template::DEFAULT_ACCOUNT_HANDLE;
use qreel_models::{EncodingConfig, Environment, RenderKind};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Scratch directory override
    pub scratch_dir: Option<PathBuf>,
    /// Template assets directory
    pub assets_dir: PathBuf,
    /// Handle shown on the outro
    pub account_handle: String,
    /// Deadline for a video render
    pub render_timeout: Duration,
    /// Deadline for a thumbnail render
    pub thumbnail_timeout: Duration,
    /// Interval between scratch sweeps
    pub sweep_interval: Duration,
    /// Age after which a scratch file is swept
    pub sweep_max_age: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
    /// Video encoder settings
    pub encoding: EncodingConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::Development,
            scratch_dir: None,
            assets_dir: PathBuf::from("assets"),
            account_handle: DEFAULT_ACCOUNT_HANDLE.to_string(),
            render_timeout: DEFAULT_VIDEO_TIMEOUT,
            thumbnail_timeout: DEFAULT_THUMBNAIL_TIMEOUT,
            sweep_interval: Duration::from_secs(600),
            sweep_max_age: DEFAULT_SWEEP_MAX_AGE,
            max_body_size: 10 * 1024 * 1024, // 10MB
            cors_origins: vec!["*".to_string()],
            metrics_enabled: true,
            encoding: EncodingConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str| var(key).and_then(|s| s.trim().parse::<u64>().ok());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("NODE_ENV"))
            .map(|s| Environment::parse(&s))
            .unwrap_or_default();

        let mut encoding = defaults.encoding.clone();
        if let Some(crf) = var("RENDER_CRF").and_then(|s| s.trim().parse().ok()) {
            encoding = encoding.with_crf(crf);
        }
        if let Some(preset) = var("RENDER_PRESET") {
            encoding = encoding.with_preset(&preset);
        }

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: var("PORT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.port),
            environment,
            scratch_dir: var("SCRATCH_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            assets_dir: var("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.assets_dir),
            account_handle: var("ACCOUNT_HANDLE")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.account_handle),
            render_timeout: parsed("RENDER_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.render_timeout),
            thumbnail_timeout: parsed("THUMBNAIL_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.thumbnail_timeout),
            sweep_interval: parsed("SWEEP_INTERVAL_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_interval),
            sweep_max_age: parsed("SWEEP_MAX_AGE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.sweep_max_age),
            max_body_size: var("MAX_BODY_SIZE")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.max_body_size),
            cors_origins: var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            metrics_enabled: var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
            encoding,
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }

    /// Render deadline for a kind.
    pub fn timeout_for(&self, kind: RenderKind) -> Duration {
        match kind {
            RenderKind::Video => self.render_timeout,
            RenderKind::Thumbnail => self.thumbnail_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ApiConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.timeout_for(RenderKind::Video), Duration::from_millis(60_000));
        assert_eq!(config.timeout_for(RenderKind::Thumbnail), Duration::from_millis(30_000));
        assert_eq!(config.sweep_interval, Duration::from_secs(600));
        assert_eq!(config.max_body_size, 10 * 1024 * 1024);
        assert!(config.scratch_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "3000"),
            ("NODE_ENV", "production"),
            ("SCRATCH_DIR", "/var/qreel"),
            ("RENDER_TIMEOUT_MS", "1500"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("METRICS_ENABLED", "false"),
            ("RENDER_CRF", "26"),
            ("RENDER_PRESET", "fast"),
        ]);
        assert_eq!(config.port, 3000);
        assert!(config.is_production());
        assert_eq!(config.scratch_dir, Some(PathBuf::from("/var/qreel")));
        assert_eq!(config.render_timeout, Duration::from_millis(1500));
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert!(!config.metrics_enabled);
        assert_eq!(config.encoding.crf, 26);
        assert_eq!(config.encoding.preset, "fast");
    }

    #[test]
    fn test_environment_precedence() {
        let config = config(&[("ENVIRONMENT", "development"), ("NODE_ENV", "production")]);
        assert!(!config.is_production());
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config(&[("PORT", "http"), ("THUMBNAIL_TIMEOUT_MS", "-1")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.thumbnail_timeout, Duration::from_millis(30_000));
    }
}
