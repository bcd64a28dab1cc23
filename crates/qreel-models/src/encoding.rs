//! Output encoding for rendered quiz videos.
//!
//! Videos are always H.264 + AAC in an mp4 container with the moov atom up
//! front, so clients can start playback before the download finishes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Highest CRF libx264 accepts.
pub const MAX_CRF: u8 = 51;

/// x264 presets, fastest first.
pub const PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

/// H.264/AAC settings passed to the encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EncodingConfig {
    pub preset: String,
    /// Constant Rate Factor (0-51, lower is better)
    pub crf: u8,
    pub pixel_format: String,
    pub audio_bitrate: String,
    pub audio_sample_rate: u32,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            preset: "veryfast".to_string(),
            crf: 20,
            pixel_format: "yuv420p".to_string(),
            audio_bitrate: "128k".to_string(),
            audio_sample_rate: 44_100,
        }
    }
}

impl EncodingConfig {
    /// Set the CRF, clamped to the encoder's range.
    pub fn with_crf(mut self, crf: u8) -> Self {
        self.crf = crf.min(MAX_CRF);
        self
    }

    /// Set the preset. Unknown names are ignored.
    pub fn with_preset(mut self, preset: &str) -> Self {
        let preset = preset.trim().to_lowercase();
        if PRESETS.contains(&preset.as_str()) {
            self.preset = preset;
        }
        self
    }

    /// Output arguments for the video and audio encoders.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        [
            "-c:v",
            "libx264",
            "-preset",
            self.preset.as_str(),
            "-crf",
            self.crf.to_string().as_str(),
            "-pix_fmt",
            self.pixel_format.as_str(),
            "-c:a",
            "aac",
            "-b:a",
            self.audio_bitrate.as_str(),
            "-ar",
            self.audio_sample_rate.to_string().as_str(),
            "-movflags",
            "+faststart",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }
}
