//! Quiz video template constants.
//!
//! The template is a fixed 23 second vertical timeline:
//! intro (0-3s), question with countdown (3-13s), answer (13-18s),
//! account outro (18-23s).

/// Composition identifier of the quiz template.
pub const COMPOSITION_ID: &str = "QuizVideo";

/// Frame rate
pub const FPS: u32 = 30;
/// Output width (portrait)
pub const WIDTH: u32 = 1080;
/// Output height (portrait)
pub const HEIGHT: u32 = 1920;

/// Segment durations in seconds
pub const INTRO_DURATION: u32 = 3;
pub const QUESTION_DURATION: u32 = 10;
pub const ANSWER_DURATION: u32 = 5;
pub const ACCOUNT_DURATION: u32 = 5;
pub const TOTAL_DURATION: u32 =
    INTRO_DURATION + QUESTION_DURATION + ANSWER_DURATION + ACCOUNT_DURATION;

/// Total frame count of the composition.
pub const TOTAL_FRAMES: u32 = TOTAL_DURATION * FPS;

/// Countdown turns red at or below this many seconds.
pub const COUNTDOWN_WARNING_SECS: u32 = 3;

/// Audio mix
pub const BACKGROUND_MUSIC_VOLUME: f32 = 0.3;
pub const TICK_VOLUME: f32 = 0.5;
pub const TICK_DURATION_SECS: f32 = 0.2;

/// Safe zone margins (short-form platform UI overlays)
pub const SAFE_ZONE_TOP: u32 = 250;
pub const SAFE_ZONE_LEFT: u32 = 40;

/// Explanation wrapping
pub const EXPLANATION_LINE_CHARS: usize = 25;
pub const EXPLANATION_MAX_LINES: usize = 4;

pub const OPTION_LABELS: [&str; 4] = ["①", "②", "③", "④"];

/// Copy
pub const INTRO_TITLE: &str = "일본어 퀴즈";
pub const ANSWER_PREFIX: &str = "정답 :";
pub const EXPLANATION_TITLE: &str = "해설";
pub const OUTRO_MESSAGE: &str = "팔로우하고 더 많은 퀴즈를 풀어보세요!";
pub const DEFAULT_ACCOUNT_HANDLE: &str = "@jlpt.everyday";

/// Template colors (FFmpeg `0xRRGGBB` notation).
pub mod colors {
    pub const BACKGROUND: &str = "0x0f172a";
    pub const PRIMARY: &str = "0xc11236";
    pub const TEXT: &str = "0xffffff";
    pub const CORRECT: &str = "0x4ade80";
    pub const WRONG: &str = "0xff1a1a";
    pub const GRAY_LIGHT: &str = "0xaaaaaa";
    pub const MUTED: &str = "0xcccccc";
}

/// Start second of each segment.
pub const fn question_start() -> u32 {
    INTRO_DURATION
}

pub const fn answer_start() -> u32 {
    INTRO_DURATION + QUESTION_DURATION
}

pub const fn account_start() -> u32 {
    INTRO_DURATION + QUESTION_DURATION + ANSWER_DURATION
}
