//! The quiz video composition.
//!
//! A [`QuizComposition`] is the declarative timeline for one question: a list
//! of timed text and box layers over a background, plus countdown tick cues
//! over looped background music. It compiles to a single FFmpeg filter graph,
//! either for the full 23 second video or for one still frame.

use std::path::Path;
use std::sync::Arc;

use qreel_models::template::{
    account_start, colors, answer_start, question_start, ANSWER_PREFIX,
    BACKGROUND_MUSIC_VOLUME, COMPOSITION_ID, COUNTDOWN_WARNING_SECS, EXPLANATION_TITLE, FPS,
    HEIGHT, INTRO_TITLE, OPTION_LABELS, OUTRO_MESSAGE, QUESTION_DURATION, SAFE_ZONE_LEFT,
    SAFE_ZONE_TOP, TICK_DURATION_SECS, TICK_VOLUME, TOTAL_DURATION, TOTAL_FRAMES, WIDTH,
};
use qreel_models::{EncodingConfig, QuizQuestion};

use crate::assets::TemplateAssets;
use crate::command::FfmpegCommand;
use crate::escape::filter_value;

/// Font weight of a text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// Horizontal placement of a text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Center,
    Left(u32),
}

/// Timed text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub text: String,
    pub weight: Weight,
    pub size: u32,
    pub color: &'static str,
    pub anchor: Anchor,
    /// Vertical center in pixels
    pub y: u32,
    pub start: f64,
    pub end: f64,
    /// Background box color and padding
    pub plate: Option<(&'static str, u32)>,
}

/// Timed filled rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxLayer {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub color: &'static str,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Text(TextLayer),
    Box(BoxLayer),
}

impl Layer {
    fn window(&self) -> (f64, f64) {
        match self {
            Layer::Text(t) => (t.start, t.end),
            Layer::Box(b) => (b.start, b.end),
        }
    }

    /// Whether the layer is visible at time `t` (seconds). Windows are half-open.
    pub fn is_active_at(&self, t: f64) -> bool {
        let (start, end) = self.window();
        t >= start && t < end
    }

    pub fn text(&self) -> Option<&TextLayer> {
        match self {
            Layer::Text(t) => Some(t),
            Layer::Box(_) => None,
        }
    }
}

/// A short audio cue placed on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioCue {
    pub start: f64,
    pub duration: f64,
    pub volume: f32,
}

/// Timeline for one quiz question.
#[derive(Debug, Clone)]
pub struct QuizComposition {
    layers: Vec<Layer>,
    ticks: Vec<AudioCue>,
    assets: Arc<TemplateAssets>,
}

impl QuizComposition {
    /// Bind the quiz template to a question.
    pub fn build(question: &QuizQuestion, assets: Arc<TemplateAssets>) -> Self {
        let backdrop = assets.background_image.is_some();
        let mut layers = Vec::new();

        intro_layers(&mut layers, question, backdrop);
        question_layers(&mut layers, question, backdrop);
        answer_layers(&mut layers, question, backdrop);
        account_layers(&mut layers, &assets.account_handle, backdrop);

        let ticks = (0..QUESTION_DURATION)
            .map(|i| AudioCue {
                start: f64::from(question_start() + i),
                duration: f64::from(TICK_DURATION_SECS),
                volume: TICK_VOLUME,
            })
            .collect();

        Self {
            layers,
            ticks,
            assets,
        }
    }

    pub fn id(&self) -> &'static str {
        COMPOSITION_ID
    }

    pub fn duration_secs(&self) -> f64 {
        f64::from(TOTAL_DURATION)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn ticks(&self) -> &[AudioCue] {
        &self.ticks
    }

    /// Layers visible at time `t`.
    pub fn layers_at(&self, t: f64) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(move |l| l.is_active_at(t))
    }

    /// Command rendering the full composition as H.264/AAC mp4.
    pub fn video_command(&self, output: &Path, encoding: &EncodingConfig) -> FfmpegCommand {
        let cmd = self.background_input(FfmpegCommand::new(output));

        let music_index = cmd.input_count();
        let cmd = match &self.assets.background_music {
            Some(music) => cmd.input_with(["-stream_loop", "-1"], music.to_string_lossy()),
            None => cmd.lavfi("anullsrc=r=44100:cl=stereo"),
        };

        let tick_index = cmd.input_count();
        let cmd = match &self.assets.tick_sound {
            Some(tick) => cmd.input(tick),
            None => cmd,
        };

        let mut graph = self.video_chain();
        graph.push(';');
        graph.push_str(&self.audio_graph(
            music_index,
            self.assets.tick_sound.as_ref().map(|_| tick_index),
        ));

        cmd.filter_complex(graph)
            .map("[vout]")
            .map("[aout]")
            .output_args(encoding.to_ffmpeg_args())
            .frame_rate(FPS)
            .duration(self.duration_secs())
    }

    /// Command rendering a single frame as PNG. Frames past the end clamp to the last one.
    pub fn still_command(&self, frame: u32, output: &Path) -> FfmpegCommand {
        let frame = frame.min(TOTAL_FRAMES - 1);
        let cmd = self
            .background_input(FfmpegCommand::new(output))
            .filter_complex(self.video_chain())
            .map("[vout]");

        let cmd = if frame > 0 {
            cmd.output_arg("-ss")
                .output_arg(format!("{:.3}", f64::from(frame) / f64::from(FPS)))
        } else {
            cmd
        };

        cmd.single_frame().output_args(["-f", "image2", "-c:v", "png"])
    }

    fn background_input(&self, cmd: FfmpegCommand) -> FfmpegCommand {
        match &self.assets.background_image {
            Some(image) => cmd.input_with(
                ["-loop".to_string(), "1".to_string(), "-framerate".to_string(), FPS.to_string()],
                image.to_string_lossy(),
            ),
            None => cmd.lavfi(format!(
                "color=c={}:s={}x{}:r={}:d={}",
                colors::BACKGROUND,
                WIDTH,
                HEIGHT,
                FPS,
                TOTAL_DURATION
            )),
        }
    }

    /// `[0:v]...[vout]`: background normalization followed by every layer.
    fn video_chain(&self) -> String {
        let mut filters = Vec::with_capacity(self.layers.len() + 3);

        if self.assets.background_image.is_some() {
            filters.push(format!(
                "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
                w = WIDTH,
                h = HEIGHT
            ));
        }
        filters.push("setsar=1".to_string());

        for layer in &self.layers {
            filters.push(match layer {
                Layer::Text(text) => self.drawtext(text),
                Layer::Box(rect) => drawbox(rect),
            });
        }

        format!("[0:v]{}[vout]", filters.join(","))
    }

    fn drawtext(&self, layer: &TextLayer) -> String {
        let font = match layer.weight {
            Weight::Regular => &self.assets.font_regular,
            Weight::Bold => &self.assets.font_bold,
        };
        let x = match layer.anchor {
            Anchor::Center => "(w-text_w)/2".to_string(),
            Anchor::Left(px) => px.to_string(),
        };

        let mut filter = format!(
            "drawtext=fontfile={}:text={}:expansion=none:fontsize={}:fontcolor={}:x={}:y={}:enable={}",
            filter_value(&font.to_string_lossy()),
            filter_value(&layer.text),
            layer.size,
            layer.color,
            filter_value(&x),
            filter_value(&format!("{}-text_h/2", layer.y)),
            enable_expr(layer.start, layer.end),
        );

        if let Some((color, padding)) = layer.plate {
            filter.push_str(&format!(":box=1:boxcolor={}:boxborderw={}", color, padding));
        }

        filter
    }

    fn audio_graph(&self, music_index: usize, tick_index: Option<usize>) -> String {
        let duration = self.duration_secs();
        let bed = format!(
            "[{}:a]volume={:.2},atrim=0:{:.3},asetpts=PTS-STARTPTS",
            music_index, BACKGROUND_MUSIC_VOLUME, duration
        );

        let Some(tick_index) = tick_index.filter(|_| !self.ticks.is_empty()) else {
            return format!("{}[aout]", bed);
        };

        let n = self.ticks.len();
        let mut parts = vec![format!("{}[bed]", bed)];

        let split_labels: String = (0..n).map(|i| format!("[k{}]", i)).collect();
        parts.push(format!("[{}:a]asplit={}{}", tick_index, n, split_labels));

        for (i, cue) in self.ticks.iter().enumerate() {
            let delay_ms = (cue.start * 1000.0).round() as u64;
            parts.push(format!(
                "[k{i}]atrim=0:{:.3},asetpts=PTS-STARTPTS,volume={:.2},adelay={}:all=1[t{i}]",
                cue.duration,
                cue.volume,
                delay_ms,
                i = i
            ));
        }

        let mix_inputs: String = std::iter::once("[bed]".to_string())
            .chain((0..n).map(|i| format!("[t{}]", i)))
            .collect();
        parts.push(format!(
            "{}amix=inputs={}:duration=first:dropout_transition=0:normalize=0[aout]",
            mix_inputs,
            n + 1
        ));

        parts.join(";")
    }
}

fn drawbox(rect: &BoxLayer) -> String {
    format!(
        "drawbox=x={}:y={}:w={}:h={}:color={}:t=fill:enable={}",
        rect.x,
        rect.y,
        rect.w,
        rect.h,
        rect.color,
        enable_expr(rect.start, rect.end)
    )
}

fn enable_expr(start: f64, end: f64) -> String {
    filter_value(&format!("gte(t,{:.3})*lt(t,{:.3})", start, end))
}

fn text(
    text: impl Into<String>,
    weight: Weight,
    size: u32,
    color: &'static str,
    y: u32,
    window: (u32, u32),
) -> TextLayer {
    TextLayer {
        text: text.into(),
        weight,
        size,
        color,
        anchor: Anchor::Center,
        y,
        start: f64::from(window.0),
        end: f64::from(window.1),
        plate: None,
    }
}

fn shade(layers: &mut Vec<Layer>, color: &'static str, window: (u32, u32)) {
    layers.push(Layer::Box(BoxLayer {
        x: 0,
        y: 0,
        w: WIDTH,
        h: HEIGHT,
        color,
        start: f64::from(window.0),
        end: f64::from(window.1),
    }));
}

fn intro_layers(layers: &mut Vec<Layer>, question: &QuizQuestion, backdrop: bool) {
    let window = (0, question_start());
    if backdrop {
        shade(layers, "black@0.5", window);
    }

    layers.push(Layer::Text(text(INTRO_TITLE, Weight::Bold, 80, colors::TEXT, 640, window)));
    layers.push(Layer::Text(text(
        question.question.clone(),
        Weight::Bold,
        question.question_font_size(),
        colors::MUTED,
        860,
        window,
    )));

    let mut badge_y = 1060;
    if let Some(level) = question.jlpt_level {
        layers.push(Layer::Text(text(
            format!("JLPT N{}", level),
            Weight::Bold,
            72,
            colors::CORRECT,
            badge_y,
            window,
        )));
        badge_y += 120;
    }

    let mut badge = text(
        question.quiz_type.display_name(),
        Weight::Bold,
        36,
        colors::TEXT,
        badge_y,
        window,
    );
    badge.plate = Some((colors::PRIMARY, 18));
    layers.push(Layer::Text(badge));
}

fn question_header(
    layers: &mut Vec<Layer>,
    question: &QuizQuestion,
    window: (u32, u32),
) {
    layers.push(Layer::Text(text(
        question.quiz_type.prompt(),
        Weight::Regular,
        50,
        colors::GRAY_LIGHT,
        SAFE_ZONE_TOP + 60,
        window,
    )));
    layers.push(Layer::Text(text(
        format!("「 {} 」", question.question),
        Weight::Bold,
        question.question_font_size(),
        colors::TEXT,
        SAFE_ZONE_TOP + 230,
        window,
    )));
}

fn question_layers(layers: &mut Vec<Layer>, question: &QuizQuestion, backdrop: bool) {
    let window = (question_start(), answer_start());
    if backdrop {
        shade(layers, "black@0.1", window);
    }

    question_header(layers, question, window);

    for (i, option) in question.options.iter().enumerate() {
        let mut row = text(
            format!("{} {}", OPTION_LABELS[i], option),
            Weight::Regular,
            64,
            colors::TEXT,
            720 + i as u32 * 150,
            window,
        );
        row.anchor = Anchor::Left(SAFE_ZONE_LEFT + 60);
        row.plate = Some(("black@0.4", 24));
        layers.push(Layer::Text(row));
    }

    // One layer per countdown second
    for elapsed in 0..QUESTION_DURATION {
        let remaining = QUESTION_DURATION - elapsed;
        let color = if remaining <= COUNTDOWN_WARNING_SECS {
            colors::WRONG
        } else {
            colors::TEXT
        };
        let second = question_start() + elapsed;
        layers.push(Layer::Text(text(
            remaining.to_string(),
            Weight::Bold,
            144,
            color,
            1380,
            (second, second + 1),
        )));
    }
}

fn answer_layers(layers: &mut Vec<Layer>, question: &QuizQuestion, backdrop: bool) {
    let window = (answer_start(), account_start());
    if backdrop {
        shade(layers, "black@0.1", window);
    }

    question_header(layers, question, window);

    layers.push(Layer::Text(text(
        format!("{} {} {}", ANSWER_PREFIX, question.correct_label(), question.correct_answer),
        Weight::Bold,
        100,
        colors::CORRECT,
        680,
        window,
    )));

    let lines = question.explanation_lines();
    if lines.is_empty() {
        return;
    }

    layers.push(Layer::Box(BoxLayer {
        x: SAFE_ZONE_LEFT,
        y: 800,
        w: WIDTH - 2 * SAFE_ZONE_LEFT,
        h: 160 + lines.len() as u32 * 100,
        color: "black@0.5",
        start: f64::from(window.0),
        end: f64::from(window.1),
    }));
    layers.push(Layer::Text(text(
        EXPLANATION_TITLE,
        Weight::Bold,
        60,
        colors::PRIMARY,
        880,
        window,
    )));
    for (i, line) in lines.into_iter().enumerate() {
        layers.push(Layer::Text(text(
            line,
            Weight::Regular,
            60,
            colors::TEXT,
            990 + i as u32 * 100,
            window,
        )));
    }
}

fn account_layers(layers: &mut Vec<Layer>, handle: &str, backdrop: bool) {
    let window = (account_start(), TOTAL_DURATION);
    if backdrop {
        shade(layers, "black@0.5", window);
    }

    layers.push(Layer::Text(text(OUTRO_MESSAGE, Weight::Bold, 56, colors::TEXT, 900, window)));
    layers.push(Layer::Text(text(handle, Weight::Bold, 64, colors::PRIMARY, 1000, window)));
}
