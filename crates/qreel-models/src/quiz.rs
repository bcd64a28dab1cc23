//! Quiz question models.
//!
//! Incoming request bodies are parsed leniently into [`QuizRequest`] so that a
//! missing field can be reported with a precise message. [`QuizRequest::validate`]
//! turns a request into a [`QuizQuestion`], which is the only type the render
//! pipeline accepts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::template::{EXPLANATION_LINE_CHARS, EXPLANATION_MAX_LINES, OPTION_LABELS};

/// Number of answer options every question carries.
pub const OPTION_COUNT: usize = 4;

/// Quiz type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuizType {
    /// Japanese word -> Korean meaning
    JpToKr,
    /// Korean meaning -> Japanese word
    KrToJp,
    /// Kanji reading
    KanjiReading,
    /// Fill in the blank
    FillBlank,
    /// Missing or unrecognized type; shown with generic labels
    #[default]
    #[serde(other)]
    Unspecified,
}

impl QuizType {
    /// Short label shown on the intro badge.
    pub fn display_name(&self) -> &'static str {
        match self {
            QuizType::JpToKr => "단어의 뜻",
            QuizType::KrToJp => "뜻의 단어",
            QuizType::KanjiReading => "한자읽기",
            QuizType::FillBlank => "빈칸채우기",
            QuizType::Unspecified => "퀴즈",
        }
    }

    /// Prompt shown above the question text.
    pub fn prompt(&self) -> &'static str {
        match self {
            QuizType::JpToKr => "다음 단어의 뜻을 고르시요.",
            QuizType::KrToJp => "다음을 뜻하는 단어를 고르시오.",
            QuizType::KanjiReading => "다음 한자의 읽기는?",
            QuizType::FillBlank => "빈칸에 들어갈 단어는?",
            QuizType::Unspecified => "정답을 고르세요",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuizType::JpToKr => "jp_to_kr",
            QuizType::KrToJp => "kr_to_jp",
            QuizType::KanjiReading => "kanji_reading",
            QuizType::FillBlank => "fill_blank",
            QuizType::Unspecified => "unspecified",
        }
    }
}

impl std::fmt::Display for QuizType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reasons a quiz request is rejected before any render is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizValidationError {
    #[error("Missing required fields: question, options, correct_answer")]
    MissingFields,

    #[error("options must be an array with exactly 4 elements")]
    OptionCount(usize),

    #[error("jlpt_level must be between 1 and 5")]
    JlptLevel(u8),

    #[error("correct_answer must be one of the options")]
    AnswerNotInOptions,
}

/// Raw quiz payload as received over HTTP.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, Validate)]
pub struct QuizRequest {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub question: Option<String>,

    #[serde(default)]
    pub options: Option<Vec<String>>,

    #[serde(default)]
    pub correct_answer: Option<String>,

    #[serde(default)]
    pub explanation: Option<String>,

    /// JLPT level (1-5)
    #[serde(default)]
    #[validate(range(min = 1, max = 5))]
    pub jlpt_level: Option<u8>,

    /// `null` is treated like an absent field
    #[serde(default)]
    pub quiz_type: Option<QuizType>,
}

impl QuizRequest {
    /// Validate the request and produce a render-ready question.
    ///
    /// Checks run in order: required fields, option count, JLPT range,
    /// answer membership.
    pub fn validate(self) -> Result<QuizQuestion, QuizValidationError> {
        let field_checks = Validate::validate(&self);

        let (question, options, correct_answer) =
            match (self.question, self.options, self.correct_answer) {
                (Some(q), Some(o), Some(a)) if !q.is_empty() && !a.is_empty() => (q, o, a),
                _ => return Err(QuizValidationError::MissingFields),
            };

        let count = options.len();
        let options: [String; OPTION_COUNT] = options
            .try_into()
            .map_err(|_| QuizValidationError::OptionCount(count))?;

        if field_checks.is_err() {
            return Err(QuizValidationError::JlptLevel(
                self.jlpt_level.unwrap_or_default(),
            ));
        }

        if !options.iter().any(|o| *o == correct_answer) {
            return Err(QuizValidationError::AnswerNotInOptions);
        }

        Ok(QuizQuestion {
            id: self.id.filter(|id| *id != 0),
            question,
            options,
            correct_answer,
            explanation: self.explanation.unwrap_or_default(),
            jlpt_level: self.jlpt_level,
            quiz_type: self.quiz_type.unwrap_or_default(),
        })
    }
}

/// A validated quiz question. Immutable input to rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QuizQuestion {
    /// Question ID (`None` when absent or zero)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub question: String,
    pub options: [String; OPTION_COUNT],
    pub correct_answer: String,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jlpt_level: Option<u8>,
    pub quiz_type: QuizType,
}

impl QuizQuestion {
    /// Index of the correct answer within `options`.
    pub fn correct_index(&self) -> usize {
        self.options
            .iter()
            .position(|o| *o == self.correct_answer)
            .unwrap_or(0)
    }

    /// Circled label (① - ④) of the correct answer.
    pub fn correct_label(&self) -> &'static str {
        OPTION_LABELS[self.correct_index()]
    }

    /// Explanation split into display lines.
    ///
    /// Lines hold at most [`EXPLANATION_LINE_CHARS`] characters; anything past
    /// [`EXPLANATION_MAX_LINES`] lines is dropped.
    pub fn explanation_lines(&self) -> Vec<String> {
        let chars: Vec<char> = self.explanation.chars().collect();
        chars
            .chunks(EXPLANATION_LINE_CHARS)
            .take(EXPLANATION_MAX_LINES)
            .map(|chunk| chunk.iter().collect())
            .collect()
    }

    /// Question text font size, shrinking for long prompts.
    pub fn question_font_size(&self) -> u32 {
        match self.question.chars().count() {
            n if n > 25 => 72,
            n if n > 15 => 100,
            _ => 150,
        }
    }
}
