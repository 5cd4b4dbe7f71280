//! Answer extraction
//!
//! Maps the fixed sheet geometry onto a frame and infers the option chosen for
//! each question. Three interchangeable strategies implement
//! [`ExtractionStrategy`]:
//!
//! - [`DarknessStrategy`] looks for pencil fill inside each bubble
//! - [`VisibilityStrategy`] looks for printed option glyphs that have been covered
//! - [`HybridStrategy`] runs both and fuses their readings
//!
//! The strategy is chosen once per session from [`ExtractionConfig`].

pub mod darkness;
pub mod hybrid;
pub mod layout;
pub mod sampling;
pub mod visibility;

pub use darkness::DarknessStrategy;
pub use hybrid::HybridStrategy;
pub use layout::{BubbleCenter, OptionLabel, SheetLayout};
pub use visibility::VisibilityStrategy;

use crate::config::{ExtractionConfig, StrategyKind};
use crate::diagnostics::DiagnosticLog;
use crate::types::Frame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel reported when a question carries more than one mark and the
/// multiple-answer policy rejects it.
pub const MULTIPLE_SENTINEL: &str = "MULTIPLE";

/// Outcome for a single question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    Empty,
    Choice(OptionLabel),
    Multiple,
}

impl Answer {
    /// Wire form: `""`, `"A"`..`"D"` or `"MULTIPLE"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Answer::Empty => "",
            Answer::Choice(label) => label.as_str(),
            Answer::Multiple => MULTIPLE_SENTINEL,
        }
    }

    pub fn choice(&self) -> Option<OptionLabel> {
        match self {
            Answer::Choice(label) => Some(*label),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Answer::Empty)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Empty => f.write_str("-"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// What a strategy measured for one bubble
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionObservation {
    pub option: OptionLabel,
    /// Fraction of dark samples (0.0-1.0), when measured
    pub darkness: Option<f64>,
    /// Fraction of light samples (0.0-1.0), when measured
    pub visibility: Option<f64>,
}

/// Reading for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionReading {
    pub index: usize,
    pub answer: Answer,
    /// 0-100
    pub confidence: f64,
    pub observations: Vec<OptionObservation>,
}

/// Per-question answers plus the trace that explains them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub strategy: StrategyKind,
    pub questions: Vec<QuestionReading>,
    /// Mean confidence of the answered questions (0-100), 0 when none were answered
    pub confidence: f64,
    pub trace: DiagnosticLog,
}

impl ExtractionResult {
    pub(crate) fn from_readings(
        strategy: StrategyKind,
        questions: Vec<QuestionReading>,
        mut trace: DiagnosticLog,
    ) -> Self {
        let answered: Vec<f64> = questions
            .iter()
            .filter(|q| q.answer.choice().is_some())
            .map(|q| q.confidence)
            .collect();
        let confidence = if answered.is_empty() {
            0.0
        } else {
            answered.iter().sum::<f64>() / answered.len() as f64
        };
        trace.note(format!(
            "{} strategy: {}/{} answered, overall confidence {:.1}",
            strategy,
            answered.len(),
            questions.len(),
            confidence
        ));
        Self {
            strategy,
            questions,
            confidence,
            trace,
        }
    }

    pub fn answers(&self) -> Vec<Answer> {
        self.questions.iter().map(|q| q.answer).collect()
    }

    /// Answers in wire form, ready for scoring or storage.
    pub fn answer_strings(&self) -> Vec<String> {
        self.questions
            .iter()
            .map(|q| q.answer.as_str().to_string())
            .collect()
    }
}

/// A way of reading the marked option for every question of a sheet.
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Read all `layout.question_count()` questions from `frame`.
    fn extract(&self, frame: &Frame, layout: &SheetLayout) -> ExtractionResult;
}

/// Build the strategy selected by `config.strategy`.
pub fn strategy_for(config: &ExtractionConfig) -> Box<dyn ExtractionStrategy> {
    match config.strategy {
        StrategyKind::Darkness => Box::new(DarknessStrategy::new(config.darkness.clone())),
        StrategyKind::Visibility => Box::new(VisibilityStrategy::new(config.visibility.clone())),
        StrategyKind::Hybrid => Box::new(HybridStrategy::new(config)),
    }
}

pub(crate) fn clamp_confidence(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
