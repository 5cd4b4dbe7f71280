use super::layout::{OptionLabel, SheetLayout};
use super::sampling::visibility_ratio;
use super::{
    clamp_confidence, Answer, ExtractionResult, ExtractionStrategy, OptionObservation,
    QuestionReading,
};
use crate::config::{StrategyKind, VisibilityConfig};
use crate::diagnostics::DiagnosticLog;
use crate::types::Frame;

/// Reads answers from occlusion: a marked bubble hides the printed option
/// glyph, so its footprint shows little paper.
#[derive(Debug, Clone)]
pub struct VisibilityStrategy {
    config: VisibilityConfig,
}

impl VisibilityStrategy {
    pub fn new(config: VisibilityConfig) -> Self {
        Self { config }
    }

    /// Light ratio of each option of `question`, in option order.
    pub fn measure(&self, frame: &Frame, layout: &SheetLayout, question: usize) -> [f64; 4] {
        let radius = layout.bubble_radius(frame.width(), frame.height());
        OptionLabel::ALL.map(|option| {
            let center = layout.bubble_center(frame.width(), frame.height(), question, option);
            visibility_ratio(frame, center, radius, self.config.light_threshold)
        })
    }

    pub fn resolve(&self, visibility: &[f64; 4]) -> (Answer, f64, String) {
        let hidden: Vec<usize> = (0..visibility.len())
            .filter(|&i| visibility[i] < self.config.hidden_threshold)
            .collect();

        // Lowest visibility wins; ties keep the earlier option.
        let mut pick: Option<usize> = None;
        for &i in &hidden {
            if pick.map_or(true, |p| visibility[i] < visibility[p]) {
                pick = Some(i);
            }
        }

        match pick {
            None => (
                Answer::Empty,
                0.0,
                format!("nothing hidden below {:.2}", self.config.hidden_threshold),
            ),
            Some(i) => {
                let label = OptionLabel::ALL[i];
                let confidence = clamp_confidence(100.0 - visibility[i] * 100.0);
                let rationale = if hidden.len() == 1 {
                    format!("{} hidden", label)
                } else {
                    format!("{} options hidden; least visible {} kept", hidden.len(), label)
                };
                (Answer::Choice(label), confidence, rationale)
            }
        }
    }
}

impl ExtractionStrategy for VisibilityStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Visibility
    }

    fn extract(&self, frame: &Frame, layout: &SheetLayout) -> ExtractionResult {
        let mut trace = DiagnosticLog::new();
        let mut questions = Vec::with_capacity(layout.question_count());

        for index in 0..layout.question_count() {
            let visibility = self.measure(frame, layout, index);
            let (answer, confidence, rationale) = self.resolve(&visibility);

            let observed = OptionLabel::ALL
                .iter()
                .zip(visibility)
                .map(|(label, v)| format!("{}={:.3}", label, v))
                .collect::<Vec<_>>()
                .join(" ");
            trace.question(
                index,
                format!(
                    "visibility {} -> {} ({}, confidence {:.1})",
                    observed, answer, rationale, confidence
                ),
            );
            log::debug!("Q{} visibility -> {} ({})", index + 1, answer, rationale);

            questions.push(QuestionReading {
                index,
                answer,
                confidence,
                observations: OptionLabel::ALL
                    .iter()
                    .zip(visibility)
                    .map(|(&option, v)| OptionObservation {
                        option,
                        darkness: None,
                        visibility: Some(v),
                    })
                    .collect(),
            });
        }

        ExtractionResult::from_readings(StrategyKind::Visibility, questions, trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_hidden_is_empty() {
        let strategy = VisibilityStrategy::new(VisibilityConfig::default());
        let (answer, confidence, _) = strategy.resolve(&[1.0, 0.95, 0.9, 1.0]);
        assert_eq!(answer, Answer::Empty);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_single_hidden_option() {
        let strategy = VisibilityStrategy::new(VisibilityConfig::default());
        let (answer, confidence, _) = strategy.resolve(&[1.0, 0.1, 0.9, 1.0]);
        assert_eq!(answer, Answer::Choice(OptionLabel::B));
        assert!((confidence - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_least_visible_wins() {
        let strategy = VisibilityStrategy::new(VisibilityConfig::default());
        let (answer, confidence, rationale) = strategy.resolve(&[0.3, 1.0, 0.05, 1.0]);
        assert_eq!(answer, Answer::Choice(OptionLabel::C));
        assert!((confidence - 95.0).abs() < 1e-9);
        assert!(rationale.starts_with("2 options hidden"));
    }
}
