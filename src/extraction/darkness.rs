use super::layout::{OptionLabel, SheetLayout};
use super::sampling::darkness_ratio;
use super::{
    clamp_confidence, Answer, ExtractionResult, ExtractionStrategy, OptionObservation,
    QuestionReading,
};
use crate::config::{DarknessConfig, MultipleAnswerPolicy, StrategyKind};
use crate::diagnostics::DiagnosticLog;
use crate::types::Frame;

/// Reads answers from pencil fill: an option is marked when enough of its
/// bubble is darker than the luminance threshold.
#[derive(Debug, Clone)]
pub struct DarknessStrategy {
    config: DarknessConfig,
}

impl DarknessStrategy {
    pub fn new(config: DarknessConfig) -> Self {
        Self { config }
    }

    /// Dark ratio of each option of `question`, in option order.
    pub fn measure(&self, frame: &Frame, layout: &SheetLayout, question: usize) -> [f64; 4] {
        let radius = layout.bubble_radius(frame.width(), frame.height());
        OptionLabel::ALL.map(|option| {
            let center = layout.bubble_center(frame.width(), frame.height(), question, option);
            darkness_ratio(frame, center, radius, self.config.luminance_threshold)
        })
    }

    /// Apply the marking rules to the measured ratios of one question.
    /// Returns the answer, its confidence and the rationale.
    pub fn resolve(&self, ratios: &[f64; 4]) -> (Answer, f64, String) {
        let cfg = &self.config;
        let marked: Vec<usize> = (0..ratios.len())
            .filter(|&i| ratios[i] > cfg.mark_threshold)
            .collect();

        match marked.len() {
            0 => {
                let (darkest, ratio) = darkest_of(ratios, 0..ratios.len());
                if ratio > cfg.min_fill_threshold {
                    let label = OptionLabel::ALL[darkest];
                    let confidence = clamp_confidence(ratio * cfg.fallback_factor * 100.0);
                    (
                        Answer::Choice(label),
                        confidence,
                        format!(
                            "no option above {:.2}; faint {} at {:.3} accepted",
                            cfg.mark_threshold, label, ratio
                        ),
                    )
                } else {
                    (
                        Answer::Empty,
                        0.0,
                        format!("no option above {:.2}", cfg.min_fill_threshold),
                    )
                }
            }
            1 => {
                let label = OptionLabel::ALL[marked[0]];
                let ratio = ratios[marked[0]];
                let confidence = clamp_confidence(ratio * cfg.single_factor * 100.0);
                (Answer::Choice(label), confidence, format!("single mark {}", label))
            }
            count => {
                let names = marked
                    .iter()
                    .map(|&i| OptionLabel::ALL[i].as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                match cfg.multiple_policy {
                    MultipleAnswerPolicy::Best => {
                        let (best, ratio) = darkest_of(ratios, marked.iter().copied());
                        let label = OptionLabel::ALL[best];
                        let confidence = clamp_confidence(ratio * cfg.multiple_factor * 100.0);
                        (
                            Answer::Choice(label),
                            confidence,
                            format!("{} marks ({}); darkest {} kept", count, names, label),
                        )
                    }
                    MultipleAnswerPolicy::First => {
                        let label = OptionLabel::ALL[marked[0]];
                        let ratio = ratios[marked[0]];
                        let confidence = clamp_confidence(ratio * cfg.multiple_factor * 100.0);
                        (
                            Answer::Choice(label),
                            confidence,
                            format!("{} marks ({}); first {} kept", count, names, label),
                        )
                    }
                    MultipleAnswerPolicy::Reject => (
                        Answer::Multiple,
                        0.0,
                        format!("{} marks ({}); rejected as multiple", count, names),
                    ),
                }
            }
        }
    }
}

/// Index and ratio of the darkest candidate. Ties keep the earlier option.
fn darkest_of(ratios: &[f64; 4], candidates: impl Iterator<Item = usize>) -> (usize, f64) {
    let mut best = (0usize, f64::MIN);
    for i in candidates {
        if ratios[i] > best.1 {
            best = (i, ratios[i]);
        }
    }
    best
}

fn format_ratios(ratios: &[f64; 4]) -> String {
    OptionLabel::ALL
        .iter()
        .zip(ratios)
        .map(|(label, r)| format!("{}={:.3}", label, r))
        .collect::<Vec<_>>()
        .join(" ")
}

impl ExtractionStrategy for DarknessStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Darkness
    }

    fn extract(&self, frame: &Frame, layout: &SheetLayout) -> ExtractionResult {
        let mut trace = DiagnosticLog::new();
        let mut questions = Vec::with_capacity(layout.question_count());

        for index in 0..layout.question_count() {
            let ratios = self.measure(frame, layout, index);
            let (answer, confidence, rationale) = self.resolve(&ratios);

            trace.question(
                index,
                format!(
                    "darkness {} -> {} ({}, confidence {:.1})",
                    format_ratios(&ratios),
                    answer,
                    rationale,
                    confidence
                ),
            );
            log::debug!("Q{} darkness -> {} ({})", index + 1, answer, rationale);

            questions.push(QuestionReading {
                index,
                answer,
                confidence,
                observations: OptionLabel::ALL
                    .iter()
                    .zip(ratios)
                    .map(|(&option, ratio)| OptionObservation {
                        option,
                        darkness: Some(ratio),
                        visibility: None,
                    })
                    .collect(),
            });
        }

        ExtractionResult::from_readings(StrategyKind::Darkness, questions, trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy(policy: MultipleAnswerPolicy) -> DarknessStrategy {
        DarknessStrategy::new(DarknessConfig {
            multiple_policy: policy,
            ..DarknessConfig::default()
        })
    }

    #[test]
    fn test_single_mark() {
        let (answer, confidence, _) =
            strategy(MultipleAnswerPolicy::Best).resolve(&[0.02, 0.80, 0.05, 0.0]);
        assert_eq!(answer, Answer::Choice(OptionLabel::B));
        assert!((confidence - 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_faint_mark_accepted_above_min_fill() {
        let (answer, confidence, _) =
            strategy(MultipleAnswerPolicy::Best).resolve(&[0.02, 0.05, 0.18, 0.0]);
        assert_eq!(answer, Answer::Choice(OptionLabel::C));
        assert!((confidence - 10.8).abs() < 1e-9);
    }

    #[test]
    fn test_below_min_fill_is_empty() {
        let (answer, confidence, _) =
            strategy(MultipleAnswerPolicy::Best).resolve(&[0.02, 0.05, 0.10, 0.0]);
        assert_eq!(answer, Answer::Empty);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_multiple_best_keeps_darkest() {
        let (answer, confidence, rationale) =
            strategy(MultipleAnswerPolicy::Best).resolve(&[0.50, 0.02, 0.90, 0.0]);
        assert_eq!(answer, Answer::Choice(OptionLabel::C));
        assert!((confidence - 67.5).abs() < 1e-9);
        assert!(rationale.contains("A,C"));
    }

    #[test]
    fn test_multiple_first_keeps_scan_order() {
        let (answer, confidence, _) =
            strategy(MultipleAnswerPolicy::First).resolve(&[0.50, 0.02, 0.90, 0.0]);
        assert_eq!(answer, Answer::Choice(OptionLabel::A));
        assert!((confidence - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_reject_reports_sentinel() {
        let (answer, confidence, _) =
            strategy(MultipleAnswerPolicy::Reject).resolve(&[0.50, 0.02, 0.90, 0.0]);
        assert_eq!(answer, Answer::Multiple);
        assert_eq!(confidence, 0.0);
    }
}
