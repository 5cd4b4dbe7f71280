use super::darkness::DarknessStrategy;
use super::layout::SheetLayout;
use super::visibility::VisibilityStrategy;
use super::{
    clamp_confidence, Answer, ExtractionResult, ExtractionStrategy, OptionObservation,
    QuestionReading,
};
use crate::config::{ConflictPolicy, ExtractionConfig, HybridConfig, StrategyKind};
use crate::diagnostics::DiagnosticLog;
use crate::types::Frame;

/// Outcome of fusing one question's darkness and visibility readings
#[derive(Debug, Clone, PartialEq)]
pub struct Fusion {
    pub answer: Answer,
    pub confidence: f64,
    pub disagreement: bool,
    pub rationale: String,
}

/// Runs the darkness and visibility strategies over the same frame and
/// fuses their per-question readings.
#[derive(Debug, Clone)]
pub struct HybridStrategy {
    darkness: DarknessStrategy,
    visibility: VisibilityStrategy,
    config: HybridConfig,
}

impl HybridStrategy {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            darkness: DarknessStrategy::new(config.darkness.clone()),
            visibility: VisibilityStrategy::new(config.visibility.clone()),
            config: config.hybrid.clone(),
        }
    }

    /// Combine a darkness reading `a` with a visibility reading `b` for the
    /// same question.
    pub fn fuse(
        &self,
        (a, ca): (Answer, f64),
        (b, cb): (Answer, f64),
    ) -> Fusion {
        let cfg = &self.config;

        if a == b {
            return match a {
                Answer::Choice(_) => {
                    let weights = cfg.darkness_weight + cfg.visibility_weight;
                    let confidence = clamp_confidence(
                        (cfg.darkness_weight * ca + cfg.visibility_weight * cb) / weights,
                    );
                    Fusion {
                        answer: a,
                        confidence,
                        disagreement: false,
                        rationale: format!("both read {}", a),
                    }
                }
                _ => Fusion {
                    answer: a,
                    confidence: 0.0,
                    disagreement: false,
                    rationale: format!("both read {}", a),
                },
            };
        }

        let (answer, confidence, winner) = match cfg.conflict_policy {
            ConflictPolicy::PreferDarkness => (a, ca * cfg.prefer_darkness_damping, "darkness"),
            ConflictPolicy::PreferVisibility => {
                (b, cb * cfg.prefer_visibility_damping, "visibility")
            }
            ConflictPolicy::HigherConfidence => {
                if ca >= cb {
                    (a, ca * cfg.higher_confidence_damping, "darkness")
                } else {
                    (b, cb * cfg.higher_confidence_damping, "visibility")
                }
            }
        };

        Fusion {
            answer,
            confidence: clamp_confidence(confidence),
            disagreement: true,
            rationale: format!(
                "disagreement: darkness {} ({:.1}) vs visibility {} ({:.1}); {} kept {} by {}",
                a, ca, b, cb, winner, answer, cfg.conflict_policy
            ),
        }
    }
}

impl ExtractionStrategy for HybridStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Hybrid
    }

    fn extract(&self, frame: &Frame, layout: &SheetLayout) -> ExtractionResult {
        let dark = self.darkness.extract(frame, layout);
        let light = self.visibility.extract(frame, layout);

        let mut trace = DiagnosticLog::new();
        trace.absorb("darkness", &dark.trace);
        trace.absorb("visibility", &light.trace);

        let mut disagreements = 0usize;
        let questions: Vec<QuestionReading> = dark
            .questions
            .iter()
            .zip(&light.questions)
            .map(|(qa, qb)| {
                let fusion = self.fuse((qa.answer, qa.confidence), (qb.answer, qb.confidence));
                if fusion.disagreement {
                    disagreements += 1;
                    log::debug!("Q{} {}", qa.index + 1, fusion.rationale);
                }
                trace.question(
                    qa.index,
                    format!(
                        "hybrid -> {} ({}, confidence {:.1})",
                        fusion.answer, fusion.rationale, fusion.confidence
                    ),
                );

                QuestionReading {
                    index: qa.index,
                    answer: fusion.answer,
                    confidence: fusion.confidence,
                    observations: qa
                        .observations
                        .iter()
                        .zip(&qb.observations)
                        .map(|(oa, ob)| OptionObservation {
                            option: oa.option,
                            darkness: oa.darkness,
                            visibility: ob.visibility,
                        })
                        .collect(),
                }
            })
            .collect();

        if disagreements > 0 {
            trace.note(format!(
                "{} question(s) resolved by {}",
                disagreements, self.config.conflict_policy
            ));
        }

        ExtractionResult::from_readings(StrategyKind::Hybrid, questions, trace)
    }
}
