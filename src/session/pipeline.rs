use crate::config::ScanConfig;
use crate::errors::ScanError;
use crate::extraction::{strategy_for, ExtractionResult, ExtractionStrategy, SheetLayout};
use crate::identity::{Identification, IdentityDecoder, MarkerDecoder, MatchKind};
use crate::scoring::{ScoreResult, ScoringEngine};
use crate::store::{ResultRecord, StudentDirectory};
use crate::types::{Frame, Quiz};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Everything one capture produced
#[derive(Debug, Clone)]
pub struct CaptureReport {
    pub identification: Identification,
    pub extraction: ExtractionResult,
    pub score: ScoreResult,
    pub record: ResultRecord,
}

/// Identity, extraction and scoring for one quiz, with no session state.
///
/// The extraction strategy is chosen once, when the pipeline is built.
pub struct ScanPipeline {
    quiz: Quiz,
    layout: SheetLayout,
    decoder: IdentityDecoder,
    strategy: Box<dyn ExtractionStrategy>,
    scoring: ScoringEngine,
    directory: Arc<dyn StudentDirectory>,
}

impl ScanPipeline {
    pub fn new(
        config: &ScanConfig,
        quiz: Quiz,
        directory: Arc<dyn StudentDirectory>,
    ) -> Result<Self, ScanError> {
        let decoder = IdentityDecoder::new(config.identity.clone());
        Self::with_decoder(config, quiz, directory, decoder)
    }

    /// Build with a custom marker decoder in place of the QR decoder.
    pub fn with_marker_decoder(
        config: &ScanConfig,
        quiz: Quiz,
        directory: Arc<dyn StudentDirectory>,
        marker: Box<dyn MarkerDecoder>,
    ) -> Result<Self, ScanError> {
        let decoder = IdentityDecoder::with_decoder(config.identity.clone(), marker);
        Self::with_decoder(config, quiz, directory, decoder)
    }

    fn with_decoder(
        config: &ScanConfig,
        quiz: Quiz,
        directory: Arc<dyn StudentDirectory>,
        decoder: IdentityDecoder,
    ) -> Result<Self, ScanError> {
        config.validate()?;
        let layout = SheetLayout::standard(quiz.total_questions)?;
        let scoring = ScoringEngine::for_quiz(&quiz);
        if !scoring.has_key() {
            log::warn!("Quiz '{}' has no answer key; every sheet will score 0", quiz.id);
        }
        Ok(Self {
            layout,
            decoder,
            strategy: strategy_for(&config.extraction),
            scoring,
            directory,
            quiz,
        })
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    pub fn strategy(&self) -> &dyn ExtractionStrategy {
        self.strategy.as_ref()
    }

    /// Run every stage over `frame`. The first failing stage aborts the run.
    pub fn run(&self, frame: &Frame) -> Result<CaptureReport, ScanError> {
        let identification = self.decoder.identify(frame, self.directory.as_ref())?;
        let extraction = self.strategy.extract(frame, &self.layout);
        let score = self.scoring.score(&extraction.answer_strings());

        let identity = &identification.identity;
        let payload = &identification.marker.payload;
        let quiz_matches = payload
            .quiz_id
            .as_deref()
            .map_or(true, |quiz_id| quiz_id == self.quiz.id);
        if !quiz_matches {
            log::warn!(
                "Sheet for {} was printed for quiz '{}', scanning into '{}'",
                identity.external_id,
                payload.quiz_id.as_deref().unwrap_or_default(),
                self.quiz.id
            );
        }
        let verified = identity.match_kind == MatchKind::Exact && quiz_matches;

        let record = ResultRecord {
            record_id: Uuid::new_v4().to_string(),
            quiz_id: self.quiz.id.clone(),
            student_id: identity.student_id.clone(),
            external_id: identity.external_id.clone(),
            student_name: identity.display_name.clone(),
            score: score.total_score,
            percentage: score.percentage,
            answers: extraction.answer_strings(),
            correct_answers: score.correct_count,
            wrong_answers: score.wrong_count,
            verified,
            confidence: extraction.confidence,
            strategy: extraction.strategy.to_string(),
            scanned_at: Utc::now(),
        };

        Ok(CaptureReport {
            identification,
            extraction,
            score,
            record,
        })
    }
}
