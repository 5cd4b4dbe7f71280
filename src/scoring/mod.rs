//! Scoring engine
//!
//! Compares extracted answers with a quiz's answer key. Scoring is
//! deterministic and never fails: a missing key or a short answer array is
//! reconciled and noted in the returned trace.

use crate::diagnostics::DiagnosticLog;
use crate::errors::ScanError;
use crate::extraction::MULTIPLE_SENTINEL;
use crate::types::{AnswerKey, Quiz};
use serde::{Deserialize, Serialize};

/// Outcome for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionScore {
    pub index: usize,
    pub extracted: String,
    pub expected: Option<String>,
    pub correct: bool,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub total_questions: usize,
    pub correct_count: usize,
    pub wrong_count: usize,
    pub total_score: f64,
    /// Rounded share of the available points, 0-100
    pub percentage: u32,
    pub questions: Vec<QuestionScore>,
    pub trace: DiagnosticLog,
}

/// Scores answer arrays against one quiz's key.
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    quiz_id: String,
    total_questions: usize,
    key: Option<AnswerKey>,
}

impl ScoringEngine {
    pub fn new(quiz_id: impl Into<String>, total_questions: usize, key: Option<AnswerKey>) -> Self {
        Self {
            quiz_id: quiz_id.into(),
            total_questions,
            key: key.filter(|k| !k.correct_answers.is_empty()),
        }
    }

    pub fn for_quiz(quiz: &Quiz) -> Self {
        Self::new(quiz.id.clone(), quiz.total_questions, quiz.answer_key())
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Points available across all questions.
    pub fn available_points(&self) -> f64 {
        match &self.key {
            Some(key) => (0..self.total_questions).map(|i| key.points_for(i)).sum(),
            None => 0.0,
        }
    }

    pub fn score<S: AsRef<str>>(&self, extracted: &[S]) -> ScoreResult {
        let total = self.total_questions;
        let mut trace = DiagnosticLog::new();

        let key = match &self.key {
            Some(key) => key,
            None => {
                let err = ScanError::MissingAnswerKey {
                    quiz_id: self.quiz_id.clone(),
                };
                log::warn!("{}; every question scored wrong", err);
                trace.note(format!("{}; every question scored wrong", err));
                return ScoreResult {
                    total_questions: total,
                    correct_count: 0,
                    wrong_count: total,
                    total_score: 0.0,
                    percentage: 0,
                    questions: (0..total)
                        .map(|index| QuestionScore {
                            index,
                            extracted: extracted
                                .get(index)
                                .map(|s| s.as_ref().trim().to_string())
                                .unwrap_or_default(),
                            expected: None,
                            correct: false,
                            points: 0.0,
                        })
                        .collect(),
                    trace,
                };
            }
        };

        let mut correct_count = 0usize;
        let mut wrong_count = 0usize;
        let mut total_score = 0.0f64;
        let mut questions = Vec::with_capacity(total);

        for (index, answer) in extracted.iter().take(total).enumerate() {
            let answer = answer.as_ref().trim();
            let expected = key
                .correct_answers
                .get(index)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty());

            let (correct, reason) = match expected {
                None => (false, "no correct answer defined".to_string()),
                Some(_) if answer.eq_ignore_ascii_case(MULTIPLE_SENTINEL) => {
                    (false, "multiple marks".to_string())
                }
                Some(_) if answer.is_empty() => (false, "no answer".to_string()),
                Some(exp) if answer.to_lowercase() == exp.to_lowercase() => {
                    (true, format!("{} correct", answer))
                }
                Some(exp) => (false, format!("{} wrong, expected {}", answer, exp)),
            };

            let points = if correct { key.points_for(index) } else { 0.0 };
            if correct {
                correct_count += 1;
                total_score += points;
            } else {
                wrong_count += 1;
            }
            trace.question(index, format!("{} (+{})", reason, points));
            questions.push(QuestionScore {
                index,
                extracted: answer.to_string(),
                expected: expected.map(str::to_string),
                correct,
                points,
            });
        }

        if extracted.len() > total {
            trace.note(format!(
                "ignored {} answers beyond question {}",
                extracted.len() - total,
                total
            ));
        }

        if correct_count + wrong_count != total {
            let err = ScanError::MalformedExtraction {
                expected: total,
                actual: extracted.len(),
            };
            let shortfall = total.saturating_sub(correct_count + wrong_count);
            log::warn!("{}; counting {} missing answers as wrong", err, shortfall);
            trace.note(format!("{}; counting {} missing answers as wrong", err, shortfall));
            for index in questions.len()..total {
                questions.push(QuestionScore {
                    index,
                    extracted: String::new(),
                    expected: key.correct_answers.get(index).map(|s| s.trim().to_string()),
                    correct: false,
                    points: 0.0,
                });
            }
            wrong_count += shortfall;
        }

        let available = self.available_points();
        let percentage = if available > 0.0 {
            (total_score / available * 100.0).round().clamp(0.0, 100.0) as u32
        } else {
            0
        };
        trace.note(format!(
            "{} correct, {} wrong, score {} of {} ({}%)",
            correct_count, wrong_count, total_score, available, percentage
        ));

        ScoreResult {
            total_questions: total,
            correct_count,
            wrong_count,
            total_score,
            percentage,
            questions,
            trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(answers: &[&str], points: &[f64]) -> Option<AnswerKey> {
        Some(AnswerKey {
            correct_answers: answers.iter().map(|s| s.to_string()).collect(),
            question_points: points.to_vec(),
        })
    }

    #[test]
    fn test_weighted_points() {
        let engine = ScoringEngine::new("quiz1", 3, key(&["A", "B", "C"], &[1.0, 1.0, 2.0]));
        let result = engine.score(&["A", "X", "C"]);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.wrong_count, 1);
        assert_eq!(result.total_score, 3.0);
        assert_eq!(result.percentage, 75);
    }

    #[test]
    fn test_missing_key_scores_all_wrong() {
        let engine = ScoringEngine::new("quiz1", 4, key(&[], &[]));
        assert!(!engine.has_key());
        let result = engine.score(&["A", "B", "C", "D"]);
        assert_eq!(result.correct_count, 0);
        assert_eq!(result.wrong_count, 4);
        assert_eq!(result.percentage, 0);
        assert!(result.trace.entries()[0].message.contains("quiz1"));
    }

    #[test]
    fn test_comparison_is_trimmed_and_case_insensitive() {
        let engine = ScoringEngine::new("q", 2, key(&["a ", "B"], &[]));
        let result = engine.score(&[" A", "b"]);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.percentage, 100);
    }

    #[test]
    fn test_sentinel_and_blank_are_wrong() {
        let engine = ScoringEngine::new("q", 3, key(&["A", "B", "C"], &[]));
        let result = engine.score(&["MULTIPLE", "", "C"]);
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.wrong_count, 2);
        assert_eq!(result.percentage, 33);
    }

    #[test]
    fn test_undefined_correct_answer_is_wrong() {
        let engine = ScoringEngine::new("q", 3, key(&["A", ""], &[]));
        let result = engine.score(&["A", "B", "C"]);
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.wrong_count, 2);
    }

    #[test]
    fn test_short_extraction_padded() {
        let engine = ScoringEngine::new("q", 5, key(&["A", "B", "C", "D", "A"], &[]));
        let result = engine.score(&["A", "B"]);
        assert_eq!(result.correct_count, 2);
        assert_eq!(result.wrong_count, 3);
        assert_eq!(result.questions.len(), 5);
        assert!(result
            .trace
            .entries()
            .iter()
            .any(|e| e.message.contains("missing answers")));
    }

    #[test]
    fn test_extra_answers_ignored() {
        let engine = ScoringEngine::new("q", 2, key(&["A", "B"], &[]));
        let result = engine.score(&["A", "B", "C", "D"]);
        assert_eq!(result.correct_count + result.wrong_count, 2);
        assert_eq!(result.percentage, 100);
    }
}
