//! Scoring against quiz answer keys

use sheetscan::scoring::ScoringEngine;
use sheetscan::types::Quiz;

fn quiz(answers: &[&str], points: &[f64], total: usize) -> Quiz {
    Quiz {
        id: "quiz1".to_string(),
        title: "Unit 3".to_string(),
        total_questions: total,
        max_score: points.iter().sum(),
        correct_answers: answers.iter().map(|s| s.to_string()).collect(),
        question_points: points.to_vec(),
    }
}

#[test]
fn test_weighted_quiz() {
    let engine = ScoringEngine::for_quiz(&quiz(&["A", "B", "C"], &[1.0, 1.0, 2.0], 3));
    let result = engine.score(&["A", "X", "C"]);

    assert_eq!(result.correct_count, 2);
    assert_eq!(result.wrong_count, 1);
    assert_eq!(result.total_score, 3.0);
    assert_eq!(result.percentage, 75);
    assert!(result.questions[0].correct);
    assert!(!result.questions[1].correct);
    assert_eq!(result.questions[2].points, 2.0);
}

#[test]
fn test_quiz_without_key() {
    let engine = ScoringEngine::for_quiz(&quiz(&[], &[], 10));
    let result = engine.score(&["A"; 10]);

    assert_eq!(result.correct_count, 0);
    assert_eq!(result.wrong_count, 10);
    assert_eq!(result.total_score, 0.0);
    assert_eq!(result.percentage, 0);
    assert!(!result.trace.is_empty());
}

#[test]
fn test_counts_always_cover_every_question() {
    let engine = ScoringEngine::for_quiz(&quiz(&["A", "B", "C", "D"], &[], 4));
    for extracted in [vec![], vec!["A"], vec!["A", "B", "C", "D", "A", "B"]] {
        let result = engine.score(&extracted);
        assert_eq!(result.correct_count + result.wrong_count, 4);
        assert_eq!(result.questions.len(), 4);
    }
}

#[test]
fn test_scores_extraction_output() {
    let engine = ScoringEngine::for_quiz(&quiz(&["A", "B", "C", "D"], &[], 4));
    let extracted: Vec<String> = vec!["A".into(), "".into(), "MULTIPLE".into(), "d".into()];
    let result = engine.score(&extracted);
    assert_eq!(result.correct_count, 2);
    assert_eq!(result.percentage, 50);
}

#[test]
fn test_identical_inputs_identical_results() {
    let engine = ScoringEngine::for_quiz(&quiz(&["A", "B", "C"], &[2.0, 3.0, 5.0], 3));
    assert_eq!(engine.score(&["A", "C", "C"]), engine.score(&["A", "C", "C"]));
}
