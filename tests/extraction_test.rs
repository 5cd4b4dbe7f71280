//! Answer extraction on synthetic sheets
//!
//! Covers the three strategies end to end:
//! - Clean single marks read identically by every strategy
//! - Multiple-answer policies
//! - Hybrid disagreement tracing
//! - Determinism of repeated runs

use sheetscan::config::{ConflictPolicy, ExtractionConfig, MultipleAnswerPolicy, StrategyKind};
use sheetscan::extraction::{
    strategy_for, Answer, DarknessStrategy, ExtractionStrategy, HybridStrategy, OptionLabel,
    SheetLayout, VisibilityStrategy,
};
use sheetscan::testing::{paint_disk, SheetBuilder};

const ANSWERS: [&str; 20] = [
    "A", "B", "C", "D", "A", "B", "C", "D", "A", "B", "C", "D", "A", "B", "C", "D", "A", "B",
    "C", "D",
];

fn config(strategy: StrategyKind) -> ExtractionConfig {
    ExtractionConfig {
        strategy,
        ..ExtractionConfig::default()
    }
}

#[test]
fn test_all_strategies_read_clean_marks() {
    let frame = SheetBuilder::new(600, 800).answers(&ANSWERS).build();
    let layout = SheetLayout::standard(20).unwrap();

    for kind in [
        StrategyKind::Darkness,
        StrategyKind::Visibility,
        StrategyKind::Hybrid,
    ] {
        let result = strategy_for(&config(kind)).extract(&frame, &layout);
        assert_eq!(result.strategy, kind);
        assert_eq!(result.answer_strings(), ANSWERS.to_vec(), "{} strategy", kind);
    }
}

#[test]
fn test_clean_mark_confidences() {
    let frame = SheetBuilder::new(600, 800).mark(0, OptionLabel::B).build();
    let layout = SheetLayout::standard(1).unwrap();
    let defaults = ExtractionConfig::default();

    let dark = DarknessStrategy::new(defaults.darkness.clone()).extract(&frame, &layout);
    assert!((dark.questions[0].confidence - 90.0).abs() < 1e-9);

    let light = VisibilityStrategy::new(defaults.visibility.clone()).extract(&frame, &layout);
    assert!((light.questions[0].confidence - 100.0).abs() < 1e-9);

    let fused = HybridStrategy::new(&defaults).extract(&frame, &layout);
    assert_eq!(fused.questions[0].answer, Answer::Choice(OptionLabel::B));
    assert!((fused.questions[0].confidence - 96.0).abs() < 1e-9);
    assert!((fused.confidence - 96.0).abs() < 1e-9);
}

#[test]
fn test_answer_count_follows_layout() {
    let frame = SheetBuilder::new(600, 800).answers(&ANSWERS).build();
    for count in [1, 5, 7, 8, 14, 20] {
        let layout = SheetLayout::standard(count).unwrap();
        let result = strategy_for(&ExtractionConfig::default()).extract(&frame, &layout);
        assert_eq!(result.questions.len(), count);
        assert_eq!(result.answer_strings(), ANSWERS[..count].to_vec());
    }
}

#[test]
fn test_blank_sheet_reads_empty() {
    let frame = SheetBuilder::new(600, 800).build();
    let layout = SheetLayout::standard(20).unwrap();
    let result = strategy_for(&ExtractionConfig::default()).extract(&frame, &layout);
    assert!(result.answers().iter().all(Answer::is_empty));
    assert_eq!(result.confidence, 0.0);
}

#[test]
fn test_multiple_marks_by_policy() {
    let frame = SheetBuilder::new(600, 800)
        .mark(0, OptionLabel::A)
        .mark(0, OptionLabel::C)
        .build();
    let layout = SheetLayout::standard(1).unwrap();
    let mut cfg = config(StrategyKind::Darkness);

    cfg.darkness.multiple_policy = MultipleAnswerPolicy::Reject;
    let rejected = strategy_for(&cfg).extract(&frame, &layout);
    assert_eq!(rejected.answer_strings(), vec!["MULTIPLE"]);
    assert_eq!(rejected.questions[0].confidence, 0.0);

    cfg.darkness.multiple_policy = MultipleAnswerPolicy::Best;
    let best = strategy_for(&cfg).extract(&frame, &layout);
    assert_eq!(best.answer_strings(), vec!["A"]);
    assert!((best.questions[0].confidence - 75.0).abs() < 1e-9);

    cfg.darkness.multiple_policy = MultipleAnswerPolicy::First;
    let first = strategy_for(&cfg).extract(&frame, &layout);
    assert_eq!(first.answer_strings(), vec!["A"]);
}

#[test]
fn test_hybrid_records_disagreement() {
    // Mid-grey fill: not dark enough for the darkness strategy, but it still
    // hides the bubble from the visibility strategy.
    let layout = SheetLayout::standard(1).unwrap();
    let center = layout.bubble_center(600, 800, 0, OptionLabel::D);
    let radius = layout.bubble_radius(600, 800) * 1.2;
    let frame = paint_disk(&SheetBuilder::new(600, 800).build(), center.x, center.y, radius, 140);

    let mut cfg = config(StrategyKind::Hybrid);
    cfg.hybrid.conflict_policy = ConflictPolicy::HigherConfidence;
    let result = strategy_for(&cfg).extract(&frame, &layout);
    assert_eq!(result.questions[0].answer, Answer::Choice(OptionLabel::D));
    assert!((result.questions[0].confidence - 70.0).abs() < 1e-9);
    assert!(result
        .trace
        .for_question(0)
        .any(|e| e.message.contains("disagreement")));

    cfg.hybrid.conflict_policy = ConflictPolicy::PreferDarkness;
    let result = strategy_for(&cfg).extract(&frame, &layout);
    assert_eq!(result.questions[0].answer, Answer::Empty);
    assert!(result
        .trace
        .for_question(0)
        .any(|e| e.message.contains("disagreement")));
}

#[test]
fn test_trace_reports_every_option() {
    let frame = SheetBuilder::new(600, 800).mark(0, OptionLabel::C).build();
    let layout = SheetLayout::standard(1).unwrap();
    let result = strategy_for(&config(StrategyKind::Hybrid)).extract(&frame, &layout);

    let observations = &result.questions[0].observations;
    assert_eq!(observations.len(), 4);
    assert!(observations
        .iter()
        .all(|o| o.darkness.is_some() && o.visibility.is_some()));
    assert_eq!(observations[2].darkness, Some(1.0));
    assert_eq!(observations[0].visibility, Some(1.0));
}

#[test]
fn test_darkness_is_idempotent() {
    let frame = SheetBuilder::new(600, 800)
        .answers(&ANSWERS)
        .partial_mark(3, OptionLabel::A, 0.5)
        .build();
    let layout = SheetLayout::standard(20).unwrap();
    let strategy = strategy_for(&config(StrategyKind::Darkness));

    let first = strategy.extract(&frame, &layout);
    let second = strategy.extract(&frame, &layout);
    assert_eq!(first, second);
}
