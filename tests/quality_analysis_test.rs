//! Quality Analysis Testing
//!
//! Corner-mark detection on synthetic sheets:
//! - Tier boundaries by number of printed corners
//! - Region sizing on small and large frames
//! - Luminance threshold and tiny-frame edge cases

use sheetscan::config::QualityConfig;
use sheetscan::quality::{Corner, CornerScanner, FrameQualityAssessor, QualityTier};
use sheetscan::testing::{blank_page, SheetBuilder};

#[test]
fn test_tier_by_corner_count() {
    let assessor = FrameQualityAssessor::default();
    let cases: [(&[Corner], QualityTier); 5] = [
        (&[], QualityTier::Poor),
        (&[Corner::TopLeft], QualityTier::Poor),
        (&[Corner::TopLeft, Corner::TopRight], QualityTier::Good),
        (
            &[Corner::TopLeft, Corner::TopRight, Corner::BottomLeft],
            QualityTier::Excellent,
        ),
        (&Corner::ALL, QualityTier::Excellent),
    ];

    for (corners, tier) in cases {
        let frame = SheetBuilder::new(600, 800).corner_marks(corners).build();
        let quality = assessor.assess(&frame);
        assert_eq!(quality.corners_detected as usize, corners.len());
        assert_eq!(quality.tier, tier, "{} corners", corners.len());
    }
}

#[test]
fn test_detected_corners_named() {
    let frame = SheetBuilder::new(600, 800)
        .corner_marks(&[Corner::BottomLeft, Corner::TopRight])
        .build();
    let quality = FrameQualityAssessor::default().assess(&frame);
    let detected: Vec<Corner> = quality
        .corners
        .iter()
        .filter(|c| c.detected)
        .map(|c| c.corner)
        .collect();
    assert_eq!(detected, vec![Corner::TopRight, Corner::BottomLeft]);
}

#[test]
fn test_confidence_is_mean_of_detected_ratios() {
    let quality = FrameQualityAssessor::default().assess(&SheetBuilder::new(800, 600).build());
    assert_eq!(quality.corners_detected, 4);
    assert!((quality.confidence - 1.0).abs() < 1e-9);
}

#[test]
fn test_marks_in_answer_area_do_not_count() {
    let frame = SheetBuilder::new(600, 800)
        .corner_marks(&[])
        .answers(&["A", "B", "C", "D", "A", "B", "C", "D"])
        .build();
    let quality = FrameQualityAssessor::default().assess(&frame);
    assert_eq!(quality.corners_detected, 0);
}

#[test]
fn test_zero_luminance_threshold_detects_nothing() {
    let config = QualityConfig {
        luminance_threshold: 0,
        ..QualityConfig::default()
    };
    let quality = FrameQualityAssessor::new(&config).assess(&SheetBuilder::new(600, 800).build());
    assert_eq!(quality.corners_detected, 0);
    assert_eq!(quality.tier, QualityTier::Poor);
}

#[test]
fn test_large_frame_region() {
    let scanner = CornerScanner::new(&QualityConfig::default());
    assert_eq!(scanner.region_size(&blank_page(4000, 3000)), 240);
}

#[test]
fn test_tiny_frame_does_not_panic() {
    let quality = FrameQualityAssessor::default().assess(&blank_page(3, 2));
    assert_eq!(quality.corners_detected, 0);

    // zero sizes are raised to a single white pixel
    let empty = blank_page(0, 0);
    assert_eq!((empty.width(), empty.height()), (1, 1));
    assert_eq!(FrameQualityAssessor::default().assess(&empty).corners_detected, 0);
}
