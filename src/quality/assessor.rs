use super::corners::{CornerReading, CornerScanner};
use crate::config::QualityConfig;
use crate::types::Frame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Readiness tier derived from the number of detected corner marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Poor,
    Good,
    Excellent,
}

impl QualityTier {
    pub fn from_corner_count(corners: u8) -> Self {
        match corners {
            3.. => QualityTier::Excellent,
            2 => QualityTier::Good,
            _ => QualityTier::Poor,
        }
    }

    /// Whether the sheet is framed well enough to suggest a capture.
    pub fn is_ready(&self) -> bool {
        *self >= QualityTier::Good
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QualityTier::Poor => "poor",
            QualityTier::Good => "good",
            QualityTier::Excellent => "excellent",
        };
        f.write_str(s)
    }
}

/// Advisory quality report for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameQuality {
    /// Number of corner marks found (0-4)
    pub corners_detected: u8,
    pub tier: QualityTier,
    /// Mean dark ratio of the detected corners (0.0-1.0), 0 when none were found
    pub confidence: f64,
    pub corners: [CornerReading; 4],
}

impl FrameQuality {
    pub fn is_ready(&self) -> bool {
        self.tier.is_ready()
    }
}

/// Scores frames for the presence of the four corner alignment marks.
#[derive(Debug, Clone)]
pub struct FrameQualityAssessor {
    scanner: CornerScanner,
}

impl FrameQualityAssessor {
    pub fn new(config: &QualityConfig) -> Self {
        Self {
            scanner: CornerScanner::new(config),
        }
    }

    pub fn assess(&self, frame: &Frame) -> FrameQuality {
        let corners = self.scanner.scan(frame);

        let detected: Vec<f64> = corners
            .iter()
            .filter(|c| c.detected)
            .map(|c| c.max_dark_ratio)
            .collect();
        let corners_detected = detected.len() as u8;
        let confidence = if detected.is_empty() {
            0.0
        } else {
            detected.iter().sum::<f64>() / detected.len() as f64
        };
        let tier = QualityTier::from_corner_count(corners_detected);

        log::debug!(
            "Frame {}x{}: {} corners, tier={}, confidence={:.3}",
            frame.width(),
            frame.height(),
            corners_detected,
            tier,
            confidence
        );

        FrameQuality {
            corners_detected,
            tier,
            confidence,
            corners,
        }
    }
}

impl Default for FrameQualityAssessor {
    fn default() -> Self {
        Self::new(&QualityConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::Corner;
    use crate::testing::synthetic_data::{blank_page, SheetBuilder};

    #[test]
    fn test_tier_from_corner_count() {
        assert_eq!(QualityTier::from_corner_count(0), QualityTier::Poor);
        assert_eq!(QualityTier::from_corner_count(1), QualityTier::Poor);
        assert_eq!(QualityTier::from_corner_count(2), QualityTier::Good);
        assert_eq!(QualityTier::from_corner_count(3), QualityTier::Excellent);
        assert_eq!(QualityTier::from_corner_count(4), QualityTier::Excellent);
    }

    #[test]
    fn test_full_sheet_is_excellent() {
        let frame = SheetBuilder::new(600, 800).build();
        let quality = FrameQualityAssessor::default().assess(&frame);
        assert_eq!(quality.corners_detected, 4);
        assert_eq!(quality.tier, QualityTier::Excellent);
        assert!(quality.confidence > 0.9);
        assert!(quality.is_ready());
    }

    #[test]
    fn test_two_corners_is_good() {
        let frame = SheetBuilder::new(600, 800)
            .corner_marks(&[Corner::TopLeft, Corner::BottomRight])
            .build();
        let quality = FrameQualityAssessor::default().assess(&frame);
        assert_eq!(quality.corners_detected, 2);
        assert_eq!(quality.tier, QualityTier::Good);
    }

    #[test]
    fn test_blank_page_is_poor() {
        let quality = FrameQualityAssessor::default().assess(&blank_page(600, 800));
        assert_eq!(quality.corners_detected, 0);
        assert_eq!(quality.tier, QualityTier::Poor);
        assert_eq!(quality.confidence, 0.0);
        assert!(!quality.is_ready());
    }
}
