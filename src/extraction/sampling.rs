use super::layout::BubbleCenter;
use crate::types::Frame;

/// Sub-pixel grid spacing used inside a bubble footprint
pub const SAMPLE_STEP: f32 = 0.5;

/// Fraction of grid samples inside the circle `(center, radius)` whose
/// luminance satisfies `predicate`. Samples falling outside the frame are
/// skipped; a footprint entirely outside the frame yields 0.
pub fn footprint_ratio<F>(frame: &Frame, center: BubbleCenter, radius: f32, predicate: F) -> f64
where
    F: Fn(u8) -> bool,
{
    let r2 = radius * radius;
    let steps = ((2.0 * radius) / SAMPLE_STEP).ceil() as i32;
    let origin_x = center.x - radius + SAMPLE_STEP / 2.0;
    let origin_y = center.y - radius + SAMPLE_STEP / 2.0;

    let mut total = 0u32;
    let mut hits = 0u32;
    for iy in 0..steps {
        let y = origin_y + iy as f32 * SAMPLE_STEP;
        let dy = y - center.y;
        for ix in 0..steps {
            let x = origin_x + ix as f32 * SAMPLE_STEP;
            let dx = x - center.x;
            if dx * dx + dy * dy > r2 {
                continue;
            }
            if let Some(lum) = frame.luminance_at(x, y) {
                total += 1;
                if predicate(lum) {
                    hits += 1;
                }
            }
        }
    }

    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Fraction of footprint samples darker than `threshold`.
pub fn darkness_ratio(frame: &Frame, center: BubbleCenter, radius: f32, threshold: u8) -> f64 {
    footprint_ratio(frame, center, radius, |lum| lum < threshold)
}

/// Fraction of footprint samples at least as light as `threshold`.
pub fn visibility_ratio(frame: &Frame, center: BubbleCenter, radius: f32, threshold: u8) -> f64 {
    footprint_ratio(frame, center, radius, |lum| lum >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic_data::{blank_page, paint_disk};

    #[test]
    fn test_filled_disk_reads_dark() {
        let mut frame = blank_page(100, 100);
        frame = paint_disk(&frame, 50.0, 50.0, 12.0, 20);
        let center = BubbleCenter { x: 50.0, y: 50.0 };
        assert!(darkness_ratio(&frame, center, 10.0, 128) > 0.99);
        assert!(visibility_ratio(&frame, center, 10.0, 160) < 0.01);
    }

    #[test]
    fn test_blank_reads_light() {
        let frame = blank_page(100, 100);
        let center = BubbleCenter { x: 50.0, y: 50.0 };
        assert_eq!(darkness_ratio(&frame, center, 10.0, 128), 0.0);
        assert_eq!(visibility_ratio(&frame, center, 10.0, 160), 1.0);
    }

    #[test]
    fn test_half_filled_disk() {
        let frame = paint_disk(&blank_page(100, 100), 40.0, 50.0, 10.0, 0);
        let center = BubbleCenter { x: 50.0, y: 50.0 };
        let ratio = darkness_ratio(&frame, center, 10.0, 128);
        assert!(ratio > 0.2 && ratio < 0.6, "ratio {}", ratio);
    }

    #[test]
    fn test_footprint_outside_frame() {
        let frame = blank_page(20, 20);
        let center = BubbleCenter { x: -50.0, y: -50.0 };
        assert_eq!(darkness_ratio(&frame, center, 5.0, 128), 0.0);
    }
}
