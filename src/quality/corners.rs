use crate::config::QualityConfig;
use crate::types::Frame;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];
}

/// Best probe-window result for one corner region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CornerReading {
    pub corner: Corner,
    /// Highest dark-pixel ratio of any probe window in the region (0.0-1.0)
    pub max_dark_ratio: f64,
    pub detected: bool,
}

/// Slides a small probe window over each corner region of a frame.
#[derive(Debug, Clone)]
pub struct CornerScanner {
    region_fraction: f64,
    probe_size: u32,
    probe_stride: u32,
    luminance_threshold: u8,
    detection_ratio: f64,
}

impl CornerScanner {
    pub fn new(config: &QualityConfig) -> Self {
        Self {
            region_fraction: config.corner_region_fraction,
            probe_size: config.probe_size.max(1),
            probe_stride: config.probe_stride.max(1),
            luminance_threshold: config.luminance_threshold,
            detection_ratio: config.corner_ratio_threshold,
        }
    }

    /// Edge length in pixels of the square inspected at each corner.
    pub fn region_size(&self, frame: &Frame) -> u32 {
        let min_dim = frame.min_dimension();
        let proportional = (min_dim as f64 * self.region_fraction).round() as u32;
        proportional.max(self.probe_size).min(min_dim / 2).max(1)
    }

    pub fn scan(&self, frame: &Frame) -> [CornerReading; 4] {
        let region = self.region_size(frame);
        Corner::ALL.map(|corner| {
            let (x0, y0) = match corner {
                Corner::TopLeft => (0, 0),
                Corner::TopRight => (frame.width() - region, 0),
                Corner::BottomLeft => (0, frame.height() - region),
                Corner::BottomRight => (frame.width() - region, frame.height() - region),
            };
            let max_dark_ratio = self.best_window_ratio(frame, x0, y0, region);
            CornerReading {
                corner,
                max_dark_ratio,
                detected: max_dark_ratio > self.detection_ratio,
            }
        })
    }

    fn best_window_ratio(&self, frame: &Frame, x0: u32, y0: u32, region: u32) -> f64 {
        let window = self.probe_size.min(region);
        let mut best = 0.0f64;

        let mut wy = 0;
        while wy + window <= region {
            let mut wx = 0;
            while wx + window <= region {
                let ratio = self.window_ratio(frame, x0 + wx, y0 + wy, window);
                if ratio > best {
                    best = ratio;
                }
                wx += self.probe_stride;
            }
            wy += self.probe_stride;
        }

        best
    }

    /// Dark fraction over a `probe_size` x `probe_size` sample grid spread
    /// evenly across a `window` pixel square.
    fn window_ratio(&self, frame: &Frame, left: u32, top: u32, window: u32) -> f64 {
        let samples = self.probe_size;
        let step = window as f64 / samples as f64;
        let mut dark = 0u32;
        for sy in 0..samples {
            let y = top + ((sy as f64 + 0.5) * step) as u32;
            for sx in 0..samples {
                let x = left + ((sx as f64 + 0.5) * step) as u32;
                if frame.luminance(x, y) < self.luminance_threshold {
                    dark += 1;
                }
            }
        }
        dark as f64 / (samples * samples) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic_data::blank_page;

    #[test]
    fn test_region_size_follows_shorter_dimension() {
        let scanner = CornerScanner::new(&QualityConfig::default());
        let frame = blank_page(800, 500);
        assert_eq!(scanner.region_size(&frame), 40);
    }

    #[test]
    fn test_region_size_never_below_probe() {
        let scanner = CornerScanner::new(&QualityConfig::default());
        let frame = blank_page(100, 100);
        assert_eq!(scanner.region_size(&frame), 12);
    }

    #[test]
    fn test_blank_page_has_no_corners() {
        let scanner = CornerScanner::new(&QualityConfig::default());
        let readings = scanner.scan(&blank_page(400, 600));
        assert!(readings.iter().all(|r| !r.detected && r.max_dark_ratio == 0.0));
    }
}
