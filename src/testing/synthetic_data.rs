//! Synthetic answer sheets
//!
//! Frames are painted directly in RGBA: a white page, solid black corner
//! alignment marks and pencil-dark disks at the bubble centres of the
//! standard layout.

use crate::extraction::{OptionLabel, SheetLayout};
use crate::quality::Corner;
use crate::types::{Frame, MAX_QUESTIONS};
use image::{Rgba, RgbaImage};

/// Corner mark edge as a fraction of the shorter frame dimension
pub const CORNER_MARK_FRACTION: f64 = 0.05;
/// Distance of a corner mark from the page edges, same unit
pub const CORNER_MARK_OFFSET: f64 = 0.015;
/// Luminance used for pencil marks
pub const PENCIL: u8 = 30;

fn gray(lum: u8) -> Rgba<u8> {
    Rgba([lum, lum, lum, 255])
}

/// A plain white page with nothing printed on it. Zero dimensions are
/// raised to one pixel.
pub fn blank_page(width: u32, height: u32) -> Frame {
    Frame::from_page(RgbaImage::from_pixel(
        width.max(1),
        height.max(1),
        gray(255),
    ))
}

/// Copy of `frame` with a disk of luminance `lum` painted at `(cx, cy)`.
/// A pixel is painted when its centre lies within `radius`.
pub fn paint_disk(frame: &Frame, cx: f32, cy: f32, radius: f32, lum: u8) -> Frame {
    let r2 = radius * radius;
    let data = frame.data();
    let width = frame.width();
    let image = RgbaImage::from_fn(width, frame.height(), |x, y| {
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        if dx * dx + dy * dy <= r2 {
            gray(lum)
        } else {
            let idx = ((y * width + x) * 4) as usize;
            Rgba([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]])
        }
    });
    Frame::from_page(image)
}

/// Builds a filled-in answer sheet frame.
///
/// By default all four corner marks are printed and no bubble is marked.
#[derive(Debug, Clone)]
pub struct SheetBuilder {
    width: u32,
    height: u32,
    corners: Vec<Corner>,
    /// (question, option, fraction of the bubble area covered)
    marks: Vec<(usize, OptionLabel, f64)>,
}

impl SheetBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            corners: Corner::ALL.to_vec(),
            marks: Vec::new(),
        }
    }

    /// Print only the given corner marks.
    pub fn corner_marks(mut self, corners: &[Corner]) -> Self {
        self.corners = corners.to_vec();
        self
    }

    /// Fully fill the bubble of `option` for zero-based `question`.
    pub fn mark(self, question: usize, option: OptionLabel) -> Self {
        self.partial_mark(question, option, 1.0)
    }

    /// Fill a centred disk covering `coverage` (0.0-1.0) of the bubble area.
    pub fn partial_mark(mut self, question: usize, option: OptionLabel, coverage: f64) -> Self {
        self.marks.push((question, option, coverage.clamp(0.0, 1.0)));
        self
    }

    /// Mark one option per question from wire-form answers; blanks and
    /// unknown labels leave the question unmarked.
    pub fn answers(mut self, answers: &[&str]) -> Self {
        for (question, answer) in answers.iter().enumerate() {
            if let Ok(option) = answer.parse::<OptionLabel>() {
                self = self.mark(question, option);
            }
        }
        self
    }

    pub fn build(&self) -> Frame {
        let min_dim = self.width.min(self.height) as f64;
        let size = (min_dim * CORNER_MARK_FRACTION).round().max(1.0) as u32;
        let offset = (min_dim * CORNER_MARK_OFFSET).round() as u32;

        let squares: Vec<(u32, u32)> = self
            .corners
            .iter()
            .map(|corner| match corner {
                Corner::TopLeft => (offset, offset),
                Corner::TopRight => (self.width.saturating_sub(offset + size), offset),
                Corner::BottomLeft => (offset, self.height.saturating_sub(offset + size)),
                Corner::BottomRight => (
                    self.width.saturating_sub(offset + size),
                    self.height.saturating_sub(offset + size),
                ),
            })
            .collect();

        let page = RgbaImage::from_fn(self.width, self.height, |x, y| {
            let in_mark = squares
                .iter()
                .any(|&(sx, sy)| x >= sx && x < sx + size && y >= sy && y < sy + size);
            if in_mark {
                gray(0)
            } else {
                gray(255)
            }
        });
        let mut frame = Frame::from_page(page);

        let layout = match SheetLayout::standard(MAX_QUESTIONS) {
            Ok(layout) => layout,
            Err(_) => return frame,
        };
        // Slightly oversized so the whole sampling footprint is covered.
        let radius = layout.bubble_radius(self.width, self.height) * 1.2;
        for &(question, option, coverage) in &self.marks {
            if question >= MAX_QUESTIONS || coverage <= 0.0 {
                continue;
            }
            let center = layout.bubble_center(self.width, self.height, question, option);
            let r = if coverage >= 1.0 {
                radius
            } else {
                layout.bubble_radius(self.width, self.height) * coverage.sqrt() as f32
            };
            frame = paint_disk(&frame, center.x, center.y, r, PENCIL);
        }
        frame
    }
}
