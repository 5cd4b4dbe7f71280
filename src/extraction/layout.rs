use crate::errors::ScanError;
use crate::types::MAX_QUESTIONS;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Option label printed next to each bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionLabel {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(OptionLabel::A),
            "B" => Ok(OptionLabel::B),
            "C" => Ok(OptionLabel::C),
            "D" => Ok(OptionLabel::D),
            other => Err(ScanError::ConfigError(format!("Unknown option '{}'", other))),
        }
    }
}

/// Centre point of a bubble in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BubbleCenter {
    pub x: f32,
    pub y: f32,
}

/// Geometry of the printed answer sheet, as fractions of the frame.
///
/// The answer area is a horizontal band split into equal-width columns that
/// read right to left; within a column, questions run top to bottom. Each
/// question has four bubbles spread evenly across the middle of its column.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetLayout {
    question_count: usize,
    columns: usize,
    rows_per_column: usize,
    band_top: f64,
    band_bottom: f64,
    option_span: f64,
    bubble_radius: f64,
}

impl SheetLayout {
    pub const COLUMNS: usize = 3;
    pub const OPTIONS: usize = 4;
    pub const BAND_TOP: f64 = 0.52;
    pub const BAND_BOTTOM: f64 = 0.85;
    pub const OPTION_SPAN: f64 = 0.75;
    /// Bubble radius relative to the smaller of option spacing and row height
    pub const BUBBLE_RADIUS: f64 = 0.3;

    /// The standard template filled in up to `question_count` questions.
    pub fn standard(question_count: usize) -> Result<Self, ScanError> {
        if question_count == 0 || question_count > MAX_QUESTIONS {
            return Err(ScanError::InvalidLayout(format!(
                "sheet holds 1-{} questions, got {}",
                MAX_QUESTIONS, question_count
            )));
        }
        Ok(Self {
            question_count,
            columns: Self::COLUMNS,
            rows_per_column: MAX_QUESTIONS.div_ceil(Self::COLUMNS),
            band_top: Self::BAND_TOP,
            band_bottom: Self::BAND_BOTTOM,
            option_span: Self::OPTION_SPAN,
            bubble_radius: Self::BUBBLE_RADIUS,
        })
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn rows_per_column(&self) -> usize {
        self.rows_per_column
    }

    /// Column (counted from the left edge) and row of a question.
    pub fn cell_of(&self, question: usize) -> (usize, usize) {
        let from_right = question / self.rows_per_column;
        let row = question % self.rows_per_column;
        (self.columns - 1 - from_right, row)
    }

    fn column_width(&self, width: u32) -> f64 {
        width as f64 / self.columns as f64
    }

    fn row_height(&self, height: u32) -> f64 {
        (self.band_bottom - self.band_top) * height as f64 / self.rows_per_column as f64
    }

    fn option_spacing(&self, width: u32) -> f64 {
        self.column_width(width) * self.option_span / Self::OPTIONS as f64
    }

    pub fn bubble_center(
        &self,
        width: u32,
        height: u32,
        question: usize,
        option: OptionLabel,
    ) -> BubbleCenter {
        let (column, row) = self.cell_of(question);
        let col_w = self.column_width(width);
        let span = col_w * self.option_span;
        let start = column as f64 * col_w + (col_w - span) / 2.0;
        let spacing = self.option_spacing(width);
        let x = start + spacing * (option.index() as f64 + 0.5);

        let row_h = self.row_height(height);
        let y = self.band_top * height as f64 + row_h * (row as f64 + 0.5);

        BubbleCenter {
            x: x as f32,
            y: y as f32,
        }
    }

    /// Bubble radius in pixels for a frame of the given size.
    pub fn bubble_radius(&self, width: u32, height: u32) -> f32 {
        let limit = self.option_spacing(width).min(self.row_height(height));
        (limit * self.bubble_radius).max(1.0) as f32
    }
}
