//! Core data types shared across the scanning pipeline.

use crate::errors::ScanError;
use chrono::{DateTime, Utc};
use image::{DynamicImage, GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};

/// Largest number of questions the printed sheet can hold.
pub const MAX_QUESTIONS: usize = 20;

/// Immutable RGBA pixel buffer captured at one instant.
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
    captured_at: DateTime<Utc>,
}

impl Frame {
    /// Wrap a raw RGBA buffer. The buffer must hold exactly `width * height * 4` bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ScanError> {
        if width == 0 || height == 0 {
            return Err(ScanError::InvalidFrame(format!(
                "frame dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(ScanError::InvalidFrame(format!(
                "expected {} RGBA bytes for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            captured_at: Utc::now(),
        })
    }

    /// Convert a decoded image (any color type) into a frame.
    pub fn from_image(image: &DynamicImage) -> Result<Self, ScanError> {
        let rgba: RgbaImage = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
    }

    /// Wrap a painted page whose dimensions are already known to be non-zero.
    pub(crate) fn from_page(page: RgbaImage) -> Self {
        let (width, height) = page.dimensions();
        debug_assert!(width > 0 && height > 0);
        Self {
            width,
            height,
            data: page.into_raw(),
            captured_at: Utc::now(),
        }
    }

    /// Load a frame from an image file on disk.
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| {
            ScanError::InvalidFrame(format!("failed to load {}: {}", path.display(), e))
        })?;
        Self::from_image(&image)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Shorter of the two frame dimensions.
    pub fn min_dimension(&self) -> u32 {
        self.width.min(self.height)
    }

    /// BT.601 luminance of the pixel at `(x, y)`. Coordinates are clamped to the frame.
    #[inline]
    pub fn luminance(&self, x: u32, y: u32) -> u8 {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let idx = (y * self.width as usize + x) * 4;
        let r = self.data[idx] as u32;
        let g = self.data[idx + 1] as u32;
        let b = self.data[idx + 2] as u32;
        ((77 * r + 150 * g + 29 * b) >> 8) as u8
    }

    /// Luminance at a sub-pixel position, using the pixel that contains it.
    /// Returns `None` outside the frame.
    #[inline]
    pub fn luminance_at(&self, x: f32, y: f32) -> Option<u8> {
        if x < 0.0 || y < 0.0 || x >= self.width as f32 || y >= self.height as f32 {
            return None;
        }
        Some(self.luminance(x as u32, y as u32))
    }

    /// Greyscale copy of the whole frame.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([self.luminance(x, y)])
        })
    }
}

/// A student known to the external directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub external_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

/// Quiz entity as supplied by the surrounding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub total_questions: usize,
    #[serde(default)]
    pub max_score: f64,
    #[serde(default)]
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub question_points: Vec<f64>,
}

impl Quiz {
    /// The quiz's answer key, or `None` when no correct answers were entered.
    pub fn answer_key(&self) -> Option<AnswerKey> {
        if self.correct_answers.is_empty() {
            return None;
        }
        Some(AnswerKey {
            correct_answers: self.correct_answers.clone(),
            question_points: self.question_points.clone(),
        })
    }

    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let quiz: Quiz = if is_json {
            serde_json::from_str(&contents)
                .map_err(|e| ScanError::ConfigError(format!("Failed to parse quiz: {}", e)))?
        } else {
            toml::from_str(&contents)
                .map_err(|e| ScanError::ConfigError(format!("Failed to parse quiz: {}", e)))?
        };
        if quiz.total_questions == 0 || quiz.total_questions > MAX_QUESTIONS {
            return Err(ScanError::InvalidLayout(format!(
                "quiz '{}' has {} questions, sheet supports 1-{}",
                quiz.id, quiz.total_questions, MAX_QUESTIONS
            )));
        }
        Ok(quiz)
    }
}

/// Ordered correct options plus per-question point values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKey {
    pub correct_answers: Vec<String>,
    pub question_points: Vec<f64>,
}

impl AnswerKey {
    /// Point value of question `index`. Questions without a configured value are worth 1.
    pub fn points_for(&self, index: usize) -> f64 {
        self.question_points.get(index).copied().unwrap_or(1.0)
    }
}
