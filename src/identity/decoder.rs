use super::payload::IdentityPayload;
use crate::config::{IdentityConfig, RegionConfig};
use crate::errors::ScanError;
use crate::types::Frame;
use image::{imageops, GrayImage};
use rqrr::PreparedImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reads the raw text of a machine-readable marker from a greyscale image.
pub trait MarkerDecoder: Send + Sync {
    fn decode(&self, image: &GrayImage) -> Option<String>;
}

/// QR code decoder backed by `rqrr`.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrMarkerDecoder;

impl MarkerDecoder for QrMarkerDecoder {
    fn decode(&self, image: &GrayImage) -> Option<String> {
        let (w, h) = image.dimensions();
        let mut prepared = PreparedImage::prepare_from_greyscale(w as usize, h as usize, |x, y| {
            image.get_pixel(x as u32, y as u32)[0]
        });
        // A spurious grid may be detected ahead of the real marker.
        prepared
            .detect_grids()
            .iter()
            .find_map(|g| g.decode().ok())
            .map(|(_, content)| content)
    }
}

/// Passes of the decode cascade, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStage {
    FullFrame,
    Enhanced,
    MarkerRegion,
}

impl DecodeStage {
    pub const CASCADE: [DecodeStage; 3] = [
        DecodeStage::FullFrame,
        DecodeStage::Enhanced,
        DecodeStage::MarkerRegion,
    ];
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecodeStage::FullFrame => "full frame",
            DecodeStage::Enhanced => "enhanced frame",
            DecodeStage::MarkerRegion => "marker region",
        };
        f.write_str(s)
    }
}

/// What one cascade pass produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeAttempt {
    pub stage: DecodeStage,
    /// Raw text read by the marker decoder, if any
    pub raw: Option<String>,
}

/// A payload together with the pass that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMarker {
    pub payload: IdentityPayload,
    pub stage: DecodeStage,
    pub attempts: Vec<DecodeAttempt>,
}

/// Runs the three-pass enhancement cascade over a frame.
pub struct IdentityDecoder {
    config: IdentityConfig,
    decoder: Box<dyn MarkerDecoder>,
}

impl IdentityDecoder {
    pub fn new(config: IdentityConfig) -> Self {
        Self::with_decoder(config, Box::new(QrMarkerDecoder))
    }

    pub fn with_decoder(config: IdentityConfig, decoder: Box<dyn MarkerDecoder>) -> Self {
        Self { config, decoder }
    }

    /// Image presented to the marker decoder for `stage`.
    pub fn prepare(&self, frame: &Frame, stage: DecodeStage) -> GrayImage {
        let gray = frame.to_gray_image();
        match stage {
            DecodeStage::FullFrame => gray,
            DecodeStage::Enhanced => {
                let contrasted = imageops::contrast(&gray, self.config.enhance_contrast);
                imageops::brighten(&contrasted, self.config.enhance_brightness)
            }
            DecodeStage::MarkerRegion => {
                let (x, y, w, h) = region_pixels(&self.config.marker_region, &gray);
                let cropped = imageops::crop_imm(&gray, x, y, w, h).to_image();
                imageops::contrast(&cropped, self.config.strong_contrast)
            }
        }
    }

    /// Try each pass in turn and stop at the first readable payload.
    pub fn decode(&self, frame: &Frame) -> Result<DecodedMarker, ScanError> {
        let mut attempts = Vec::with_capacity(DecodeStage::CASCADE.len());

        for stage in DecodeStage::CASCADE {
            let image = self.prepare(frame, stage);
            let raw = self.decoder.decode(&image);
            let payload = raw.as_deref().and_then(IdentityPayload::parse);
            log::debug!(
                "Decode attempt {} ({}): {}",
                attempts.len() + 1,
                stage,
                match (&raw, &payload) {
                    (None, _) => "nothing decoded".to_string(),
                    (Some(raw), None) => format!("unusable payload '{}'", raw),
                    (Some(raw), Some(_)) => format!("payload '{}'", raw),
                }
            );
            attempts.push(DecodeAttempt { stage, raw });

            if let Some(payload) = payload {
                return Ok(DecodedMarker {
                    payload,
                    stage,
                    attempts,
                });
            }
        }

        Err(ScanError::PayloadNotFound {
            attempts: attempts.len(),
        })
    }
}

/// Pixel rectangle of a proportional region, clamped to the image.
fn region_pixels(region: &RegionConfig, image: &GrayImage) -> (u32, u32, u32, u32) {
    let (w, h) = image.dimensions();
    let x = ((region.x * w as f64).round() as u32).min(w.saturating_sub(1));
    let y = ((region.y * h as f64).round() as u32).min(h.saturating_sub(1));
    let width = ((region.width * w as f64).round() as u32).clamp(1, w - x);
    let height = ((region.height * h as f64).round() as u32).clamp(1, h - y);
    (x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic_data::blank_page;
    use std::sync::{Arc, Mutex};

    /// Answers from a script, one entry per call, and records the image sizes it saw.
    struct ScriptedDecoder {
        script: Mutex<Vec<Option<String>>>,
        seen: Arc<Mutex<Vec<(u32, u32)>>>,
    }

    impl ScriptedDecoder {
        fn new(script: Vec<Option<&str>>) -> (Self, Arc<Mutex<Vec<(u32, u32)>>>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let mut script: Vec<Option<String>> =
                script.into_iter().map(|s| s.map(str::to_string)).collect();
            script.reverse();
            (
                Self {
                    script: Mutex::new(script),
                    seen: seen.clone(),
                },
                seen,
            )
        }
    }

    impl MarkerDecoder for ScriptedDecoder {
        fn decode(&self, image: &GrayImage) -> Option<String> {
            self.seen.lock().unwrap().push(image.dimensions());
            self.script.lock().unwrap().pop().flatten()
        }
    }

    #[test]
    fn test_first_pass_success_stops_cascade() {
        let (scripted, seen) = ScriptedDecoder::new(vec![Some("R1|quiz1|1|A|B")]);
        let decoder = IdentityDecoder::with_decoder(IdentityConfig::default(), Box::new(scripted));
        let marker = decoder.decode(&blank_page(200, 100)).unwrap();
        assert_eq!(marker.stage, DecodeStage::FullFrame);
        assert_eq!(marker.payload.external_id, "R1");
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_third_pass_uses_marker_region() {
        let (scripted, seen) = ScriptedDecoder::new(vec![None, None, Some("R175069452")]);
        let decoder = IdentityDecoder::with_decoder(IdentityConfig::default(), Box::new(scripted));
        let marker = decoder.decode(&blank_page(200, 100)).unwrap();
        assert_eq!(marker.stage, DecodeStage::MarkerRegion);
        assert_eq!(marker.attempts.len(), 3);
        // right 35% x top 35%
        assert_eq!(*seen.lock().unwrap(), vec![(200, 100), (200, 100), (70, 35)]);
    }

    #[test]
    fn test_exhausted_cascade() {
        let (scripted, _) = ScriptedDecoder::new(vec![None, Some("  |x"), None]);
        let decoder = IdentityDecoder::with_decoder(IdentityConfig::default(), Box::new(scripted));
        let err = decoder.decode(&blank_page(50, 50)).unwrap_err();
        assert!(matches!(err, ScanError::PayloadNotFound { attempts: 3 }));
    }

    #[test]
    fn test_qr_decoder_finds_nothing_on_blank_page() {
        let gray = blank_page(64, 64).to_gray_image();
        assert_eq!(QrMarkerDecoder.decode(&gray), None);
    }

    #[test]
    fn test_region_pixels_clamped() {
        let gray = blank_page(10, 10).to_gray_image();
        let region = RegionConfig {
            x: 0.95,
            y: 0.0,
            width: 0.5,
            height: 1.0,
        };
        assert_eq!(region_pixels(&region, &gray), (9, 0, 1, 10));
    }
}
