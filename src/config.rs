//! Configuration management for SheetScan
//!
//! Provides loading, saving, validation and settings-store overlay for the
//! tunable thresholds and weights of the scanning pipeline.

use crate::errors::ScanError;
use crate::store::SettingsProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub quality: QualityConfig,
    pub identity: IdentityConfig,
    pub extraction: ExtractionConfig,
    pub session: SessionConfig,
}

/// Corner-mark frame quality assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Corner region edge as a fraction of the shorter frame dimension
    pub corner_region_fraction: f64,
    /// Probe window edge in samples
    pub probe_size: u32,
    /// Probe window stride in pixels
    pub probe_stride: u32,
    /// Pixels below this luminance count as dark (0-255)
    pub luminance_threshold: u8,
    /// A corner is detected when its best window dark ratio exceeds this (0.0-1.0)
    pub corner_ratio_threshold: f64,
    /// Assessor cadence while the session is armed
    pub tick_interval_ms: u64,
}

/// Proportional rectangle within the frame (all values 0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Identity marker decoding cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Region reserved for the marker on the printed sheet
    pub marker_region: RegionConfig,
    /// Contrast adjustment (percent) for the full-frame enhancement pass
    pub enhance_contrast: f32,
    /// Brightness offset for the full-frame enhancement pass
    pub enhance_brightness: i32,
    /// Contrast adjustment (percent) for the cropped marker pass
    pub strong_contrast: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Darkness,
    Visibility,
    #[default]
    Hybrid,
}

/// Resolution when more than one option crosses the darkness mark threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultipleAnswerPolicy {
    /// Keep the darkest option
    #[default]
    Best,
    /// Keep the first marked option in scan order
    First,
    /// Report the `MULTIPLE` sentinel
    Reject,
}

/// Resolution when the darkness and visibility strategies disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    PreferDarkness,
    PreferVisibility,
    #[default]
    HigherConfidence,
}

macro_rules! impl_str_enum {
    ($ty:ty, $what:literal, { $($name:literal => $variant:path),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = ScanError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    other => Err(ScanError::ConfigError(format!(
                        "Unknown {} '{}'", $what, other
                    ))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let name = match self {
                    $($variant => $name,)+
                };
                f.write_str(name)
            }
        }
    };
}

impl_str_enum!(StrategyKind, "extraction strategy", {
    "darkness" => StrategyKind::Darkness,
    "visibility" => StrategyKind::Visibility,
    "hybrid" => StrategyKind::Hybrid,
});

impl_str_enum!(MultipleAnswerPolicy, "multiple-answer policy", {
    "best" => MultipleAnswerPolicy::Best,
    "first" => MultipleAnswerPolicy::First,
    "reject" => MultipleAnswerPolicy::Reject,
});

impl_str_enum!(ConflictPolicy, "conflict policy", {
    "prefer_darkness" => ConflictPolicy::PreferDarkness,
    "prefer_visibility" => ConflictPolicy::PreferVisibility,
    "higher_confidence" => ConflictPolicy::HigherConfidence,
});

/// Darkness-based extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DarknessConfig {
    /// Pixels below this luminance count as pencil (0-255)
    pub luminance_threshold: u8,
    /// Darkness ratio above which an option is marked (0.0-1.0)
    pub mark_threshold: f64,
    /// Lower ratio accepted for a lone faint mark (0.0-1.0)
    pub min_fill_threshold: f64,
    pub multiple_policy: MultipleAnswerPolicy,
    /// Confidence scale for a faint mark accepted below the mark threshold
    pub fallback_factor: f64,
    /// Confidence scale for exactly one marked option
    pub single_factor: f64,
    /// Confidence scale when a multiple-answer policy picks one option
    pub multiple_factor: f64,
}

/// Visibility-based extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Pixels at or above this luminance count as paper (0-255)
    pub light_threshold: u8,
    /// Visibility below which the printed option is hidden (0.0-1.0)
    pub hidden_threshold: f64,
}

/// Hybrid fusion of darkness and visibility readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    pub darkness_weight: f64,
    pub visibility_weight: f64,
    pub conflict_policy: ConflictPolicy,
    pub prefer_darkness_damping: f64,
    pub prefer_visibility_damping: f64,
    pub higher_confidence_damping: f64,
}

/// Answer extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub strategy: StrategyKind,
    pub darkness: DarknessConfig,
    pub visibility: VisibilityConfig,
    pub hybrid: HybridConfig,
}

/// Scanning session behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Captures arriving sooner than this after the previous one are ignored
    pub min_capture_interval_ms: u64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            corner_region_fraction: 0.08,
            probe_size: 12,
            probe_stride: 4,
            luminance_threshold: 80,
            corner_ratio_threshold: 0.4,
            tick_interval_ms: 150,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            marker_region: RegionConfig {
                x: 0.65,
                y: 0.0,
                width: 0.35,
                height: 0.35,
            },
            enhance_contrast: 50.0,
            enhance_brightness: 10,
            strong_contrast: 100.0,
        }
    }
}

impl Default for DarknessConfig {
    fn default() -> Self {
        Self {
            luminance_threshold: 128,
            mark_threshold: 0.20,
            min_fill_threshold: 0.15,
            multiple_policy: MultipleAnswerPolicy::Best,
            fallback_factor: 0.6,
            single_factor: 0.9,
            multiple_factor: 0.75,
        }
    }
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            light_threshold: 160,
            hidden_threshold: 0.40,
        }
    }
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            darkness_weight: 0.4,
            visibility_weight: 0.6,
            conflict_policy: ConflictPolicy::HigherConfidence,
            prefer_darkness_damping: 0.8,
            prefer_visibility_damping: 0.8,
            higher_confidence_damping: 0.7,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_capture_interval_ms: 1500,
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ScanError> {
    value.trim().parse::<T>().map_err(|_| {
        ScanError::ConfigError(format!("Invalid value '{}' for setting '{}'", value, key))
    })
}

fn check_unit(name: &str, value: f64) -> Result<(), ScanError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ScanError::ConfigError(format!(
            "{} must be between 0.0 and 1.0, got {}",
            name, value
        )));
    }
    Ok(())
}

impl ScanConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScanError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ScanError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: ScanConfig = toml::from_str(&contents)
            .map_err(|e| ScanError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ScanError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ScanError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("sheetscan.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Defaults overlaid with every recognized key of a settings store.
    pub fn from_settings(settings: &dyn SettingsProvider) -> Result<Self, ScanError> {
        let mut config = Self::default();
        config.apply_settings(settings)?;
        Ok(config)
    }

    /// Overlay recognized keys of a settings store. Unknown keys are ignored.
    pub fn apply_settings(&mut self, settings: &dyn SettingsProvider) -> Result<(), ScanError> {
        for (key, value) in settings.entries() {
            if !self.apply_setting(&key, &value)? {
                log::warn!("Ignoring unknown setting '{}'", key);
            }
        }
        self.validate()
    }

    /// Apply a single key/value pair. Returns `false` when the key is unknown.
    pub fn apply_setting(&mut self, key: &str, value: &str) -> Result<bool, ScanError> {
        let darkness = &mut self.extraction.darkness;
        let visibility = &mut self.extraction.visibility;
        let hybrid = &mut self.extraction.hybrid;
        match key {
            "extraction.strategy" => self.extraction.strategy = value.parse()?,
            "darkness.luminance_threshold" => darkness.luminance_threshold = parse_value(key, value)?,
            "darkness.mark_threshold" => darkness.mark_threshold = parse_value(key, value)?,
            "darkness.min_fill_threshold" => darkness.min_fill_threshold = parse_value(key, value)?,
            "darkness.multiple_policy" => darkness.multiple_policy = value.parse()?,
            "darkness.fallback_factor" => darkness.fallback_factor = parse_value(key, value)?,
            "darkness.single_factor" => darkness.single_factor = parse_value(key, value)?,
            "darkness.multiple_factor" => darkness.multiple_factor = parse_value(key, value)?,
            "visibility.light_threshold" => visibility.light_threshold = parse_value(key, value)?,
            "visibility.hidden_threshold" => visibility.hidden_threshold = parse_value(key, value)?,
            "hybrid.darkness_weight" => hybrid.darkness_weight = parse_value(key, value)?,
            "hybrid.visibility_weight" => hybrid.visibility_weight = parse_value(key, value)?,
            "hybrid.conflict_policy" => hybrid.conflict_policy = value.parse()?,
            "hybrid.prefer_darkness_damping" => {
                hybrid.prefer_darkness_damping = parse_value(key, value)?
            }
            "hybrid.prefer_visibility_damping" => {
                hybrid.prefer_visibility_damping = parse_value(key, value)?
            }
            "hybrid.higher_confidence_damping" => {
                hybrid.higher_confidence_damping = parse_value(key, value)?
            }
            "quality.luminance_threshold" => {
                self.quality.luminance_threshold = parse_value(key, value)?
            }
            "quality.corner_ratio_threshold" => {
                self.quality.corner_ratio_threshold = parse_value(key, value)?
            }
            "session.min_capture_interval_ms" => {
                self.session.min_capture_interval_ms = parse_value(key, value)?
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ScanError> {
        let q = &self.quality;
        check_unit("Corner region fraction", q.corner_region_fraction)?;
        check_unit("Corner ratio threshold", q.corner_ratio_threshold)?;
        if q.probe_size == 0 || q.probe_stride == 0 {
            return Err(ScanError::ConfigError(
                "Probe size and stride must be non-zero".to_string(),
            ));
        }
        if q.tick_interval_ms == 0 {
            return Err(ScanError::ConfigError(
                "Quality tick interval must be non-zero".to_string(),
            ));
        }

        let r = &self.identity.marker_region;
        for (name, v) in [("x", r.x), ("y", r.y), ("width", r.width), ("height", r.height)] {
            check_unit(&format!("Marker region {}", name), v)?;
        }
        if r.width == 0.0 || r.height == 0.0 || r.x + r.width > 1.0 + 1e-9 || r.y + r.height > 1.0 + 1e-9 {
            return Err(ScanError::ConfigError(
                "Marker region must be non-empty and inside the frame".to_string(),
            ));
        }

        let d = &self.extraction.darkness;
        check_unit("Darkness mark threshold", d.mark_threshold)?;
        check_unit("Darkness minimum fill threshold", d.min_fill_threshold)?;
        check_unit("Darkness fallback factor", d.fallback_factor)?;
        check_unit("Darkness single factor", d.single_factor)?;
        check_unit("Darkness multiple factor", d.multiple_factor)?;
        if d.min_fill_threshold > d.mark_threshold {
            return Err(ScanError::ConfigError(
                "Minimum fill threshold must not exceed the mark threshold".to_string(),
            ));
        }

        check_unit(
            "Visibility hidden threshold",
            self.extraction.visibility.hidden_threshold,
        )?;

        let h = &self.extraction.hybrid;
        let usable = |w: f64| w.is_finite() && w >= 0.0;
        if !usable(h.darkness_weight) || !usable(h.visibility_weight) {
            return Err(ScanError::ConfigError(
                "Hybrid weights must be finite and non-negative".to_string(),
            ));
        }
        if h.darkness_weight + h.visibility_weight == 0.0 {
            return Err(ScanError::ConfigError(
                "Hybrid weights must not both be zero".to_string(),
            ));
        }
        check_unit("Prefer-darkness damping", h.prefer_darkness_damping)?;
        check_unit("Prefer-visibility damping", h.prefer_visibility_damping)?;
        check_unit("Higher-confidence damping", h.higher_confidence_damping)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemorySettings;

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.quality.tick_interval_ms, 150);
        assert_eq!(config.extraction.darkness.mark_threshold, 0.20);
        assert_eq!(config.extraction.hybrid.darkness_weight, 0.4);
        assert_eq!(config.session.min_capture_interval_ms, 1500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut bad = ScanConfig::default();
        bad.extraction.darkness.mark_threshold = 1.5;
        assert!(bad.validate().is_err());

        let mut bad_weights = ScanConfig::default();
        bad_weights.extraction.hybrid.darkness_weight = 0.0;
        bad_weights.extraction.hybrid.visibility_weight = 0.0;
        assert!(bad_weights.validate().is_err());

        let mut bad_region = ScanConfig::default();
        bad_region.identity.marker_region.x = 0.9;
        assert!(bad_region.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("sheetscan.toml");

        let mut config = ScanConfig::default();
        config.extraction.strategy = StrategyKind::Darkness;
        config.extraction.darkness.multiple_policy = MultipleAnswerPolicy::Reject;
        config.save_to_file(&config_path).unwrap();

        let loaded = ScanConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_toml_format() {
        let toml_string = toml::to_string_pretty(&ScanConfig::default()).unwrap();
        assert!(toml_string.contains("[quality]"));
        assert!(toml_string.contains("[extraction.darkness]"));
        assert!(toml_string.contains("[extraction.hybrid]"));
        assert!(toml_string.contains("conflict_policy = \"higher_confidence\""));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ScanConfig = toml::from_str(
            "[extraction]\nstrategy = \"visibility\"\n",
        )
        .unwrap();
        assert_eq!(config.extraction.strategy, StrategyKind::Visibility);
        assert_eq!(config.extraction.visibility.hidden_threshold, 0.40);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ScanConfig::load_from_file("nonexistent_sheetscan.toml");
        assert_eq!(result.unwrap(), ScanConfig::default());
    }

    #[test]
    fn test_settings_overlay() {
        let settings = InMemorySettings::new();
        settings.set("extraction.strategy", "darkness");
        settings.set("darkness.multiple_policy", "first");
        settings.set("hybrid.conflict_policy", "prefer_visibility");
        settings.set("ui.theme", "dark");

        let config = ScanConfig::from_settings(&settings).unwrap();
        assert_eq!(config.extraction.strategy, StrategyKind::Darkness);
        assert_eq!(
            config.extraction.darkness.multiple_policy,
            MultipleAnswerPolicy::First
        );
        assert_eq!(
            config.extraction.hybrid.conflict_policy,
            ConflictPolicy::PreferVisibility
        );
    }

    #[test]
    fn test_non_finite_hybrid_weights_rejected() {
        let mut nan = ScanConfig::default();
        nan.extraction.hybrid.visibility_weight = f64::NAN;
        assert!(nan.validate().is_err());

        let mut infinite = ScanConfig::default();
        infinite.extraction.hybrid.darkness_weight = f64::INFINITY;
        assert!(infinite.validate().is_err());

        let settings = InMemorySettings::new();
        settings.set("hybrid.darkness_weight", "NaN");
        assert!(matches!(
            ScanConfig::from_settings(&settings),
            Err(ScanError::ConfigError(_))
        ));
    }

    #[test]
    fn test_settings_overlay_rejects_bad_value() {
        let settings = InMemorySettings::new();
        settings.set("darkness.mark_threshold", "lots");
        assert!(matches!(
            ScanConfig::from_settings(&settings),
            Err(ScanError::ConfigError(_))
        ));
    }

    #[test]
    fn test_enum_round_trip() {
        for policy in [
            ConflictPolicy::PreferDarkness,
            ConflictPolicy::PreferVisibility,
            ConflictPolicy::HigherConfidence,
        ] {
            assert_eq!(policy.to_string().parse::<ConflictPolicy>().unwrap(), policy);
        }
        assert!("sideways".parse::<StrategyKind>().is_err());
    }
}
