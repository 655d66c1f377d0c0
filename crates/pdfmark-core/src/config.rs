//! Engine configuration.

use crate::color::normalize_hex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest zoom scale the engine will display.
pub const MIN_SCALE: f64 = 0.3;
/// Largest zoom scale the engine will display.
pub const MAX_SCALE: f64 = 3.0;
/// Maximum number of history snapshots kept.
pub const HISTORY_CAPACITY: usize = 200;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables for the annotation engine.
///
/// Every field has a default, so a JSON document only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lower zoom bound.
    pub min_scale: f64,
    /// Upper zoom bound.
    pub max_scale: f64,
    /// Scale used when a document is first shown.
    pub initial_scale: f64,
    /// Multiplicative step for the zoom in/out buttons.
    pub zoom_step: f64,
    /// Exponential factor applied to wheel deltas while the precision modifier is held.
    pub wheel_zoom_sensitivity: f64,
    /// Exponent applied to the finger separation ratio of a pinch.
    pub pinch_exponent: f64,
    /// Number of history snapshots retained.
    pub history_capacity: usize,
    /// Lower clamp for the device display scale factor.
    pub min_display_scale: f64,
    /// Upper clamp for the device display scale factor.
    pub max_display_scale: f64,
    /// Stroke color for new annotations and for malformed markup colors.
    pub default_color: String,
    /// Stroke width for new annotations and for markup without a width.
    pub default_stroke_width: f64,
    /// Minimum pointer travel (logical pixels) between sampled ink points.
    pub ink_sample_distance: f64,
    /// Maximum delay between two presses of a double-click.
    pub double_click_ms: u64,
    /// Maximum distance between two presses of a double-click.
    pub double_click_distance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            initial_scale: 1.0,
            zoom_step: 1.2,
            wheel_zoom_sensitivity: 0.0015,
            pinch_exponent: 1.3,
            history_capacity: HISTORY_CAPACITY,
            min_display_scale: 1.0,
            max_display_scale: 2.0,
            default_color: crate::color::DEFAULT_COLOR.to_string(),
            default_stroke_width: 2.0,
            ink_sample_distance: 1.0,
            double_click_ms: 500,
            double_click_distance: 5.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that the values are usable together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |value: f64| value.is_finite() && value > 0.0;

        if !positive(self.min_scale) || !positive(self.max_scale) || self.min_scale > self.max_scale {
            return Err(ConfigError::Invalid(format!(
                "scale bounds [{}, {}] are not a positive range",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.min_scale..=self.max_scale).contains(&self.initial_scale) {
            return Err(ConfigError::Invalid(format!(
                "initial scale {} is outside [{}, {}]",
                self.initial_scale, self.min_scale, self.max_scale
            )));
        }
        if !positive(self.zoom_step) || self.zoom_step <= 1.0 {
            return Err(ConfigError::Invalid("zoom step must be greater than 1".into()));
        }
        if !positive(self.wheel_zoom_sensitivity) || !positive(self.pinch_exponent) {
            return Err(ConfigError::Invalid(
                "wheel sensitivity and pinch exponent must be positive".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid("history capacity must be at least 1".into()));
        }
        if !positive(self.min_display_scale) || self.min_display_scale > self.max_display_scale {
            return Err(ConfigError::Invalid(format!(
                "display scale clamp [{}, {}] is not a positive range",
                self.min_display_scale, self.max_display_scale
            )));
        }
        if normalize_hex(&self.default_color).is_none() {
            return Err(ConfigError::Invalid(format!(
                "default color {:?} is not a hex color",
                self.default_color
            )));
        }
        if !positive(self.default_stroke_width) {
            return Err(ConfigError::Invalid("default stroke width must be positive".into()));
        }
        if !self.ink_sample_distance.is_finite() || self.ink_sample_distance < 0.0 {
            return Err(ConfigError::Invalid("ink sample distance must not be negative".into()));
        }
        Ok(())
    }
}
