//! Engine configuration.

use crate::scene::ElementKind;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default number of undo states to keep.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Default bound on the inline payload (strokes, image data) carried by one commit.
pub const DEFAULT_MAX_INLINE_PAYLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Default sizes for elements created by placement tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSizes {
    pub rectangle: Size,
    pub ellipse: Size,
    pub diamond: Size,
    pub text: Size,
    pub card: Size,
    pub container: Size,
}

impl Default for DefaultSizes {
    fn default() -> Self {
        Self {
            rectangle: Size::new(160.0, 100.0),
            ellipse: Size::new(140.0, 100.0),
            diamond: Size::new(140.0, 120.0),
            text: Size::new(200.0, 40.0),
            card: Size::new(280.0, 320.0),
            container: Size::new(360.0, 260.0),
        }
    }
}

impl DefaultSizes {
    /// Size of a freshly placed element of the given kind.
    /// Freehand strokes have no default size; their bounds come from the path.
    pub fn for_kind(&self, kind: ElementKind) -> Option<Size> {
        match kind {
            ElementKind::Rectangle => Some(self.rectangle),
            ElementKind::Ellipse => Some(self.ellipse),
            ElementKind::Diamond => Some(self.diamond),
            ElementKind::Text => Some(self.text),
            ElementKind::Card => Some(self.card),
            ElementKind::Container => Some(self.container),
            ElementKind::Freehand => None,
        }
    }
}

/// Tunables for the scene engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of committed states kept for undo.
    pub history_limit: usize,
    /// Width/height floor applied while resizing.
    pub min_element_size: f64,
    /// Padding added around the union bounds when grouping.
    pub group_padding: f64,
    /// Resize handle hit radius, in screen pixels.
    pub handle_tolerance: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Commits whose inline payload exceeds this are logged.
    pub max_inline_payload_bytes: usize,
    pub default_sizes: DefaultSizes,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            min_element_size: 20.0,
            group_padding: 16.0,
            handle_tolerance: 10.0,
            min_zoom: 0.1,
            max_zoom: 10.0,
            max_inline_payload_bytes: DEFAULT_MAX_INLINE_PAYLOAD_BYTES,
            default_sizes: DefaultSizes::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from JSON. Missing fields take
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that zoom bounds form a positive range and that lengths are
    /// finite and non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "min_zoom must be positive, got {}",
                self.min_zoom
            )));
        }
        if !(self.max_zoom.is_finite() && self.max_zoom >= self.min_zoom) {
            return Err(ConfigError::Invalid(format!(
                "max_zoom {} is below min_zoom {}",
                self.max_zoom, self.min_zoom
            )));
        }
        for (name, value) in [
            ("min_element_size", self.min_element_size),
            ("group_padding", self.group_padding),
            ("handle_tolerance", self.handle_tolerance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        for kind in ElementKind::ALL {
            let Some(size) = self.default_sizes.for_kind(kind) else {
                continue;
            };
            if !(size.is_finite() && size.width > 0.0 && size.height > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "default size for {} must be positive, got {}x{}",
                    kind.name(),
                    size.width,
                    size.height
                )));
            }
        }
        Ok(())
    }

    /// Read and parse a JSON configuration file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}
