//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Intake limits applied to a selected file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum declared file size in megabytes (MiB)
    pub max_file_size_mb: u64,

    /// Declared MIME type must start with this prefix
    pub accepted_mime_prefix: String,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 5,
            accepted_mime_prefix: "image/".to_string(),
        }
    }
}

impl LimitsConfig {
    /// Size limit in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

/// Interactive crop surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Lowest zoom factor
    pub min_zoom: f64,

    /// Highest zoom factor
    pub max_zoom: f64,

    /// Zoom slider granularity
    pub zoom_step: f64,

    /// Draw a rule-of-thirds grid over the crop area
    pub show_grid: bool,

    /// Circular crop mask (round avatar preview)
    pub round: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            min_zoom: 1.0,
            max_zoom: 3.0,
            zoom_step: 0.01,
            show_grid: false,
            round: true,
        }
    }
}

/// JPEG encode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// JPEG quality factor in (0, 1]
    pub quality: f32,

    /// Replaces the original extension in the output file name
    pub file_suffix: String,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            quality: 0.92,
            file_suffix: "-cropped.jpg".to_string(),
        }
    }
}

impl EncodeConfig {
    /// Quality on the 1-100 scale used by JPEG encoders.
    pub fn quality_percent(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Where the CLI writes cropped files when no explicit path is given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output directory (supports `~`)
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("~/.avatar/cropped"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
