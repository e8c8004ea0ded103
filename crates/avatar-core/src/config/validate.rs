//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.accepted_mime_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "limits.accepted_mime_prefix must not be empty".into(),
            ));
        }
        if !(self.surface.min_zoom >= 1.0) {
            return Err(ConfigError::ValidationError(
                "surface.min_zoom must be >= 1.0".into(),
            ));
        }
        if !(self.surface.max_zoom >= self.surface.min_zoom) {
            return Err(ConfigError::ValidationError(
                "surface.max_zoom must be >= surface.min_zoom".into(),
            ));
        }
        if !(self.surface.zoom_step > 0.0) {
            return Err(ConfigError::ValidationError(
                "surface.zoom_step must be > 0".into(),
            ));
        }
        if !(self.encode.quality > 0.0 && self.encode.quality <= 1.0) {
            return Err(ConfigError::ValidationError(
                "encode.quality must be in (0.0, 1.0]".into(),
            ));
        }
        let suffix = self.encode.file_suffix.to_ascii_lowercase();
        if !(suffix.ends_with(".jpg") || suffix.ends_with(".jpeg")) {
            return Err(ConfigError::ValidationError(
                "encode.file_suffix must end in .jpg or .jpeg".into(),
            ));
        }
        Ok(())
    }
}
