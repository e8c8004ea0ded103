//! Error types for the avatar crop pipeline.
//!
//! Errors are organized by stage. Intake rejections carry the exact
//! user-facing message in their `Display` impl, since hosts surface it
//! verbatim in a notification.

use thiserror::Error;

/// Top-level error type for avatar operations.
#[derive(Error, Debug)]
pub enum AvatarError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Intake rejected the selected file
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Crop/encode pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Reasons a selected file is refused at intake.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Declared size exceeds the configured limit
    #[error("File size must be less than {max_mb}MB")]
    TooLarge { size: u64, max_mb: u64 },

    /// Declared MIME type is not an image type
    #[error("Please select an image file")]
    WrongType { mime_type: String },
}

/// Crop confirmation and encode errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// The source image could not be decoded
    #[error("Failed to load image {file_name}: {message}")]
    ImageDecode { file_name: String, message: String },

    /// No drawing surface could be allocated for the requested geometry
    #[error("Drawing surface unavailable for a {width}x{height} crop")]
    EncodingUnsupported { width: f64, height: f64 },

    /// Export produced no data
    #[error("Encoding produced no data: {0}")]
    EncodingEmpty(String),

    /// Geometry reported by a crop surface violates its invariants
    #[error("Invalid crop geometry: {0}")]
    InvalidGeometry(String),
}

/// Convenience type alias for avatar results.
pub type Result<T> = std::result::Result<T, AvatarError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_user_facing() {
        let too_large = ValidationError::TooLarge {
            size: 10 * 1024 * 1024,
            max_mb: 5,
        };
        assert_eq!(too_large.to_string(), "File size must be less than 5MB");

        let wrong_type = ValidationError::WrongType {
            mime_type: "application/pdf".to_string(),
        };
        assert_eq!(wrong_type.to_string(), "Please select an image file");
    }

    #[test]
    fn test_validation_wraps_without_prefix() {
        let err: AvatarError = ValidationError::WrongType {
            mime_type: "text/plain".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Please select an image file");
    }
}
