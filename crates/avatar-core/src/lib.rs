//! Avatar Core - profile photo intake, square cropping, and JPEG encoding.
//!
//! A selected photo goes through a small state machine before it is ready
//! for upload:
//!
//! ```text
//! File → Validate (size, MIME) → Crop surface (pan/zoom) → Confirm → Decode → Render → JPEG
//! ```
//!
//! Upload and persistence belong to the host.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use avatar_core::{Avatar, Config, LogNotifier, SelectedImage};
//!
//! #[tokio::main]
//! async fn main() -> avatar_core::Result<()> {
//!     let avatar = Avatar::new(Config::load()?);
//!     let mut session = avatar.session(Arc::new(LogNotifier));
//!
//!     let bytes = std::fs::read("photo.jpg")?;
//!     session.select(Some(SelectedImage::new(bytes, "image/jpeg", "photo.jpg")))?;
//!     session.surface_mut().map(|s| s.set_zoom(1.5));
//!     session.confirm().await?;
//!
//!     let cropped = session.take_cropped().expect("cropped");
//!     println!("{} ({} bytes)", cropped.file_name, cropped.size());
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{AvatarError, ConfigError, PipelineError, PipelineResult, Result, ValidationError};
pub use output::{CropReport, InspectReport};
pub use pipeline::{
    ChannelNotifier, Confirmation, CropSession, CropState, CropSurface, LogNotifier,
    Notification, NotificationLevel, Notifier, RecordingNotifier, SurfaceOptions, Validator,
};
pub use types::{CropGeometry, CroppedImage, FileSelection, SelectedImage};

use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Entry point holding validated configuration.
pub struct Avatar {
    config: Config,
}

impl Avatar {
    /// Create an instance with the given configuration.
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing avatar v{}", VERSION);
        Self { config }
    }

    /// Create an instance from the default config file.
    pub fn with_defaults() -> Result<Self> {
        let config = Config::load()?;
        Ok(Self::new(config))
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start a new upload attempt.
    pub fn session(&self, notifier: Arc<dyn Notifier>) -> CropSession {
        CropSession::new(&self.config, notifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_session_starts_idle() {
        let avatar = Avatar::new(Config::default());
        assert_eq!(avatar.config().limits.max_file_size_mb, 5);
        let session = avatar.session(Arc::new(RecordingNotifier::new()));
        assert!(matches!(session.state(), CropState::Idle));
    }
}
