//! Avatar crop pipeline components.
//!
//! - **intake**: Declared size/MIME checks on a selected file
//! - **surface**: Pan/zoom state of the interactive crop surface
//! - **source**: Temporary object URLs feeding the decoder
//! - **decode**: Source decoding with EXIF orientation
//! - **encode**: Square rendering and JPEG export
//! - **notify**: User-facing notifications
//! - **session**: The state machine tying the stages together

pub mod decode;
pub mod encode;
pub mod intake;
pub mod notify;
pub mod session;
pub mod source;
pub mod surface;

// Re-exports for convenient access
pub use decode::{DecodedImage, ImageDecoder, SourceInfo};
pub use encode::{CropEncoder, FrameExporter, JpegExporter};
pub use intake::Validator;
pub use notify::{
    ChannelNotifier, LogNotifier, Notification, NotificationLevel, Notifier, RecordingNotifier,
};
pub use session::{Confirmation, CropSession, CropState};
pub use source::{MemoryRegistry, ObjectUrl, SourceRegistry, SourceUrl};
pub use surface::{CropSurface, SurfaceOptions};
