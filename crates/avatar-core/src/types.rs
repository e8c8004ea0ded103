//! Core data types for the avatar crop pipeline.
//!
//! These types carry a photo from selection, through the crop surface,
//! to the encoded square JPEG handed back to the host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::PipelineError;

/// MIME type of every cropped output.
pub const JPEG_MIME: &str = "image/jpeg";

/// The user's chosen original file, as delivered by a file picker.
#[derive(Clone)]
pub struct SelectedImage {
    /// Raw file content, shared so a confirm attempt can borrow it cheaply
    content: Arc<[u8]>,

    /// MIME type declared by the picker (not verified against content)
    pub mime_type: String,

    /// Declared byte size
    pub size: u64,

    /// File name including extension
    pub file_name: String,
}

impl SelectedImage {
    /// Create a selection whose declared size is the content length.
    pub fn new(
        content: impl Into<Arc<[u8]>>,
        mime_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            size: content.len() as u64,
            content,
            mime_type: mime_type.into(),
            file_name: file_name.into(),
        }
    }

    /// Override the declared size.
    ///
    /// Pickers report size independently of content; intake trusts the
    /// declared value.
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Borrow the file content.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub(crate) fn shared_content(&self) -> Arc<[u8]> {
        Arc::clone(&self.content)
    }
}

impl fmt::Debug for SelectedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedImage")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .finish()
    }
}

/// A file picker change event: zero or one file.
pub type FileSelection = Option<SelectedImage>;

/// Square crop rectangle and zoom, in source-image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropGeometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    /// Zoom factor the surface was at when this geometry was emitted (>= 1)
    pub zoom: f64,
}

impl CropGeometry {
    /// Build a square geometry.
    pub fn square(x: f64, y: f64, side: f64, zoom: f64) -> Self {
        Self {
            x,
            y,
            width: side,
            height: side,
            zoom,
        }
    }

    /// Check the invariants a crop surface must uphold.
    ///
    /// Width and height may differ by sub-pixel rounding from the widget;
    /// anything beyond one pixel is not a square crop.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let fields = [self.x, self.y, self.width, self.height, self.zoom];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::InvalidGeometry(
                "all fields must be finite".into(),
            ));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(PipelineError::InvalidGeometry(format!(
                "size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if (self.width - self.height).abs() > 1.0 {
            return Err(PipelineError::InvalidGeometry(format!(
                "crop must be square, got {}x{}",
                self.width, self.height
            )));
        }
        if self.zoom < 1.0 {
            return Err(PipelineError::InvalidGeometry(format!(
                "zoom must be >= 1, got {}",
                self.zoom
            )));
        }
        Ok(())
    }

    /// Side length of the encoded output: floor(min(width, height)).
    pub fn output_side(&self) -> u32 {
        let side = self.width.min(self.height).floor();
        if side <= 0.0 || !side.is_finite() {
            0
        } else if side >= u32::MAX as f64 {
            u32::MAX
        } else {
            side as u32
        }
    }
}

/// The encoded square JPEG produced by a successful confirm.
#[derive(Clone, PartialEq, Eq)]
pub struct CroppedImage {
    /// Encoded JPEG bytes
    pub content: Vec<u8>,

    /// `<original-base-name>-cropped.jpg`
    pub file_name: String,

    /// Side length of the square output in pixels
    pub side: u32,
}

impl CroppedImage {
    /// Always `image/jpeg`, whatever the source format was.
    pub fn mime_type(&self) -> &'static str {
        JPEG_MIME
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

impl fmt::Debug for CroppedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CroppedImage")
            .field("file_name", &self.file_name)
            .field("side", &self.side)
            .field("size", &self.content.len())
            .finish()
    }
}

/// Derive the output file name from the original one.
///
/// The last extension is replaced; names without one keep their full stem.
pub fn cropped_file_name(original: &str, suffix: &str) -> String {
    let base = match original.rfind('.') {
        Some(idx) if idx > 0 => &original[..idx],
        _ => original,
    };
    format!("{}{}", base, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cropped_file_name_replaces_extension() {
        assert_eq!(
            cropped_file_name("photo.jpg", "-cropped.jpg"),
            "photo-cropped.jpg"
        );
        assert_eq!(
            cropped_file_name("scan.final.PNG", "-cropped.jpg"),
            "scan.final-cropped.jpg"
        );
    }

    #[test]
    fn test_cropped_file_name_without_extension() {
        assert_eq!(cropped_file_name("avatar", "-cropped.jpg"), "avatar-cropped.jpg");
        assert_eq!(
            cropped_file_name(".profile", "-cropped.jpg"),
            ".profile-cropped.jpg"
        );
    }

    #[test]
    fn test_output_side_floors_min() {
        let geometry = CropGeometry {
            x: 0.0,
            y: 0.0,
            width: 200.7,
            height: 200.2,
            zoom: 1.0,
        };
        assert_eq!(geometry.output_side(), 200);
    }

    #[test]
    fn test_validate_rejects_non_square() {
        let geometry = CropGeometry {
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 100.0,
            zoom: 1.0,
        };
        let err = geometry.validate().unwrap_err();
        assert!(err.to_string().contains("square"));
    }

    #[test]
    fn test_validate_rejects_zoom_below_one() {
        let geometry = CropGeometry::square(0.0, 0.0, 50.0, 0.5);
        assert!(geometry.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nan() {
        let geometry = CropGeometry::square(f64::NAN, 0.0, 50.0, 1.0);
        assert!(geometry.validate().is_err());
    }

    #[test]
    fn test_geometry_serde() {
        let geometry = CropGeometry::square(10.0, 10.0, 200.0, 2.0);
        let json = serde_json::to_string(&geometry).unwrap();
        assert!(json.contains("\"width\":200.0"));
        let parsed: CropGeometry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, geometry);
    }

    #[test]
    fn test_selected_image_declared_size() {
        let image = SelectedImage::new(vec![1u8, 2, 3], "image/png", "a.png");
        assert_eq!(image.size, 3);
        let image = image.with_declared_size(10 * 1024 * 1024);
        assert_eq!(image.size, 10 * 1024 * 1024);
        assert_eq!(image.content(), &[1, 2, 3]);
    }
}
