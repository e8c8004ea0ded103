//! Reports for hosts that want a machine-readable summary of a crop.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use std::io::{self, Write};

use crate::pipeline::decode::SourceInfo;
use crate::types::{CropGeometry, CroppedImage, SelectedImage};

/// Summary of a finished crop.
#[derive(Debug, Clone, Serialize)]
pub struct CropReport {
    /// Name of the original file
    pub source_name: String,

    /// Output file name
    pub file_name: String,

    /// Always `image/jpeg`
    pub mime_type: String,

    /// Square side in pixels
    pub side: u32,

    /// Encoded size in bytes
    pub size: u64,

    /// Geometry that was confirmed
    pub geometry: CropGeometry,

    /// Where the file was written, if it was
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// `data:image/jpeg;base64,...` for inline previews
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
}

impl CropReport {
    pub fn new(source_name: &str, cropped: &CroppedImage, geometry: CropGeometry) -> Self {
        Self {
            source_name: source_name.to_string(),
            file_name: cropped.file_name.clone(),
            mime_type: cropped.mime_type().to_string(),
            side: cropped.side,
            size: cropped.size(),
            geometry,
            path: None,
            data_url: None,
        }
    }

    /// Attach an inline data URL of the encoded bytes.
    pub fn with_data_url(mut self, cropped: &CroppedImage) -> Self {
        self.data_url = Some(data_url(cropped));
        self
    }
}

/// Intake verdict and header facts for a file, without cropping it.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,

    /// Whether intake would accept the file
    pub accepted: bool,

    /// User-facing rejection message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// EXIF orientation (1-8)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<u32>,
}

impl InspectReport {
    pub fn new(
        selected: &SelectedImage,
        rejection: Option<String>,
        info: Option<SourceInfo>,
    ) -> Self {
        Self {
            file_name: selected.file_name.clone(),
            mime_type: selected.mime_type.clone(),
            size: selected.size,
            accepted: rejection.is_none(),
            rejection,
            width: info.map(|i| i.width),
            height: info.map(|i| i.height),
            orientation: info.and_then(|i| i.orientation),
        }
    }
}

/// Encode a cropped image as a `data:` URL.
pub fn data_url(cropped: &CroppedImage) -> String {
    format!(
        "data:{};base64,{}",
        cropped.mime_type(),
        BASE64.encode(&cropped.content)
    )
}

/// Convenience function to serialize an item to a JSON string.
pub fn to_json<T: Serialize>(item: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(item)
    } else {
        serde_json::to_string(item)
    }
}

/// Write an item as one JSON document followed by a newline.
pub fn write_json<W: Write, T: Serialize>(writer: &mut W, item: &T, pretty: bool) -> io::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, item).map_err(io::Error::other)?;
    } else {
        serde_json::to_writer(&mut *writer, item).map_err(io::Error::other)?;
    }
    writeln!(writer)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cropped() -> CroppedImage {
        CroppedImage {
            content: vec![0xFF, 0xD8, 0xFF, 0xD9],
            file_name: "photo-cropped.jpg".to_string(),
            side: 200,
        }
    }

    #[test]
    fn test_data_url_prefix() {
        let url = data_url(&cropped());
        assert_eq!(url, "data:image/jpeg;base64,/9j/2Q==");
    }

    #[test]
    fn test_crop_report_json() {
        let report = CropReport::new(
            "photo.jpg",
            &cropped(),
            CropGeometry::square(10.0, 10.0, 200.0, 2.0),
        );
        let json = to_json(&report, false).unwrap();
        assert!(json.contains("\"file_name\":\"photo-cropped.jpg\""));
        assert!(json.contains("\"mime_type\":\"image/jpeg\""));
        assert!(json.contains("\"side\":200"));
        assert!(!json.contains("data_url"));
        assert!(!json.contains("path"));

        let with_url = report.with_data_url(&cropped());
        assert!(to_json(&with_url, false).unwrap().contains("data:image/jpeg"));
    }

    #[test]
    fn test_inspect_report_rejection() {
        let selected = SelectedImage::new(b"%PDF".to_vec(), "application/pdf", "cv.pdf");
        let report = InspectReport::new(
            &selected,
            Some("Please select an image file".to_string()),
            None,
        );
        assert!(!report.accepted);
        let json = to_json(&report, false).unwrap();
        assert!(json.contains("\"accepted\":false"));
        assert!(!json.contains("width"));
    }

    #[test]
    fn test_write_json_appends_newline() {
        let mut buffer = Vec::new();
        write_json(&mut buffer, &serde_json::json!({"a": 1}), false).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "{\"a\":1}\n");
    }
}
