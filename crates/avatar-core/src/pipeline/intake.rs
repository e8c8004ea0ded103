//! File intake: declared size and MIME checks before crop mode opens.

use std::io::Read;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::ValidationError;
use crate::types::SelectedImage;

/// MIME type reported when neither content nor extension is recognised.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Leading bytes read for sniffing and header probes (covers a JPEG APP1).
pub const HEADER_LEN: u64 = 64 * 1024;

/// Validates selected files against the intake limits.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Accept or reject a selection based on what the picker declared.
    ///
    /// Size is checked before type, so an oversized non-image reports the
    /// size violation.
    pub fn validate(&self, image: &SelectedImage) -> Result<(), ValidationError> {
        self.check_declared(image.size, &image.mime_type)
    }

    fn check_declared(&self, size: u64, mime_type: &str) -> Result<(), ValidationError> {
        if size > self.limits.max_file_size_bytes() {
            return Err(ValidationError::TooLarge {
                size,
                max_mb: self.limits.max_file_size_mb,
            });
        }

        if !mime_type.starts_with(&self.limits.accepted_mime_prefix) {
            return Err(ValidationError::WrongType {
                mime_type: mime_type.to_string(),
            });
        }

        Ok(())
    }

    /// Build a selection from a file on disk, the way a picker would.
    ///
    /// The size comes from file metadata and the declared MIME type from the
    /// first [`HEADER_LEN`] bytes, falling back to the extension. The rest of
    /// the file is read only when those pass intake; a rejected selection
    /// carries just its header.
    pub fn select_path(&self, path: &Path) -> std::io::Result<SelectedImage> {
        let mut file = std::fs::File::open(path)?;
        let declared_size = file.metadata()?.len();

        let mut content = Vec::with_capacity(declared_size.min(HEADER_LEN) as usize);
        (&mut file).take(HEADER_LEN).read_to_end(&mut content)?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let mime_type = Self::sniff_mime(&content)
            .or_else(|| Self::mime_from_extension(&file_name))
            .unwrap_or(UNKNOWN_MIME);

        if self.check_declared(declared_size, mime_type).is_ok() {
            content.reserve(declared_size.saturating_sub(content.len() as u64) as usize);
            file.read_to_end(&mut content)?;
        }

        Ok(SelectedImage::new(content, mime_type, file_name).with_declared_size(declared_size))
    }

    /// Map a file's leading bytes to an image MIME type.
    pub fn sniff_mime(header: &[u8]) -> Option<&'static str> {
        if header.len() < 4 {
            return None;
        }

        // JPEG: FF D8 FF
        if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some("image/jpeg");
        }

        // PNG: 89 50 4E 47
        if header.starts_with(&[0x89, b'P', b'N', b'G']) {
            return Some("image/png");
        }

        if header.starts_with(b"GIF8") {
            return Some("image/gif");
        }

        // WebP: RIFF....WEBP
        if header.starts_with(b"RIFF") && header.len() >= 12 && &header[8..12] == b"WEBP" {
            return Some("image/webp");
        }

        if header.starts_with(b"BM") {
            return Some("image/bmp");
        }

        // TIFF: II or MM followed by version 42
        if header.starts_with(&[b'I', b'I', 0x2A, 0x00])
            || header.starts_with(&[b'M', b'M', 0x00, 0x2A])
        {
            return Some("image/tiff");
        }

        // HEIC/HEIF/AVIF: ftyp box at offset 4, brand at offset 8
        if header.len() >= 12 && &header[4..8] == b"ftyp" {
            return match &header[8..12] {
                b"avif" | b"avis" => Some("image/avif"),
                _ => Some("image/heic"),
            };
        }

        None
    }

    /// Map a file extension to an image MIME type.
    pub fn mime_from_extension(file_name: &str) -> Option<&'static str> {
        let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some("image/jpeg"),
            "png" => Some("image/png"),
            "gif" => Some("image/gif"),
            "webp" => Some("image/webp"),
            "bmp" => Some("image/bmp"),
            "tif" | "tiff" => Some("image/tiff"),
            "heic" | "heif" => Some("image/heic"),
            "avif" => Some("image/avif"),
            _ => None,
        }
    }
}
