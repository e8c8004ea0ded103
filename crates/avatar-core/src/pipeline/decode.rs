//! Source image decoding with EXIF orientation applied.

use exif::{In, Reader, Tag};
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use std::sync::Arc;

use crate::error::{PipelineError, PipelineResult};
use crate::types::SelectedImage;

use super::source::{ObjectUrl, SourceRegistry};

/// Loads selected files through a temporary object URL.
pub struct ImageDecoder {
    registry: Arc<dyn SourceRegistry>,
}

/// Result of decoding a selected file.
pub struct DecodedImage {
    /// Pixels, already rotated to display orientation
    pub image: DynamicImage,
    /// Format detected from content
    pub format: Option<ImageFormat>,
    /// Display width in pixels
    pub width: u32,
    /// Display height in pixels
    pub height: u32,
}

/// Cheap header-only facts about a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    /// Display width (after orientation)
    pub width: u32,
    /// Display height (after orientation)
    pub height: u32,
    /// EXIF orientation tag (1-8), if present
    pub orientation: Option<u32>,
}

impl ImageDecoder {
    pub fn new(registry: Arc<dyn SourceRegistry>) -> Self {
        Self { registry }
    }

    /// Decode a selection off the async runtime.
    ///
    /// The object URL is released as soon as decoding settles, whatever the
    /// outcome. If this future is dropped early the guard releases it then.
    pub async fn decode(&self, selected: &SelectedImage) -> PipelineResult<DecodedImage> {
        let start = std::time::Instant::now();
        let url = ObjectUrl::create(Arc::clone(&self.registry), selected.shared_content());
        let file_name = selected.file_name.clone();

        let result = match url.resolve() {
            Some(bytes) => {
                let name = file_name.clone();
                tokio::task::spawn_blocking(move || Self::decode_bytes_sync(&bytes, &name))
                    .await
                    .unwrap_or_else(|e| {
                        Err(PipelineError::ImageDecode {
                            file_name: file_name.clone(),
                            message: format!("Task join error: {}", e),
                        })
                    })
            }
            None => Err(PipelineError::ImageDecode {
                file_name: file_name.clone(),
                message: format!("{} does not resolve", url.url()),
            }),
        };
        url.revoke();

        tracing::trace!("  Decode {}: {:?}", file_name, start.elapsed());
        result
    }

    /// Synchronous decode from bytes (runs in spawn_blocking).
    pub fn decode_bytes_sync(bytes: &[u8], file_name: &str) -> PipelineResult<DecodedImage> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::ImageDecode {
                file_name: file_name.to_string(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = reader.format();
        let image = reader.decode().map_err(|e| PipelineError::ImageDecode {
            file_name: file_name.to_string(),
            message: e.to_string(),
        })?;

        let image = match read_orientation(bytes) {
            Some(orientation) => apply_orientation(image, orientation),
            None => image,
        };

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
        })
    }

    /// Read display dimensions from the header without decoding pixels.
    ///
    /// Returns `None` for content the decoder cannot identify; the real
    /// decode at confirm time reports the error.
    pub fn probe(bytes: &[u8]) -> Option<SourceInfo> {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()?;
        let orientation = read_orientation(bytes);
        let (width, height) = match orientation {
            Some(5..=8) => (height, width),
            _ => (width, height),
        };
        Some(SourceInfo {
            width,
            height,
            orientation,
        })
    }
}

/// Read the EXIF orientation tag, if the container carries one.
pub fn read_orientation(bytes: &[u8]) -> Option<u32> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .filter(|v| (1..=8).contains(v))
}

/// Rotate/flip pixels so they match how the orientation tag says to display them.
pub fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::source::MemoryRegistry;
    use image::{Rgb, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 40])));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    /// JPEG of `width x height`, left half red and right half blue, with an
    /// APP1 segment carrying only the given EXIF orientation.
    fn oriented_jpeg(width: u32, height: u32, orientation: u16) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        }));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Jpeg).unwrap();
        let jpeg = buffer.into_inner();

        // Big-endian TIFF header, IFD0 with a single Orientation (SHORT) entry
        let mut tiff = vec![b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08];
        tiff.extend_from_slice(&[0x00, 0x01]);
        tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        tiff.extend_from_slice(&orientation.to_be_bytes());
        tiff.extend_from_slice(&[0x00, 0x00]);
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let mut payload = b"Exif\0\0".to_vec();
        payload.extend_from_slice(&tiff);
        let length = (payload.len() + 2) as u16;

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn test_format_detected_by_content() {
        // PNG bytes under a .jpg name: format comes from content
        let result = ImageDecoder::decode_bytes_sync(&png_bytes(8, 4), "misnamed.jpg").unwrap();
        assert_eq!(result.format, Some(ImageFormat::Png));
        assert_eq!((result.width, result.height), (8, 4));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = ImageDecoder::decode_bytes_sync(b"definitely not an image", "x.png")
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::ImageDecode { .. }));
    }

    #[test]
    fn test_probe_reads_dimensions() {
        let info = ImageDecoder::probe(&png_bytes(30, 20)).unwrap();
        assert_eq!((info.width, info.height), (30, 20));
        assert_eq!(info.orientation, None);
        assert!(ImageDecoder::probe(b"nope").is_none());
    }

    #[test]
    fn test_apply_orientation_swaps_dimensions() {
        let img = DynamicImage::new_rgb8(40, 10);
        for orientation in [5, 6, 7, 8] {
            let rotated = apply_orientation(img.clone(), orientation);
            assert_eq!(rotated.dimensions(), (10, 40));
        }
        for orientation in [1, 2, 3, 4] {
            let same = apply_orientation(img.clone(), orientation);
            assert_eq!(same.dimensions(), (40, 10));
        }
    }

    #[test]
    fn test_rotated_jpeg_probe_matches_decode() {
        let bytes = oriented_jpeg(64, 16, 6);
        assert_eq!(read_orientation(&bytes), Some(6));

        let info = ImageDecoder::probe(&bytes).unwrap();
        assert_eq!(info.orientation, Some(6));
        assert_eq!((info.width, info.height), (16, 64));

        let decoded = ImageDecoder::decode_bytes_sync(&bytes, "portrait.jpg").unwrap();
        assert_eq!((decoded.width, decoded.height), (info.width, info.height));

        // Rotated 90 degrees clockwise: the red left half ends up on top
        let rgb = decoded.image.to_rgb8();
        let top = rgb.get_pixel(8, 4);
        let bottom = rgb.get_pixel(8, 60);
        assert!(top[0] > top[2]);
        assert!(bottom[2] > bottom[0]);
    }

    #[test]
    fn test_apply_orientation_mirror() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        let flipped = apply_orientation(DynamicImage::ImageRgb8(img), 2).to_rgb8();
        assert_eq!(flipped.get_pixel(1, 0), &Rgb([255, 0, 0]));
    }

    #[tokio::test]
    async fn test_decode_releases_url_on_success() {
        let registry = Arc::new(MemoryRegistry::new());
        let decoder = ImageDecoder::new(registry.clone());
        let selected = SelectedImage::new(png_bytes(16, 16), "image/png", "a.png");

        let decoded = decoder.decode(&selected).await.unwrap();
        assert_eq!(decoded.width, 16);
        assert_eq!(registry.created_count(), 1);
        assert_eq!(registry.revoked_count(), 1);
    }

    #[tokio::test]
    async fn test_decode_releases_url_on_failure() {
        let registry = Arc::new(MemoryRegistry::new());
        let decoder = ImageDecoder::new(registry.clone());
        let selected = SelectedImage::new(b"garbage".to_vec(), "image/png", "a.png");

        assert!(decoder.decode(&selected).await.is_err());
        assert_eq!(registry.created_count(), 1);
        assert_eq!(registry.revoked_count(), 1);
        assert_eq!(registry.live_count(), 0);
    }
}
