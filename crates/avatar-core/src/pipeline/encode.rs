//! Square crop rendering and JPEG export.
//!
//! Rendering mirrors drawing a source rectangle onto an offscreen canvas:
//! the geometry's rectangle is scaled into a `side x side` surface at (0, 0),
//! parts of it outside the source stay transparent, and export flattens
//! transparency onto black.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageEncoder, Rgb, RgbImage, RgbaImage};
use std::sync::Arc;

use crate::config::EncodeConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{cropped_file_name, CropGeometry, CroppedImage};

/// Largest surface side that can be allocated, matching common canvas limits.
pub const MAX_SURFACE_SIDE: u32 = 16_384;

/// Serializes a rendered frame.
pub trait FrameExporter: Send + Sync {
    /// Encode `frame` at `quality` (1-100).
    fn export(&self, frame: &RgbImage, quality: u8) -> PipelineResult<Vec<u8>>;
}

/// Baseline JPEG export.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegExporter;

impl FrameExporter for JpegExporter {
    fn export(&self, frame: &RgbImage, quality: u8) -> PipelineResult<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
        encoder
            .write_image(
                frame.as_raw(),
                frame.width(),
                frame.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PipelineError::EncodingEmpty(e.to_string()))?;
        Ok(buffer)
    }
}

/// Renders a crop and wraps the export as a [`CroppedImage`].
#[derive(Clone)]
pub struct CropEncoder {
    config: EncodeConfig,
    exporter: Arc<dyn FrameExporter>,
}

impl CropEncoder {
    /// Create an encoder with JPEG export.
    pub fn new(config: EncodeConfig) -> Self {
        Self {
            config,
            exporter: Arc::new(JpegExporter),
        }
    }

    /// Swap the export step.
    pub fn with_exporter(mut self, exporter: Arc<dyn FrameExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    /// Draw the geometry's region of `image` onto a square surface.
    pub fn render(image: &DynamicImage, geometry: &CropGeometry) -> PipelineResult<RgbImage> {
        let side = geometry.output_side();
        if side == 0 || side > MAX_SURFACE_SIDE {
            return Err(PipelineError::EncodingUnsupported {
                width: geometry.width,
                height: geometry.height,
            });
        }

        let mut surface = RgbaImage::new(side, side);
        let (src_w, src_h) = image.dimensions();
        let scale_x = side as f64 / geometry.width;
        let scale_y = side as f64 / geometry.height;

        // Visible part of the source rectangle
        let left = geometry.x.max(0.0);
        let top = geometry.y.max(0.0);
        let right = (geometry.x + geometry.width).min(src_w as f64);
        let bottom = (geometry.y + geometry.height).min(src_h as f64);

        if right > left && bottom > top {
            let cx0 = left.floor() as u32;
            let cy0 = top.floor() as u32;
            let cx1 = (right.ceil() as u32).min(src_w);
            let cy1 = (bottom.ceil() as u32).min(src_h);

            let dx0 = ((left - geometry.x) * scale_x).round() as u32;
            let dy0 = ((top - geometry.y) * scale_y).round() as u32;
            let dx1 = (((right - geometry.x) * scale_x).round() as u32).min(side);
            let dy1 = (((bottom - geometry.y) * scale_y).round() as u32).min(side);

            if cx1 > cx0 && cy1 > cy0 && dx1 > dx0 && dy1 > dy0 {
                let region = image.crop_imm(cx0, cy0, cx1 - cx0, cy1 - cy0).to_rgba8();
                let (dw, dh) = (dx1 - dx0, dy1 - dy0);
                let scaled = if region.dimensions() == (dw, dh) {
                    region
                } else {
                    imageops::resize(&region, dw, dh, FilterType::Triangle)
                };
                imageops::replace(&mut surface, &scaled, dx0 as i64, dy0 as i64);
            }
        }

        Ok(flatten_on_black(&surface))
    }

    /// Render and export; the result is never empty.
    pub fn encode(&self, image: &DynamicImage, geometry: &CropGeometry) -> PipelineResult<Vec<u8>> {
        let frame = Self::render(image, geometry)?;
        let bytes = self
            .exporter
            .export(&frame, self.config.quality_percent())?;
        if bytes.is_empty() {
            return Err(PipelineError::EncodingEmpty(
                "export returned no bytes".to_string(),
            ));
        }
        Ok(bytes)
    }

    /// Produce the named output file for a crop of `original_name`.
    pub fn crop(
        &self,
        original_name: &str,
        image: &DynamicImage,
        geometry: &CropGeometry,
    ) -> PipelineResult<CroppedImage> {
        let content = self.encode(image, geometry)?;
        Ok(CroppedImage {
            content,
            file_name: cropped_file_name(original_name, &self.config.file_suffix),
            side: geometry.output_side(),
        })
    }
}

/// Composite onto black and drop alpha, as a canvas JPEG export does.
fn flatten_on_black(surface: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(surface.width(), surface.height(), |x, y| {
        let [r, g, b, a] = surface.get_pixel(x, y).0;
        let a = a as u16;
        Rgb([
            (r as u16 * a / 255) as u8,
            (g as u16 * a / 255) as u8,
            (b as u16 * a / 255) as u8,
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// Left half red, right half blue.
    fn split_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        }))
    }

    struct EmptyExporter;

    impl FrameExporter for EmptyExporter {
        fn export(&self, _frame: &RgbImage, _quality: u8) -> PipelineResult<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_render_side_is_floor_of_min() {
        let image = split_image(300, 300);
        let geometry = CropGeometry {
            x: 5.0,
            y: 5.0,
            width: 120.9,
            height: 120.4,
            zoom: 1.0,
        };
        let frame = CropEncoder::render(&image, &geometry).unwrap();
        assert_eq!(frame.dimensions(), (120, 120));
    }

    #[test]
    fn test_render_selects_region() {
        let image = split_image(200, 100);
        // Entirely inside the blue half
        let frame =
            CropEncoder::render(&image, &CropGeometry::square(120.0, 10.0, 50.0, 1.0)).unwrap();
        assert_eq!(frame.get_pixel(25, 25), &Rgb([0, 0, 255]));

        // Entirely inside the red half
        let frame =
            CropEncoder::render(&image, &CropGeometry::square(0.0, 0.0, 80.0, 1.0)).unwrap();
        assert_eq!(frame.get_pixel(40, 40), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_render_outside_source_is_black() {
        let image = split_image(100, 100);
        // Right half of the crop falls off the image
        let frame =
            CropEncoder::render(&image, &CropGeometry::square(50.0, 0.0, 100.0, 1.0)).unwrap();
        assert_eq!(frame.dimensions(), (100, 100));
        assert_eq!(frame.get_pixel(10, 50), &Rgb([0, 0, 255]));
        assert_eq!(frame.get_pixel(90, 50), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_render_zero_side_unsupported() {
        let image = split_image(10, 10);
        let err = CropEncoder::render(&image, &CropGeometry::square(0.0, 0.0, 0.5, 1.0))
            .unwrap_err();
        assert!(matches!(err, PipelineError::EncodingUnsupported { .. }));
    }

    #[test]
    fn test_render_oversized_surface_unsupported() {
        let image = split_image(10, 10);
        let geometry = CropGeometry::square(0.0, 0.0, (MAX_SURFACE_SIDE + 1) as f64, 1.0);
        let err = CropEncoder::render(&image, &geometry).unwrap_err();
        assert!(matches!(err, PipelineError::EncodingUnsupported { .. }));
    }

    #[test]
    fn test_encode_produces_jpeg() {
        let encoder = CropEncoder::new(EncodeConfig::default());
        let bytes = encoder
            .encode(&split_image(64, 64), &CropGeometry::square(0.0, 0.0, 64.0, 1.0))
            .unwrap();
        assert_eq!(&bytes[0..3], &[0xFF, 0xD8, 0xFF]);

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));
    }

    #[test]
    fn test_empty_export_is_error() {
        let encoder =
            CropEncoder::new(EncodeConfig::default()).with_exporter(Arc::new(EmptyExporter));
        let err = encoder
            .encode(&split_image(64, 64), &CropGeometry::square(0.0, 0.0, 64.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, PipelineError::EncodingEmpty(_)));
    }

    #[test]
    fn test_crop_names_output() {
        let encoder = CropEncoder::new(EncodeConfig::default());
        let cropped = encoder
            .crop(
                "portrait.png",
                &split_image(400, 400),
                &CropGeometry::square(10.0, 10.0, 200.0, 2.0),
            )
            .unwrap();
        assert_eq!(cropped.file_name, "portrait-cropped.jpg");
        assert_eq!(cropped.side, 200);
        assert_eq!(cropped.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_flatten_premultiplies_alpha() {
        let mut surface = RgbaImage::new(1, 1);
        surface.put_pixel(0, 0, Rgba([200, 100, 50, 0]));
        assert_eq!(flatten_on_black(&surface).get_pixel(0, 0), &Rgb([0, 0, 0]));
        surface.put_pixel(0, 0, Rgba([200, 100, 50, 255]));
        assert_eq!(
            flatten_on_black(&surface).get_pixel(0, 0),
            &Rgb([200, 100, 50])
        );
    }
}
