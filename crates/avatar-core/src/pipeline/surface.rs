//! Interactive crop surface state.
//!
//! The surface shows the source through a fixed 1:1 circular mask and
//! tracks pan and zoom. Every adjustment emits a fresh [`CropGeometry`];
//! only the latest emission is kept.
//!
//! Pan is the offset of the crop centre from the image centre, in source
//! pixels. At zoom `z` the visible square spans `min(width, height) / z`
//! source pixels.

use serde::Serialize;

use crate::config::SurfaceConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::types::CropGeometry;

/// Presentation parameters a host needs to render the surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurfaceOptions {
    /// Width / height of the crop area; always 1 for avatars
    pub aspect: f64,
    /// Circular mask
    pub round: bool,
    pub show_grid: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub zoom_step: f64,
}

impl From<&SurfaceConfig> for SurfaceOptions {
    fn from(config: &SurfaceConfig) -> Self {
        Self {
            aspect: 1.0,
            round: config.round,
            show_grid: config.show_grid,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            zoom_step: config.zoom_step,
        }
    }
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self::from(&SurfaceConfig::default())
    }
}

impl SurfaceOptions {
    /// Clamp into range and snap to the step grid.
    ///
    /// Non-finite input yields `None`.
    pub fn normalize_zoom(&self, zoom: f64) -> Option<f64> {
        if !zoom.is_finite() {
            return None;
        }
        let clamped = zoom.clamp(self.min_zoom, self.max_zoom);
        let steps = ((clamped - self.min_zoom) / self.zoom_step).round();
        let snapped = self.min_zoom + steps * self.zoom_step;
        Some(snapped.clamp(self.min_zoom, self.max_zoom))
    }
}

/// Pan/zoom state plus the most recent geometry emission.
#[derive(Debug, Clone)]
pub struct CropSurface {
    options: SurfaceOptions,
    source: Option<(u32, u32)>,
    pan: (f64, f64),
    zoom: f64,
    latest: Option<CropGeometry>,
    emissions: u64,
}

impl CropSurface {
    /// Open the surface at pan (0, 0) and minimum zoom.
    ///
    /// With known source dimensions the initial geometry is emitted right
    /// away; otherwise the surface waits for an external [`report`](Self::report).
    pub fn open(options: SurfaceOptions, source: Option<(u32, u32)>) -> Self {
        let zoom = options.min_zoom;
        let mut surface = Self {
            options,
            source: source.filter(|&(w, h)| w > 0 && h > 0),
            pan: (0.0, 0.0),
            zoom,
            latest: None,
            emissions: 0,
        };
        surface.recompute();
        surface
    }

    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> (f64, f64) {
        self.pan
    }

    /// Source dimensions the surface computes geometry against, if known.
    pub fn source_dimensions(&self) -> Option<(u32, u32)> {
        self.source
    }

    /// Most recent geometry emission.
    pub fn latest(&self) -> Option<&CropGeometry> {
        self.latest.as_ref()
    }

    /// Number of geometry emissions since the surface opened.
    pub fn emissions(&self) -> u64 {
        self.emissions
    }

    /// Set zoom; returns the value actually applied.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        if let Some(zoom) = self.options.normalize_zoom(zoom) {
            self.zoom = zoom;
            self.recompute();
        }
        self.zoom
    }

    /// Move the crop centre to `(x, y)` relative to the image centre.
    pub fn pan_to(&mut self, x: f64, y: f64) {
        if x.is_finite() && y.is_finite() {
            self.pan = (x, y);
            self.recompute();
        }
    }

    /// Drag by `(dx, dy)` source pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_to(self.pan.0 + dx, self.pan.1 + dy);
    }

    /// Accept geometry computed by an external cropping widget.
    ///
    /// Invalid geometry, including a zoom outside the surface's range, is
    /// rejected and the previous emission kept.
    pub fn report(&mut self, geometry: CropGeometry) -> PipelineResult<()> {
        geometry.validate()?;
        if geometry.zoom < self.options.min_zoom || geometry.zoom > self.options.max_zoom {
            return Err(PipelineError::InvalidGeometry(format!(
                "zoom {} outside {}..={}",
                geometry.zoom, self.options.min_zoom, self.options.max_zoom
            )));
        }
        if let Some(zoom) = self.options.normalize_zoom(geometry.zoom) {
            self.zoom = zoom;
        }
        self.emit(geometry);
        Ok(())
    }

    fn emit(&mut self, geometry: CropGeometry) {
        tracing::trace!(
            "Crop geometry: {}x{} at ({}, {}), zoom {}",
            geometry.width,
            geometry.height,
            geometry.x,
            geometry.y,
            geometry.zoom
        );
        self.latest = Some(geometry);
        self.emissions += 1;
    }

    fn recompute(&mut self) {
        let Some((width, height)) = self.source else {
            return;
        };
        let (geometry, pan) = Self::compute_geometry((width, height), self.pan, self.zoom);
        self.pan = pan;
        self.emit(geometry);
    }

    /// Geometry for a source of `dims` at the given pan and zoom.
    ///
    /// Returns the geometry and the pan after clamping, so the square never
    /// leaves the image. Coordinates are whole pixels.
    pub fn compute_geometry(
        dims: (u32, u32),
        pan: (f64, f64),
        zoom: f64,
    ) -> (CropGeometry, (f64, f64)) {
        let (width, height) = (dims.0 as f64, dims.1 as f64);
        let side = (width.min(height) / zoom).round().max(1.0);

        let max_pan_x = (width - side) / 2.0;
        let max_pan_y = (height - side) / 2.0;
        let pan_x = pan.0.clamp(-max_pan_x, max_pan_x);
        let pan_y = pan.1.clamp(-max_pan_y, max_pan_y);

        let x = (width / 2.0 + pan_x - side / 2.0)
            .round()
            .clamp(0.0, width - side);
        let y = (height / 2.0 + pan_y - side / 2.0)
            .round()
            .clamp(0.0, height - side);

        (CropGeometry::square(x, y, side, zoom), (pan_x, pan_y))
    }
}
