//! Crop session: one upload attempt from selection to encoded avatar.
//!
//! ```text
//! Idle -> Selected -> Cropping -> Cropped
//!                        |-> Idle      (cancel, or confirm with no geometry)
//!                        '-> Selected  (confirm failed; original kept)
//! ```
//!
//! State lives in a single [`CropState`], so an image without geometry or a
//! geometry without an image cannot be confirmed by accident.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult, ValidationError};
use crate::types::{CropGeometry, CroppedImage, FileSelection, SelectedImage};

use super::decode::ImageDecoder;
use super::encode::{CropEncoder, FrameExporter};
use super::intake::Validator;
use super::notify::{Notification, Notifier, CROP_FAILED, CROP_SUCCEEDED, IMAGE_SELECTED};
use super::source::{MemoryRegistry, SourceRegistry};
use super::surface::{CropSurface, SurfaceOptions};

/// Where an upload attempt stands.
#[derive(Debug, Default)]
pub enum CropState {
    /// Nothing pending
    #[default]
    Idle,
    /// A validated file, crop surface closed
    Selected(SelectedImage),
    /// Crop surface open over the selected file
    Cropping {
        image: SelectedImage,
        surface: CropSurface,
    },
    /// Encoded avatar waiting for the host to take it
    Cropped(CroppedImage),
}

impl CropState {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            CropState::Idle => "idle",
            CropState::Selected(_) => "selected",
            CropState::Cropping { .. } => "cropping",
            CropState::Cropped(_) => "cropped",
        }
    }

    /// The original file, while one is held.
    pub fn selected(&self) -> Option<&SelectedImage> {
        match self {
            CropState::Selected(image) | CropState::Cropping { image, .. } => Some(image),
            _ => None,
        }
    }

    pub fn surface(&self) -> Option<&CropSurface> {
        match self {
            CropState::Cropping { surface, .. } => Some(surface),
            _ => None,
        }
    }

    pub fn cropped(&self) -> Option<&CroppedImage> {
        match self {
            CropState::Cropped(cropped) => Some(cropped),
            _ => None,
        }
    }
}

/// What a call to [`CropSession::confirm`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    /// A new cropped image replaced the selection
    Cropped,
    /// Nothing to confirm; no notification was shown
    Skipped,
}

/// Drives one avatar through intake, cropping, and encoding.
pub struct CropSession {
    state: CropState,
    validator: Validator,
    surface_options: SurfaceOptions,
    decoder: ImageDecoder,
    encoder: CropEncoder,
    notifier: Arc<dyn Notifier>,
}

impl CropSession {
    /// Create a session with an in-memory URL registry and JPEG export.
    pub fn new(config: &Config, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_registry(config, notifier, Arc::new(MemoryRegistry::new()))
    }

    /// Create a session that loads sources through `registry`.
    pub fn with_registry(
        config: &Config,
        notifier: Arc<dyn Notifier>,
        registry: Arc<dyn SourceRegistry>,
    ) -> Self {
        Self {
            state: CropState::Idle,
            validator: Validator::new(config.limits.clone()),
            surface_options: SurfaceOptions::from(&config.surface),
            decoder: ImageDecoder::new(registry),
            encoder: CropEncoder::new(config.encode.clone()),
            notifier,
        }
    }

    /// Replace the export step.
    pub fn with_exporter(mut self, exporter: Arc<dyn FrameExporter>) -> Self {
        self.encoder = self.encoder.with_exporter(exporter);
        self
    }

    pub fn state(&self) -> &CropState {
        &self.state
    }

    /// Mutable access to the open crop surface, for pan/zoom input.
    pub fn surface_mut(&mut self) -> Option<&mut CropSurface> {
        match &mut self.state {
            CropState::Cropping { surface, .. } => Some(surface),
            _ => None,
        }
    }

    /// Handle a file picker change event.
    ///
    /// An empty selection is ignored. A rejected file leaves the state as it
    /// was; an accepted one opens the crop surface.
    pub fn select(&mut self, selection: FileSelection) -> Result<(), ValidationError> {
        let Some(image) = selection else {
            tracing::debug!("Empty file selection ignored");
            return Ok(());
        };

        if let Err(e) = self.validator.validate(&image) {
            tracing::debug!(
                "Rejected {} ({}, {} bytes): {}",
                image.file_name,
                image.mime_type,
                image.size,
                e
            );
            self.notifier.notify(Notification::error(e.to_string()));
            return Err(e);
        }

        tracing::debug!(
            "Accepted {} ({}, {} bytes)",
            image.file_name,
            image.mime_type,
            image.size
        );
        self.state = CropState::Selected(image);
        self.open_crop();
        self.notifier.notify(Notification::info(IMAGE_SELECTED));
        Ok(())
    }

    /// Open the crop surface over the held selection.
    ///
    /// Returns `false` when there is no selection to crop.
    pub fn open_crop(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            CropState::Selected(image) => {
                let dims = ImageDecoder::probe(image.content()).map(|info| (info.width, info.height));
                let surface = CropSurface::open(self.surface_options.clone(), dims);
                self.state = CropState::Cropping { image, surface };
                tracing::debug!("Crop surface opened (source {:?})", dims);
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    /// Forward geometry from an external cropping widget.
    ///
    /// Ignored outside crop mode.
    pub fn report_geometry(&mut self, geometry: CropGeometry) -> PipelineResult<()> {
        match self.surface_mut() {
            Some(surface) => surface.report(geometry),
            None => {
                tracing::debug!("Geometry report ignored outside crop mode");
                Ok(())
            }
        }
    }

    /// Close the crop surface and drop any selection.
    pub fn cancel(&mut self) {
        tracing::debug!("Cancelled from {} state", self.state.name());
        self.state = CropState::Idle;
    }

    /// Encode the current crop.
    ///
    /// With no open surface, or an open surface that has not emitted any
    /// geometry yet, this closes crop mode and returns
    /// [`Confirmation::Skipped`] without notifying. A held
    /// [`CropState::Cropped`] result is never touched.
    ///
    /// Failures are logged, notified, and returned; the session goes back to
    /// [`CropState::Selected`] with the original file. Dropping the returned
    /// future before it resolves leaves the state unchanged.
    pub async fn confirm(&mut self) -> PipelineResult<Confirmation> {
        let pending = match &self.state {
            CropState::Cropping { image, surface } => {
                Some((image.clone(), surface.latest().copied()))
            }
            _ => None,
        };
        let (image, geometry) = match pending {
            Some((image, Some(geometry))) => (image, geometry),
            Some((_, None)) => {
                tracing::debug!("Confirm without geometry; closing crop mode");
                self.state = CropState::Idle;
                return Ok(Confirmation::Skipped);
            }
            None => {
                tracing::debug!("Confirm ignored in {} state", self.state.name());
                return Ok(Confirmation::Skipped);
            }
        };

        let start = std::time::Instant::now();
        match self.crop(&image, geometry).await {
            Ok(cropped) => {
                tracing::debug!(
                    "Cropped {} -> {} ({}x{}, {} bytes) in {:?}",
                    image.file_name,
                    cropped.file_name,
                    cropped.side,
                    cropped.side,
                    cropped.size(),
                    start.elapsed()
                );
                self.state = CropState::Cropped(cropped);
                self.notifier.notify(Notification::success(CROP_SUCCEEDED));
                Ok(Confirmation::Cropped)
            }
            Err(e) => {
                tracing::error!("Crop failed for {}: {}", image.file_name, e);
                self.notifier
                    .notify(Notification::error(format!("{}: {}", CROP_FAILED, e)));
                self.state = CropState::Selected(image);
                Err(e)
            }
        }
    }

    async fn crop(
        &self,
        image: &SelectedImage,
        geometry: CropGeometry,
    ) -> PipelineResult<CroppedImage> {
        let decoded = self.decoder.decode(image).await?;

        let encode_start = std::time::Instant::now();
        let encoder = self.encoder.clone();
        let file_name = image.file_name.clone();
        let cropped = tokio::task::spawn_blocking(move || {
            encoder.crop(&file_name, &decoded.image, &geometry)
        })
        .await
        .map_err(|e| PipelineError::EncodingEmpty(format!("Task join error: {}", e)))??;
        tracing::trace!("  Encode: {:?}", encode_start.elapsed());

        Ok(cropped)
    }

    /// Hand the cropped avatar to the caller and return to idle.
    pub fn take_cropped(&mut self) -> Option<CroppedImage> {
        match std::mem::take(&mut self.state) {
            CropState::Cropped(cropped) => Some(cropped),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Drop everything and return to idle.
    pub fn reset(&mut self) {
        self.state = CropState::Idle;
    }
}
