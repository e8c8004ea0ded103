//! The `avatar crop` command.

use anyhow::Context;
use avatar_core::output::write_json;
use avatar_core::pipeline::Validator;
use avatar_core::{Config, Confirmation, CropGeometry, CropReport, CropSession, LogNotifier};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Arguments for the `crop` command.
#[derive(Args, Debug)]
pub struct CropArgs {
    /// Image file to crop
    #[arg(required = true)]
    pub input: PathBuf,

    /// Left edge of the crop in source pixels
    #[arg(long, requires_all = ["y", "size"], allow_negative_numbers = true)]
    pub x: Option<f64>,

    /// Top edge of the crop in source pixels
    #[arg(long, requires_all = ["x", "size"], allow_negative_numbers = true)]
    pub y: Option<f64>,

    /// Side of the square crop in source pixels
    #[arg(long, requires_all = ["x", "y"])]
    pub size: Option<f64>,

    /// Zoom factor (1-3 by default, snapped to 0.01)
    #[arg(long, default_value = "1.0")]
    pub zoom: f64,

    /// Horizontal offset of the crop centre from the image centre
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub pan_x: f64,

    /// Vertical offset of the crop centre from the image centre
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    pub pan_y: f64,

    /// Output file (defaults to <output.dir>/<name>-cropped.jpg)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print a JSON report to stdout
    #[arg(long)]
    pub json: bool,

    /// Include a base64 data URL in the JSON report
    #[arg(long, requires = "json")]
    pub data_url: bool,
}

impl CropArgs {
    /// Geometry given on the command line, if complete.
    fn explicit_geometry(&self) -> Option<CropGeometry> {
        match (self.x, self.y, self.size) {
            (Some(x), Some(y), Some(size)) => Some(CropGeometry::square(x, y, size, self.zoom)),
            _ => None,
        }
    }
}

/// Execute the crop command.
pub async fn execute(args: CropArgs, config: &Config) -> anyhow::Result<()> {
    let selected = Validator::new(config.limits.clone())
        .select_path(&args.input)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;
    let source_name = selected.file_name.clone();

    let mut session = CropSession::new(config, Arc::new(LogNotifier));
    session.select(Some(selected))?;

    match args.explicit_geometry() {
        Some(geometry) => session.report_geometry(geometry)?,
        None => {
            if let Some(surface) = session.surface_mut() {
                let applied = surface.set_zoom(args.zoom);
                if zoom_adjusted(args.zoom, applied, surface.options().zoom_step) {
                    tracing::warn!("Zoom {} adjusted to {}", args.zoom, applied);
                }
                surface.pan_to(args.pan_x, args.pan_y);
            }
        }
    }

    let geometry = session
        .state()
        .surface()
        .and_then(|s| s.latest().copied());

    if session.confirm().await? == Confirmation::Skipped {
        anyhow::bail!(
            "Could not read the dimensions of {}; pass --x, --y and --size explicitly",
            args.input.display()
        );
    }
    let cropped = session
        .take_cropped()
        .context("Crop confirmed but no image was produced")?;

    let path = resolve_output(args.output.as_deref(), &config.output_dir(), &cropped.file_name);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, &cropped.content)
        .with_context(|| format!("Cannot write {}", path.display()))?;
    tracing::info!(
        "Wrote {} ({}x{}, {} bytes)",
        path.display(),
        cropped.side,
        cropped.side,
        cropped.size()
    );

    if args.json {
        let geometry = geometry.context("No geometry recorded for the crop")?;
        let mut report = CropReport::new(&source_name, &cropped, geometry);
        report.path = Some(path.display().to_string());
        if args.data_url {
            report = report.with_data_url(&cropped);
        }
        write_json(&mut std::io::stdout().lock(), &report, true)?;
    }

    Ok(())
}

/// Whether the surface moved the requested zoom off by more than half a step.
fn zoom_adjusted(requested: f64, applied: f64, step: f64) -> bool {
    (applied - requested).abs() > step / 2.0
}

/// Explicit `--output` wins (with ~ expansion); otherwise the configured dir.
fn resolve_output(explicit: Option<&Path>, output_dir: &Path, file_name: &str) -> PathBuf {
    match explicit {
        Some(path) => {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            PathBuf::from(expanded)
        }
        None => output_dir.join(file_name),
    }
}
