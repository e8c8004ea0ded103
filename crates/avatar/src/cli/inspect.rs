//! The `avatar inspect` command.

use anyhow::Context;
use avatar_core::output::write_json;
use avatar_core::pipeline::{ImageDecoder, Validator};
use avatar_core::{Config, InspectReport};
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Image file to inspect
    #[arg(required = true)]
    pub input: PathBuf,

    /// Print compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

/// Execute the inspect command.
pub async fn execute(args: InspectArgs, config: &Config) -> anyhow::Result<()> {
    let report = inspect(&args.input, config)?;
    if !report.accepted {
        tracing::warn!(
            "{} would be rejected: {}",
            report.file_name,
            report.rejection.as_deref().unwrap_or_default()
        );
    }
    write_json(&mut std::io::stdout().lock(), &report, !args.compact)?;
    Ok(())
}

/// Run intake checks and a header probe without opening a session.
fn inspect(path: &Path, config: &Config) -> anyhow::Result<InspectReport> {
    let validator = Validator::new(config.limits.clone());
    let selected = validator
        .select_path(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let rejection = validator
        .validate(&selected)
        .err()
        .map(|e| e.to_string());
    let info = ImageDecoder::probe(selected.content());
    Ok(InspectReport::new(&selected, rejection, info))
}
