//! Avatar CLI - select, crop, and encode square profile photos.
//!
//! The CLI plays the part of the profile page: it picks a file from disk,
//! drives the crop surface from its arguments, confirms, and writes the
//! resulting JPEG. Uploading it is left to the caller.
//!
//! # Usage
//!
//! ```bash
//! # Centered square crop at 1.5x zoom
//! avatar crop photo.jpg --zoom 1.5
//!
//! # Explicit geometry, JSON report on stdout
//! avatar crop photo.jpg --x 10 --y 10 --size 200 --json
//!
//! # Check whether a file would be accepted
//! avatar inspect resume.pdf
//!
//! # View configuration
//! avatar config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Avatar - square profile photo cropping.
#[derive(Parser, Debug)]
#[command(name = "avatar")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Crop an image to a square JPEG avatar
    Crop(cli::crop::CropArgs),

    /// Report whether an image would be accepted, and its dimensions
    Inspect(cli::inspect::InspectArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match avatar_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `avatar config path`."
            );
            avatar_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("avatar v{}", avatar_core::VERSION);

    match cli.command {
        Commands::Crop(args) => cli::crop::execute(args, &config).await,
        Commands::Inspect(args) => cli::inspect::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_crop_with_geometry() {
        let cli = Cli::try_parse_from([
            "avatar", "crop", "photo.jpg", "--x", "10", "--y", "10", "--size", "200",
        ])
        .unwrap();
        match cli.command {
            Commands::Crop(args) => {
                assert_eq!(args.size, Some(200.0));
                assert_eq!(args.zoom, 1.0);
            }
            other => panic!("Expected crop, got {:?}", other),
        }
    }

    #[test]
    fn rejects_partial_geometry() {
        let result = Cli::try_parse_from(["avatar", "crop", "photo.jpg", "--x", "10"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["avatar", "inspect", "a.png", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }
}
