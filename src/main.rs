//! Stegbits - hide a file in the low bits of an image or a video.

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stegbits::StegoConfig;

use commands::{CapacityCommand, CommandExecutor, HideCommand, RevealCommand};

/// Stegbits - hide a file in the low bits of an image or a video
///
/// Images can be any common raster format and are written back as PNG.
/// Videos are uncompressed YUV4MPEG2 (.y4m) streams.
#[derive(Parser)]
#[command(name = "stegbits")]
#[command(version)]
#[command(about = "Hide any file in the least significant bits of an image or a video")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.stegbits/config.toml if it exists)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug output (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hide a file in an image or video
    Hide(HideCommand),

    /// Recover a hidden file from an image or video
    Reveal(RevealCommand),

    /// Show how many bytes a carrier can hold
    Capacity(CapacityCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = StegoConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match &cli.command {
        Commands::Hide(cmd) => cmd.execute(&config),
        Commands::Reveal(cmd) => cmd.execute(&config),
        Commands::Capacity(cmd) => cmd.execute(&config),
    }
}

/// Logs go to stderr so stdout only carries command results.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("stegbits=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stegbits=info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
