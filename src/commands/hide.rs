//! Hide command - embed a file in an image or video.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use stegbits::{hide_in_image, hide_in_video, Outcome, StegoConfig};

use super::{report, CarrierKind, CommandExecutor};

/// Hide a file in the least significant bits of a carrier.
///
/// Images are written as PNG, videos as uncompressed Y4M. Both are lossless,
/// so the hidden bits survive.
#[derive(Args, Debug)]
pub struct HideCommand {
    /// Cover image, or .y4m video
    #[arg(short, long)]
    pub carrier: PathBuf,

    /// File to hide
    #[arg(short, long)]
    pub secret: PathBuf,

    /// Output path (default: <carrier stem>_stego.png or .y4m next to the carrier)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Carrier type, detected from the file when omitted
    #[arg(long, value_enum)]
    pub kind: Option<CarrierKind>,
}

impl CommandExecutor for HideCommand {
    fn execute(&self, config: &StegoConfig) -> Result<()> {
        let output = self.output.as_deref();

        let result = match CarrierKind::detect(&self.carrier, self.kind) {
            CarrierKind::Image => hide_in_image(&self.carrier, &self.secret, output, config),
            CarrierKind::Video => hide_in_video(&self.carrier, &self.secret, output, config),
        };

        report(Outcome::from_result(result))
    }
}
