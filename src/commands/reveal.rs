//! Reveal command - recover a hidden file from an image or video.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::warn;

use stegbits::{reveal_from_image, reveal_from_video, Outcome, StegoConfig};

use super::{report, CarrierKind, CommandExecutor};

/// Recover a file hidden with `hide`.
///
/// From an image, the file is written next to the carrier as
/// <stem>_recovered.<ext>. From a video, it keeps its original name and goes
/// into the output directory.
#[derive(Args, Debug)]
pub struct RevealCommand {
    /// Stego image, or .y4m video
    #[arg(short, long)]
    pub carrier: PathBuf,

    /// Directory for files recovered from video (default: ./recovered)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Carrier type, detected from the file when omitted
    #[arg(long, value_enum)]
    pub kind: Option<CarrierKind>,
}

impl CommandExecutor for RevealCommand {
    fn execute(&self, config: &StegoConfig) -> Result<()> {
        let result = match CarrierKind::detect(&self.carrier, self.kind) {
            CarrierKind::Image => {
                if self.output_dir.is_some() {
                    warn!("--output-dir only applies to video; writing next to the image");
                }
                reveal_from_image(&self.carrier, config)
            }
            CarrierKind::Video => {
                reveal_from_video(&self.carrier, self.output_dir.as_deref(), config)
            }
        };

        report(Outcome::from_result(result))
    }
}
