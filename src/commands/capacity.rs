//! Capacity command - show how much a carrier can hold.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use stegbits::{image_capacity, video_capacity, Outcome, SecretBlob, StegoConfig, StegoError};

use super::{report, CarrierKind, CommandExecutor};

/// Show the capacity of a carrier, and optionally whether a file fits.
#[derive(Args, Debug)]
pub struct CapacityCommand {
    /// Image, or .y4m video
    #[arg(short, long)]
    pub carrier: PathBuf,

    /// File to check against the capacity
    #[arg(short, long)]
    pub secret: Option<PathBuf>,

    /// Carrier type, detected from the file when omitted
    #[arg(long, value_enum)]
    pub kind: Option<CarrierKind>,
}

impl CommandExecutor for CapacityCommand {
    fn execute(&self, _config: &StegoConfig) -> Result<()> {
        report(Outcome::from_result(self.check()))
    }
}

impl CapacityCommand {
    fn check(&self) -> Result<String, StegoError> {
        let secret = self
            .secret
            .as_deref()
            .map(SecretBlob::from_path)
            .transpose()?;

        let capacity = match CarrierKind::detect(&self.carrier, self.kind) {
            CarrierKind::Image => image_capacity(&self.carrier)?,
            CarrierKind::Video => video_capacity(&self.carrier, secret.as_ref())?,
        };

        let mut message = format!("{}: {capacity}", self.carrier.display());
        if let Some(blob) = secret {
            let needed = (capacity.header_bytes + blob.len() as u64) * 8;
            capacity.ensure_fits(needed)?;
            message.push_str(&format!(
                "\n{} ({} bytes) fits: {needed} of {} bit slots",
                blob.file_name(),
                blob.len(),
                capacity.slots
            ));
        }

        Ok(message)
    }
}
