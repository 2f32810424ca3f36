//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor` trait.

mod capacity;
mod hide;
mod reveal;

pub use capacity::CapacityCommand;
pub use hide::HideCommand;
pub use reveal::RevealCommand;

use std::path::Path;

use anyhow::{bail, Result};
use clap::ValueEnum;

use stegbits::video::y4m::STREAM_MAGIC;
use stegbits::{Outcome, StegoConfig};

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements
/// this trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments.
    fn execute(&self, config: &StegoConfig) -> Result<()>;
}

/// Which pipeline handles a carrier.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CarrierKind {
    Image,
    Video,
}

impl CarrierKind {
    /// Uses `explicit` if given, otherwise `.y4m` files are video and everything else is an image.
    pub fn detect(path: &Path, explicit: Option<CarrierKind>) -> Self {
        if let Some(kind) = explicit {
            return kind;
        }

        let is_y4m = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("y4m"))
            .unwrap_or(false);

        if is_y4m || starts_with_y4m_magic(path) {
            CarrierKind::Video
        } else {
            CarrierKind::Image
        }
    }
}

fn starts_with_y4m_magic(path: &Path) -> bool {
    use std::io::Read;

    let mut magic = [0u8; 9];
    std::fs::File::open(path)
        .and_then(|mut file| file.read_exact(&mut magic))
        .map(|()| magic.as_slice() == STREAM_MAGIC)
        .unwrap_or(false)
}

/// Prints a successful outcome, or turns a failed one into an error.
pub fn report(outcome: Outcome) -> Result<()> {
    if !outcome.success {
        bail!(outcome.message);
    }
    println!("{}", outcome.message);
    Ok(())
}
