//! Operation reports and the `(success, message)` result pair.

use std::fmt;
use std::path::PathBuf;

use crate::capacity::CapacityReport;
use crate::error::StegoError;

/// Summary of a successful embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedReport {
    /// The stego carrier that was written.
    pub output: PathBuf,
    /// Size of the hidden file in bytes.
    pub payload_bytes: usize,
    /// Header and payload bits written.
    pub bits_embedded: u64,
    /// Capacity of the carrier.
    pub capacity: CapacityReport,
}

impl fmt::Display for EmbedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Hidden {} bytes in {} ({} of {} bit slots used)",
            self.payload_bytes,
            self.output.display(),
            self.bits_embedded,
            self.capacity.slots
        )
    }
}

/// Summary of a successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    /// Where the recovered file was written.
    pub output: PathBuf,
    /// Recovered payload size in bytes.
    pub size: usize,
    /// Recovered extension (image) or file name (video).
    pub kind: String,
    /// True if the stored name or extension was unusable and a fallback was used.
    pub used_fallback: bool,
}

impl fmt::Display for ExtractReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Recovered {} bytes\nType: {}{}\nSaved: {}",
            self.size,
            self.kind,
            if self.used_fallback { " (fallback)" } else { "" },
            self.output.display()
        )
    }
}

/// Human-readable result of an operation, for display layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    /// Converts an operation result into a success flag and message.
    pub fn from_result<T: fmt::Display>(result: Result<T, StegoError>) -> Self {
        match result {
            Ok(report) => Self {
                success: true,
                message: report.to_string(),
            },
            Err(e) => Self {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

impl<T: fmt::Display> From<Result<T, StegoError>> for Outcome {
    fn from(result: Result<T, StegoError>) -> Self {
        Self::from_result(result)
    }
}
