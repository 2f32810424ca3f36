//! Error types for embedding and extraction.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while hiding a file in a carrier or recovering it.
///
/// Every public operation returns these as values; none of them aborts the
/// process. A name or extension that fails UTF-8 decoding is not an error:
/// the recovered file is flagged with `used_fallback` instead.
#[derive(Error, Debug)]
pub enum StegoError {
    /// The secret file or the carrier could not be opened or decoded.
    #[error("Cannot read {}: {reason}", path.display())]
    SourceRead {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },

    /// The framed payload needs more bit slots than the carrier provides.
    #[error(
        "Secret too large for this carrier: needs {needed_bits} bit slots, carrier has \
         {available_bits} (max payload {max_payload} bytes, a carrier of at least \
         {min_pixels} pixels is required)"
    )]
    InsufficientCapacity {
        /// Bits required for header and payload.
        needed_bits: u64,
        /// Bit slots the carrier provides.
        available_bits: u64,
        /// Largest secret, in bytes, that this carrier can hold.
        max_payload: u64,
        /// Smallest number of pixels (or samples per frame set) that would fit.
        min_pixels: u64,
    },

    /// The secret cannot be described by the header's 32-bit length field.
    #[error("Secret is {0} bytes; the header length field holds at most 4294967295")]
    PayloadTooLarge(u64),

    /// The first recovered bytes are not the expected signature.
    #[error("No 'STG' signature found; the carrier holds no hidden file")]
    NoSignatureFound,

    /// The carrier ran out of samples before the declared payload was complete.
    #[error("Reached the end of the carrier without finding the end of the file ({recovered} of {expected} bytes recovered)")]
    TruncatedData {
        /// Bytes recovered before the carrier ran out.
        recovered: usize,
        /// Bytes the header declared (header plus payload), if known.
        expected: usize,
    },

    /// The header declares a byte range the carrier does not hold.
    #[error("Header incomplete or corrupt: {0}")]
    HeaderCorrupt(String),

    /// The embedder walked the whole carrier without consuming every bit.
    ///
    /// This only happens when capacity planning and the carrier disagree,
    /// which is a bug rather than a user error.
    #[error("Internal error: only {written} of {expected} bits were embedded")]
    IncompleteEmbedding {
        /// Bits written into the carrier.
        written: u64,
        /// Bits in the framed payload.
        expected: u64,
    },

    /// The carrier is readable but uses a layout this crate does not handle.
    #[error("Unsupported carrier format: {0}")]
    UnsupportedFormat(String),

    /// The output file could not be created or written.
    #[error("Cannot write {}: {reason}", path.display())]
    OutputWrite {
        /// Destination path.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StegoError {
    pub(crate) fn source_read(path: &Path, reason: impl ToString) -> Self {
        Self::SourceRead {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn output_write(path: &Path, reason: impl ToString) -> Self {
        Self::OutputWrite {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
