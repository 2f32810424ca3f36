//! Framing of the secret file into a bit stream.
//!
//! A [`SecretBlob`] holds the file to hide. [`BitStream::frame`] prepends the
//! pipeline's [`Header`] and exposes the result as bits, most significant bit
//! of each byte first.

pub mod header;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::StegoError;

pub use header::{Header, ImageHeader, VideoHeader};

/// The file to hide: raw bytes plus the metadata stored in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretBlob {
    bytes: Vec<u8>,
    file_name: String,
    extension: String,
}

impl SecretBlob {
    /// Reads the whole secret file into memory.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StegoError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| StegoError::source_read(path, e))?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        debug!(path = %path.display(), size = bytes.len(), "loaded secret file");
        Ok(Self::from_bytes(file_name, bytes))
    }

    /// Wraps in-memory bytes under the given file name.
    ///
    /// The extension is derived from the name: lower-cased, with a leading
    /// dot, or empty if the name has none.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let extension = Path::new(&file_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        Self {
            bytes,
            file_name,
            extension,
        }
    }

    /// Payload bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Original base file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Original extension including the dot, e.g. `".pdf"`, or `""`.
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

/// `header ∥ payload` viewed as a sequence of bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitStream {
    bytes: Vec<u8>,
    header_len: usize,
}

impl BitStream {
    /// Frames `blob` with the header format `H`.
    pub fn frame<H: Header>(blob: &SecretBlob) -> Result<Self, StegoError> {
        let header = H::for_blob(blob)?.to_bytes();

        let mut bytes = Vec::with_capacity(header.len() + blob.len());
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(blob.bytes());

        debug!(
            header_bytes = header.len(),
            payload_bytes = blob.len(),
            "framed secret"
        );
        Ok(Self {
            bytes,
            header_len: header.len(),
        })
    }

    /// Wraps already framed bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            header_len: 0,
        }
    }

    /// Header bytes at the front of the stream.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Number of bits, `8 * (header + payload)`.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64 * 8
    }

    /// Returns true if there are no bits to embed.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The framed bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Iterates the bits, most significant bit of each byte first.
    pub fn bits(&self) -> impl Iterator<Item = u8> + '_ {
        self.bytes
            .iter()
            .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1))
    }
}
