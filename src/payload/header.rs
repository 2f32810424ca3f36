//! Header formats written in front of the hidden payload.
//!
//! Two self-describing layouts exist, one per carrier family. Both store the
//! payload length as a little-endian `u32`.
//!
//! Image header, fixed 15 bytes:
//!
//! ```text
//! [3 bytes] magic "STG"
//! [4 bytes] payload length (LE u32)
//! [8 bytes] extension, e.g. ".pdf", NUL padded
//! ```
//!
//! Video header, `1 + n + 4` bytes:
//!
//! ```text
//! [1 byte ] n = file name length
//! [n bytes] file name (UTF-8)
//! [4 bytes] payload length (LE u32)
//! ```

use crate::error::StegoError;
use crate::payload::SecretBlob;

/// Signature at the start of every image payload.
pub const IMAGE_MAGIC: &[u8; 3] = b"STG";

/// Bytes reserved for the extension in the image header.
pub const EXTENSION_FIELD_LEN: usize = 8;

/// Total size of the image header.
pub const IMAGE_HEADER_LEN: usize = IMAGE_MAGIC.len() + 4 + EXTENSION_FIELD_LEN;

/// Longest file name the video header can carry.
pub const MAX_NAME_LEN: usize = u8::MAX as usize;

/// A payload header the extractor can parse incrementally.
///
/// The extractor feeds the bytes recovered so far into [`Header::declared_len`]
/// until the total header length is known, then hands exactly that many bytes
/// to [`Header::parse`].
pub trait Header: Sized {
    /// Signature expected at the very start, empty if the format has none.
    const MAGIC: &'static [u8];

    /// Builds the header describing `blob`.
    fn for_blob(blob: &SecretBlob) -> Result<Self, StegoError>;

    /// Header length implied by `prefix`, or `None` if more bytes are needed.
    fn declared_len(prefix: &[u8]) -> Option<usize>;

    /// Parses a complete header. `bytes.len()` equals [`Header::declared_len`].
    fn parse(bytes: &[u8]) -> Self;

    /// Number of payload bytes following the header.
    fn payload_len(&self) -> usize;

    /// Serialized header bytes.
    fn to_bytes(&self) -> Vec<u8>;
}

/// Fixed-size header used by the image pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHeader {
    payload_len: u32,
    extension: [u8; EXTENSION_FIELD_LEN],
}

impl ImageHeader {
    /// Creates a header for a payload of `payload_len` bytes with the given extension.
    ///
    /// The extension is truncated to 8 bytes without splitting a character.
    pub fn new(extension: &str, payload_len: u32) -> Self {
        let mut field = [0u8; EXTENSION_FIELD_LEN];
        let truncated = truncate_utf8(extension, EXTENSION_FIELD_LEN);
        field[..truncated.len()].copy_from_slice(truncated.as_bytes());

        Self {
            payload_len,
            extension: field,
        }
    }

    /// The stored extension with NUL padding removed.
    ///
    /// Returns `None` if the field is not valid UTF-8.
    pub fn extension(&self) -> Option<String> {
        std::str::from_utf8(&self.extension)
            .ok()
            .map(|ext| ext.trim_matches('\0').to_string())
    }
}

impl Header for ImageHeader {
    const MAGIC: &'static [u8] = IMAGE_MAGIC;

    fn for_blob(blob: &SecretBlob) -> Result<Self, StegoError> {
        Ok(Self::new(blob.extension(), payload_len_u32(blob.len())?))
    }

    fn declared_len(_prefix: &[u8]) -> Option<usize> {
        Some(IMAGE_HEADER_LEN)
    }

    fn parse(bytes: &[u8]) -> Self {
        let mut len = [0u8; 4];
        len.copy_from_slice(&bytes[3..7]);
        let mut extension = [0u8; EXTENSION_FIELD_LEN];
        extension.copy_from_slice(&bytes[7..IMAGE_HEADER_LEN]);

        Self {
            payload_len: u32::from_le_bytes(len),
            extension,
        }
    }

    fn payload_len(&self) -> usize {
        self.payload_len as usize
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(IMAGE_HEADER_LEN);
        bytes.extend_from_slice(IMAGE_MAGIC);
        bytes.extend_from_slice(&self.payload_len.to_le_bytes());
        bytes.extend_from_slice(&self.extension);
        bytes
    }
}

/// Variable-size header used by the video pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoHeader {
    name: Vec<u8>,
    payload_len: u32,
}

impl VideoHeader {
    /// Creates a header carrying `name`, truncated to 255 bytes on a character boundary.
    pub fn new(name: &str, payload_len: u32) -> Self {
        Self {
            name: truncate_utf8(name, MAX_NAME_LEN).as_bytes().to_vec(),
            payload_len,
        }
    }

    /// The stored file name, or `None` if it is not valid UTF-8.
    pub fn name(&self) -> Option<String> {
        String::from_utf8(self.name.clone()).ok()
    }
}

impl Header for VideoHeader {
    const MAGIC: &'static [u8] = b"";

    fn for_blob(blob: &SecretBlob) -> Result<Self, StegoError> {
        Ok(Self::new(blob.file_name(), payload_len_u32(blob.len())?))
    }

    fn declared_len(prefix: &[u8]) -> Option<usize> {
        prefix.first().map(|&name_len| 1 + name_len as usize + 4)
    }

    fn parse(bytes: &[u8]) -> Self {
        let name_end = 1 + bytes[0] as usize;
        let mut len = [0u8; 4];
        len.copy_from_slice(&bytes[name_end..name_end + 4]);

        Self {
            name: bytes[1..name_end].to_vec(),
            payload_len: u32::from_le_bytes(len),
        }
    }

    fn payload_len(&self) -> usize {
        self.payload_len as usize
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.name.len() + 4);
        // `new` caps the name at 255 bytes
        bytes.push(self.name.len() as u8);
        bytes.extend_from_slice(&self.name);
        bytes.extend_from_slice(&self.payload_len.to_le_bytes());
        bytes
    }
}

/// Payload length as stored in a header; the length field is 32 bits wide.
fn payload_len_u32(len: usize) -> Result<u32, StegoError> {
    u32::try_from(len).map_err(|_| StegoError::PayloadTooLarge(len as u64))
}

/// Longest prefix of `s` that fits in `max` bytes and ends on a char boundary.
fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
