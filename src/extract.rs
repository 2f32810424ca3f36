//! Streaming extraction of a hidden payload.
//!
//! [`Extractor`] consumes LSBs one at a time in carrier order and assembles
//! them into bytes. It moves through three states:
//!
//! 1. `ReadingMagic`: only for formats with a signature; a mismatch ends
//!    extraction with [`StegoError::NoSignatureFound`].
//! 2. `ReadingHeader`: until the header length implied by the bytes read so
//!    far is reached.
//! 3. `ReadingPayload`: until the declared payload length is reached.
//!
//! Nothing is written anywhere until the full payload has been recovered.

use tracing::debug;

use crate::error::StegoError;
use crate::payload::Header;

/// Upper bound on the buffer reserved up front from a declared payload length.
const MAX_PREALLOC: usize = 1 << 20;

/// Observable extraction state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractState {
    /// Waiting for the signature bytes. Skipped for headers without one.
    ReadingMagic,
    /// Collecting the rest of the header.
    ReadingHeader,
    /// Header parsed, collecting the declared payload bytes.
    ReadingPayload,
    /// The whole payload has been recovered.
    Done,
}

enum State<H> {
    ReadingMagic,
    ReadingHeader,
    ReadingPayload { header: H, header_len: usize, end: usize },
    Done,
}

/// A payload recovered from a carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered<H> {
    /// The parsed header.
    pub header: H,
    /// The payload bytes, exactly `header.payload_len()` of them.
    pub payload: Vec<u8>,
    /// Carrier bit slots consumed to recover it.
    pub bits_read: u64,
}

/// Incremental LSB-to-file state machine.
pub struct Extractor<H: Header> {
    buffer: Vec<u8>,
    current: u8,
    bit_count: u8,
    bits_read: u64,
    state: State<H>,
}

impl<H: Header> Default for Extractor<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Header> Extractor<H> {
    /// Creates an extractor waiting for the first bit.
    pub fn new() -> Self {
        let state = if H::MAGIC.is_empty() {
            State::ReadingHeader
        } else {
            State::ReadingMagic
        };

        Self {
            buffer: Vec::new(),
            current: 0,
            bit_count: 0,
            bits_read: 0,
            state,
        }
    }

    /// Current state.
    pub fn state(&self) -> ExtractState {
        match self.state {
            State::ReadingMagic => ExtractState::ReadingMagic,
            State::ReadingHeader => ExtractState::ReadingHeader,
            State::ReadingPayload { .. } => ExtractState::ReadingPayload,
            State::Done => ExtractState::Done,
        }
    }

    /// Bytes assembled so far, header included.
    pub fn bytes_recovered(&self) -> usize {
        self.buffer.len()
    }

    /// Feeds the next LSB (`0` or `1`).
    ///
    /// Returns the recovered file once the last payload bit arrives. Bits
    /// pushed after that are ignored.
    pub fn push_bit(&mut self, bit: u8) -> Result<Option<Recovered<H>>, StegoError> {
        if matches!(self.state, State::Done) {
            return Ok(None);
        }

        self.current = (self.current << 1) | (bit & 1);
        self.bit_count += 1;
        self.bits_read += 1;

        if self.bit_count < 8 {
            return Ok(None);
        }

        let byte = self.current;
        self.current = 0;
        self.bit_count = 0;
        self.push_byte(byte)
    }

    fn push_byte(&mut self, byte: u8) -> Result<Option<Recovered<H>>, StegoError> {
        self.buffer.push(byte);

        if let State::ReadingMagic = self.state {
            if self.buffer.len() < H::MAGIC.len() {
                return Ok(None);
            }
            if self.buffer != H::MAGIC {
                debug!(found = ?self.buffer, "signature mismatch");
                self.state = State::Done;
                return Err(StegoError::NoSignatureFound);
            }
            self.state = State::ReadingHeader;
        }

        if let State::ReadingHeader = self.state {
            let Some(header_len) = H::declared_len(&self.buffer) else {
                return Ok(None);
            };
            if self.buffer.len() < header_len {
                return Ok(None);
            }

            let header = H::parse(&self.buffer[..header_len]);
            let payload_len = header.payload_len();
            debug!(header_len, payload_len, "header parsed");

            self.buffer.reserve(payload_len.min(MAX_PREALLOC));
            self.state = State::ReadingPayload {
                header,
                header_len,
                end: header_len + payload_len,
            };
        }

        if let State::ReadingPayload { end, .. } = self.state {
            if self.buffer.len() < end {
                return Ok(None);
            }
            if let State::ReadingPayload {
                header, header_len, ..
            } = std::mem::replace(&mut self.state, State::Done)
            {
                let payload = self.buffer.split_off(header_len);
                return Ok(Some(Recovered {
                    header,
                    payload,
                    bits_read: self.bits_read,
                }));
            }
        }

        Ok(None)
    }

    /// Explains why the carrier ran out before a file was recovered.
    pub fn exhausted(self) -> StegoError {
        let recovered = self.buffer.len();

        match self.state {
            State::ReadingMagic => StegoError::TruncatedData {
                recovered,
                expected: H::MAGIC.len(),
            },
            State::ReadingHeader => {
                let reason = match H::declared_len(&self.buffer) {
                    Some(declared) => format!(
                        "header declares {declared} bytes but the carrier only holds {recovered}"
                    ),
                    None => "carrier holds no header bytes".to_string(),
                };
                StegoError::HeaderCorrupt(reason)
            }
            State::ReadingPayload { end, .. } => StegoError::TruncatedData {
                recovered,
                expected: end,
            },
            State::Done => StegoError::TruncatedData {
                recovered,
                expected: recovered,
            },
        }
    }
}

/// Runs an [`Extractor`] over a complete bit sequence.
///
/// Stops consuming `bits` as soon as the payload is complete.
pub fn extract_bits<H, I>(bits: I) -> Result<Recovered<H>, StegoError>
where
    H: Header,
    I: IntoIterator<Item = u8>,
{
    let mut extractor = Extractor::<H>::new();
    for bit in bits {
        if let Some(recovered) = extractor.push_bit(bit)? {
            return Ok(recovered);
        }
    }
    Err(extractor.exhausted())
}
