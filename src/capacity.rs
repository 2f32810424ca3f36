//! Capacity planning.
//!
//! A carrier offers one bit slot per usable sample: three per pixel for images
//! (R, G, B), one per pixel per frame for video (channel 0 only). The check
//! runs before any sample is touched so a failure never leaves partial output.

use std::fmt;

use crate::error::StegoError;

/// Channels used per image pixel.
pub const IMAGE_CHANNELS: u64 = 3;

/// Channels used per video pixel.
pub const VIDEO_CHANNELS: u64 = 1;

/// Bit slots offered by an RGB image.
pub fn image_slots(width: u32, height: u32) -> u64 {
    u64::from(width) * u64::from(height) * IMAGE_CHANNELS
}

/// Bit slots offered by a video of `frames` frames.
pub fn video_slots(frames: u64, width: u32, height: u32) -> u64 {
    frames * u64::from(width) * u64::from(height) * VIDEO_CHANNELS
}

/// Capacity of a concrete carrier for a given header overhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    /// Total bit slots.
    pub slots: u64,
    /// Slots contributed by one pixel (3 for images, 1 for video).
    pub slots_per_pixel: u64,
    /// Header bytes written before the payload.
    pub header_bytes: u64,
}

impl CapacityReport {
    /// Capacity report for an image carrier.
    pub fn image(width: u32, height: u32, header_bytes: usize) -> Self {
        Self {
            slots: image_slots(width, height),
            slots_per_pixel: IMAGE_CHANNELS,
            header_bytes: header_bytes as u64,
        }
    }

    /// Capacity report for a video carrier.
    pub fn video(frames: u64, width: u32, height: u32, header_bytes: usize) -> Self {
        Self {
            slots: video_slots(frames, width, height),
            slots_per_pixel: VIDEO_CHANNELS,
            header_bytes: header_bytes as u64,
        }
    }

    /// Largest payload, in bytes, that fits after the header.
    pub fn max_payload(&self) -> u64 {
        (self.slots / 8).saturating_sub(self.header_bytes)
    }

    /// Returns true if a bit stream of `bits` bits fits.
    pub fn fits(&self, bits: u64) -> bool {
        bits <= self.slots
    }

    /// Fails with [`StegoError::InsufficientCapacity`] if `bits` does not fit.
    pub fn ensure_fits(&self, bits: u64) -> Result<(), StegoError> {
        if self.fits(bits) {
            return Ok(());
        }

        Err(StegoError::InsufficientCapacity {
            needed_bits: bits,
            available_bits: self.slots,
            max_payload: self.max_payload(),
            min_pixels: bits.div_ceil(self.slots_per_pixel),
        })
    }
}

impl fmt::Display for CapacityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bit slots, up to {} bytes of payload ({} header bytes)",
            self.slots,
            self.max_payload(),
            self.header_bytes
        )
    }
}
