//! LSB embedding and extraction for image and video carriers.
//!
//! Both pipelines share the same two primitives: [`embed_bits`] walks carrier
//! samples in order and replaces each one's lowest bit, and [`feed_samples`]
//! pushes sample LSBs into an [`Extractor`] in the same order. The order is
//! the only thing connecting the two sides.

pub mod image;
pub mod video;

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::StegoError;
use crate::extract::{Extractor, Recovered};
use crate::payload::Header;

pub use self::image::{hide_in_image, image_capacity, reveal_from_image, ImageStego};
pub use self::video::{
    embed_frames, extract_frames, hide_in_video, reveal_from_video, video_capacity,
};

/// Overwrites the LSB of each slot with the next pending bit.
///
/// Stops at whichever runs out first and returns the number of bits written.
/// A bit is only taken from `bits` once a slot is available for it.
pub fn embed_bits<'a, S, B>(slots: S, bits: &mut B) -> u64
where
    S: IntoIterator<Item = &'a mut u8>,
    B: Iterator<Item = u8>,
{
    let mut written = 0u64;
    for slot in slots {
        let Some(bit) = bits.next() else {
            break;
        };
        *slot = (*slot & !1) | bit;
        written += 1;
    }
    written
}

/// Pushes the LSB of each sample into `extractor`.
///
/// Returns the recovered file as soon as it is complete.
pub fn feed_samples<'a, H, S>(
    extractor: &mut Extractor<H>,
    samples: S,
) -> Result<Option<Recovered<H>>, StegoError>
where
    H: Header,
    S: IntoIterator<Item = &'a u8>,
{
    for &sample in samples {
        if let Some(recovered) = extractor.push_bit(sample & 1)? {
            return Ok(Some(recovered));
        }
    }
    Ok(None)
}

/// Writes `path` through a temporary file in the same directory.
///
/// The destination only appears once `write` succeeds; on any error the
/// temporary file is removed and `path` is left untouched.
pub(crate) fn persist_with<F>(path: &Path, write: F) -> Result<(), StegoError>
where
    F: FnOnce(&mut File) -> Result<(), StegoError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StegoError::output_write(path, e))?;
    write(tmp.as_file_mut())?;
    tmp.as_file_mut()
        .sync_all()
        .map_err(|e| StegoError::output_write(path, e))?;
    tmp.persist(path)
        .map_err(|e| StegoError::output_write(path, e.error))?;

    Ok(())
}

/// Writes a recovered payload to `path` in one atomic step.
pub(crate) fn write_payload(path: &Path, payload: &[u8]) -> Result<(), StegoError> {
    persist_with(path, |file| {
        file.write_all(payload)
            .map_err(|e| StegoError::output_write(path, e))
    })
}
