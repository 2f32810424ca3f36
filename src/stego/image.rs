//! LSB steganography for images.
//!
//! Hides a file in the least significant bits of the R, G and B samples of
//! every pixel, visited in row-major order. The stream starts with the 15-byte
//! `STG` header (see [`ImageHeader`]), so extraction needs nothing but the
//! stego image itself.
//!
//! Output is always PNG: any lossy re-encoding would destroy the hidden bits.

use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbImage};
use tracing::{debug, info, warn};

use crate::capacity::CapacityReport;
use crate::config::StegoConfig;
use crate::error::StegoError;
use crate::extract::{Extractor, Recovered};
use crate::naming::{normalize_extension, sibling_with_suffix};
use crate::outcome::{EmbedReport, ExtractReport};
use crate::payload::header::IMAGE_HEADER_LEN;
use crate::payload::{BitStream, ImageHeader, SecretBlob};

use super::{embed_bits, feed_samples, persist_with, write_payload};

/// Image steganography handler over an 8-bit RGB pixel grid.
#[derive(Debug, Clone)]
pub struct ImageStego {
    image: RgbImage,
}

impl ImageStego {
    /// Loads and decodes an image file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, StegoError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|e| StegoError::source_read(path, e))?;
        debug!(path = %path.display(), width = image.width(), height = image.height(), "loaded carrier image");
        Ok(Self::from_image(image))
    }

    /// Decodes an image from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StegoError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| StegoError::source_read(Path::new("<memory>"), e))?;
        Ok(Self::from_image(image))
    }

    /// Wraps a decoded image, converting it to RGB8.
    pub fn from_image(image: DynamicImage) -> Self {
        Self {
            image: image.to_rgb8(),
        }
    }

    /// Capacity of this image for the fixed image header.
    pub fn capacity(&self) -> CapacityReport {
        let (width, height) = self.image.dimensions();
        CapacityReport::image(width, height, IMAGE_HEADER_LEN)
    }

    /// Returns a copy of the image with `blob` hidden in it.
    ///
    /// Fails before touching any sample if the framed secret does not fit.
    pub fn hide(&self, blob: &SecretBlob) -> Result<Self, StegoError> {
        let stream = BitStream::frame::<ImageHeader>(blob)?;
        self.capacity().ensure_fits(stream.len())?;

        let mut output = self.image.clone();
        let written = embed_bits(
            output.pixels_mut().flat_map(|pixel| pixel.0.iter_mut()),
            &mut stream.bits(),
        );

        if written != stream.len() {
            return Err(StegoError::IncompleteEmbedding {
                written,
                expected: stream.len(),
            });
        }

        debug!(bits = written, "embedded secret in image");
        Ok(Self { image: output })
    }

    /// Recovers the hidden file.
    pub fn extract(&self) -> Result<Recovered<ImageHeader>, StegoError> {
        let mut extractor = Extractor::<ImageHeader>::new();
        let samples = self.image.pixels().flat_map(|pixel| pixel.0.iter());

        match feed_samples(&mut extractor, samples)? {
            Some(recovered) => Ok(recovered),
            None => Err(extractor.exhausted()),
        }
    }

    /// Saves the image as PNG, whatever the extension of `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StegoError> {
        let path = path.as_ref();
        persist_with(path, |file| {
            let mut writer = BufWriter::new(file);
            self.image
                .write_to(&mut writer, ImageFormat::Png)
                .map_err(|e| StegoError::output_write(path, e))?;
            writer.flush()?;
            Ok(())
        })
    }

    /// Returns the image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, StegoError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| StegoError::output_write(Path::new("<memory>"), e))?;
        Ok(bytes)
    }

    /// Returns a reference to the underlying image.
    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Consumes self and returns the underlying image.
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

/// Capacity of the image at `carrier`.
pub fn image_capacity(carrier: &Path) -> Result<CapacityReport, StegoError> {
    Ok(ImageStego::from_file(carrier)?.capacity())
}

/// Hides `secret` in the image `carrier` and writes the result as PNG.
///
/// Without `output`, the result goes next to the carrier as
/// `<stem><output_suffix>.png`.
pub fn hide_in_image(
    carrier: &Path,
    secret: &Path,
    output: Option<&Path>,
    config: &StegoConfig,
) -> Result<EmbedReport, StegoError> {
    let blob = SecretBlob::from_path(secret)?;
    let stego = ImageStego::from_file(carrier)?;
    let capacity = stego.capacity();

    let hidden = stego.hide(&blob)?;

    let output = match output {
        Some(path) => path.to_path_buf(),
        None => sibling_with_suffix(carrier, &config.output_suffix, ".png"),
    };
    if !has_png_extension(&output) {
        warn!(path = %output.display(), "output is written as PNG regardless of its extension");
    }
    hidden.save(&output)?;

    let bits_embedded = (IMAGE_HEADER_LEN + blob.len()) as u64 * 8;
    info!(
        output = %output.display(),
        payload_bytes = blob.len(),
        bits = bits_embedded,
        "hid secret in image"
    );
    Ok(EmbedReport {
        output,
        payload_bytes: blob.len(),
        bits_embedded,
        capacity,
    })
}

/// Recovers the file hidden in the image `carrier`.
///
/// The file is written next to the carrier as
/// `<stem><recovered_suffix><ext>`, where `ext` is the stored extension or the
/// configured fallback if it is missing or unreadable.
pub fn reveal_from_image(carrier: &Path, config: &StegoConfig) -> Result<ExtractReport, StegoError> {
    let recovered = ImageStego::from_file(carrier)?.extract()?;

    let stored = recovered.header.extension();
    if stored.is_none() {
        warn!("stored extension is not valid UTF-8, using fallback");
    }

    let mut extension = normalize_extension(stored.as_deref(), "");
    let used_fallback = extension.is_empty();
    if used_fallback {
        extension = config.image_fallback_extension.clone();
    }

    let output = sibling_with_suffix(carrier, &config.recovered_suffix, &extension);
    write_payload(&output, &recovered.payload)?;

    info!(
        output = %output.display(),
        size = recovered.payload.len(),
        extension = %extension,
        "recovered file from image"
    );
    Ok(ExtractReport {
        output,
        size: recovered.payload.len(),
        kind: extension,
        used_fallback,
    })
}

fn has_png_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}
