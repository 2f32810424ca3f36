//! # Stegbits - hide a file in the low bits of an image or a video
//!
//! Stegbits hides an arbitrary file in the least significant bits (LSBs) of a
//! carrier and recovers it byte-exact later. Overwriting an LSB changes a
//! sample by at most one, which is invisible in natural images and video.
//!
//! ## Carriers
//!
//! - **Images**: any format the `image` crate decodes. Every pixel gives three
//!   bit slots (R, G, B), visited in row-major order. Output is always PNG.
//! - **Video**: uncompressed YUV4MPEG2 (`.y4m`) streams. Every pixel of every
//!   frame gives one bit slot in the luma plane. Frames are processed one at a
//!   time, and the output keeps the resolution, frame rate and frame count.
//!
//! ## Wire format
//!
//! ```text
//! image:  "STG" | u32 LE payload length | 8-byte extension | payload
//! video:  u8 name length | name | u32 LE payload length | payload
//! ```
//!
//! Bytes are spread over slots most significant bit first.
//!
//! ## Example Usage
//!
//! ```rust
//! use image::{DynamicImage, RgbImage};
//! use stegbits::{ImageStego, SecretBlob};
//!
//! let cover = ImageStego::from_image(DynamicImage::ImageRgb8(RgbImage::new(64, 64)));
//! let secret = SecretBlob::from_bytes("note.txt", b"meet at noon".to_vec());
//!
//! let stego = cover.hide(&secret).unwrap();
//! let recovered = stego.extract().unwrap();
//!
//! assert_eq!(recovered.payload, b"meet at noon");
//! assert_eq!(recovered.header.extension().as_deref(), Some(".txt"));
//! ```

pub mod capacity;
pub mod config;
pub mod error;
pub mod extract;
pub mod naming;
pub mod outcome;
pub mod payload;
pub mod stego;
pub mod video;

pub use capacity::CapacityReport;
pub use config::{ConfigError, StegoConfig};
pub use error::StegoError;
pub use extract::{extract_bits, ExtractState, Extractor, Recovered};
pub use outcome::{EmbedReport, ExtractReport, Outcome};
pub use payload::{BitStream, Header, ImageHeader, SecretBlob, VideoHeader};
pub use stego::{
    embed_frames, extract_frames, hide_in_image, hide_in_video, image_capacity,
    reveal_from_image, reveal_from_video, video_capacity, ImageStego,
};
pub use video::{Frame, FrameSink, FrameSource, VideoInfo, Y4mReader, Y4mWriter};

/// Version of the stegbits crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
