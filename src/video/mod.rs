//! Frame-level access to video carriers.
//!
//! The stego pipeline only needs to pull decoded frames one at a time and
//! push patched frames back out, so decoding and encoding sit behind
//! [`FrameSource`] and [`FrameSink`]. The bundled implementation reads and
//! writes uncompressed YUV4MPEG2 streams (see [`y4m`]), which are lossless.

pub mod y4m;

use crate::error::StegoError;

pub use y4m::{Colorspace, Y4mHeader, Y4mReader, Y4mWriter};

/// Geometry and length of a video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frame rate as numerator and denominator.
    pub frame_rate: (u32, u32),
    /// Number of complete frames in the stream.
    pub frame_count: u64,
}

/// One decoded frame: a set of planes, channel 0 first.
///
/// `Frame::default()` is an empty buffer; a [`FrameSource`] sizes it on the
/// first successful read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    planes: Vec<Vec<u8>>,
    params: Vec<u8>,
}

impl Frame {
    /// Creates a frame from its planes. The first plane must be `width * height` samples.
    pub fn new(width: u32, height: u32, planes: Vec<Vec<u8>>) -> Self {
        debug_assert_eq!(
            planes.first().map(Vec::len),
            Some(width as usize * height as usize)
        );
        Self {
            width,
            height,
            planes,
            params: Vec::new(),
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All planes in stream order.
    pub fn planes(&self) -> &[Vec<u8>] {
        &self.planes
    }

    pub(crate) fn planes_mut(&mut self) -> &mut [Vec<u8>] {
        &mut self.planes
    }

    /// Resizes the planes in place, reusing the existing allocations.
    pub(crate) fn reshape(&mut self, width: u32, height: u32, plane_sizes: &[usize]) {
        self.width = width;
        self.height = height;
        self.planes.resize_with(plane_sizes.len(), Vec::new);
        for (plane, &size) in self.planes.iter_mut().zip(plane_sizes) {
            plane.resize(size, 0);
        }
    }

    /// Channel 0 samples, row-major. Empty before the first read.
    pub fn channel0(&self) -> &[u8] {
        self.planes.first().map(Vec::as_slice).unwrap_or_default()
    }

    /// Mutable channel 0 samples, row-major.
    pub fn channel0_mut(&mut self) -> &mut [u8] {
        self.planes
            .first_mut()
            .map(Vec::as_mut_slice)
            .unwrap_or_default()
    }

    /// Container-specific frame parameters, passed through unchanged.
    pub fn params(&self) -> &[u8] {
        &self.params
    }

    pub(crate) fn set_params(&mut self, params: &[u8]) {
        self.params.clear();
        self.params.extend_from_slice(params);
    }
}

/// A decoder producing frames in stream order.
pub trait FrameSource {
    /// Stream geometry, available before any frame is decoded.
    fn info(&self) -> VideoInfo;

    /// Decodes the next frame into `frame`, resizing it to the stream geometry.
    ///
    /// Returns `false` at the end of the stream.
    fn read_frame(&mut self, frame: &mut Frame) -> Result<bool, StegoError>;
}

/// A lossless encoder consuming frames in stream order.
pub trait FrameSink {
    /// Encodes one frame.
    fn write_frame(&mut self, frame: &Frame) -> Result<(), StegoError>;

    /// Flushes everything written so far.
    fn finish(&mut self) -> Result<(), StegoError>;
}
