//! Uncompressed YUV4MPEG2 (`.y4m`) streams.
//!
//! ```text
//! YUV4MPEG2 W<width> H<height> F<num>:<den> [I<i>] [A<a>:<b>] [C<cs>] [X<..>]\n
//! FRAME [params]\n <Y plane> [<U plane> <V plane>]
//! FRAME [params]\n ...
//! ```
//!
//! Only 8-bit colourspaces are supported. The writer re-emits the source
//! stream header and every frame's parameters byte for byte, so a patched
//! stream keeps the original resolution, frame rate and frame count.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, warn};

use crate::error::StegoError;
use crate::video::{Frame, FrameSink, FrameSource, VideoInfo};

/// Stream signature.
pub const STREAM_MAGIC: &[u8] = b"YUV4MPEG2";

/// Frame header signature.
pub const FRAME_MAGIC: &[u8] = b"FRAME";

/// Longest stream or frame header line accepted.
const MAX_LINE_LEN: usize = 4096;

/// Chroma layout of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colorspace {
    /// Luma only.
    Mono,
    /// Chroma halved in both directions.
    C420,
    /// Chroma halved horizontally.
    C422,
    /// Full-resolution chroma.
    C444,
}

impl Colorspace {
    /// Parses the value of a `C` tag.
    pub fn parse(tag: &str) -> Result<Self, StegoError> {
        match tag {
            "mono" => Ok(Self::Mono),
            "420" | "420jpeg" | "420paldv" | "420mpeg2" => Ok(Self::C420),
            "422" => Ok(Self::C422),
            "444" => Ok(Self::C444),
            other => Err(StegoError::UnsupportedFormat(format!(
                "Y4M colourspace '{other}' (only 8-bit mono/420/422/444)"
            ))),
        }
    }

    /// Tag written for streams created from scratch.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Mono => "mono",
            Self::C420 => "420jpeg",
            Self::C422 => "422",
            Self::C444 => "444",
        }
    }

    /// Byte size of each plane, luma first.
    ///
    /// Returns `None` if a plane or the whole frame does not fit in memory.
    pub fn plane_sizes(self, width: u32, height: u32) -> Option<Vec<usize>> {
        let (w, h) = (width as usize, height as usize);
        let luma = w.checked_mul(h)?;
        let sizes = match self {
            Self::Mono => vec![luma],
            Self::C420 => {
                let chroma = w.div_ceil(2).checked_mul(h.div_ceil(2))?;
                vec![luma, chroma, chroma]
            }
            Self::C422 => {
                let chroma = w.div_ceil(2).checked_mul(h)?;
                vec![luma, chroma, chroma]
            }
            Self::C444 => vec![luma, luma, luma],
        };

        let total = sizes
            .iter()
            .try_fold(0usize, |total, &size| total.checked_add(size))?;
        if total > isize::MAX as usize {
            return None;
        }
        Some(sizes)
    }
}

/// Plane sizes and total frame length, rejecting geometry that overflows.
fn frame_geometry(
    colorspace: Colorspace,
    width: u32,
    height: u32,
) -> Result<(Vec<usize>, usize), StegoError> {
    let planes = colorspace.plane_sizes(width, height).ok_or_else(|| {
        StegoError::UnsupportedFormat(format!("Y4M frame size {width}x{height} is too large"))
    })?;
    let frame_len = planes.iter().sum();
    Ok((planes, frame_len))
}

/// A parsed stream header, kept verbatim for re-emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Y4mHeader {
    width: u32,
    height: u32,
    frame_rate: (u32, u32),
    colorspace: Colorspace,
    planes: Vec<usize>,
    frame_len: usize,
    raw: Vec<u8>,
}

impl Y4mHeader {
    /// Builds a progressive, square-pixel stream header.
    pub fn new(
        width: u32,
        height: u32,
        frame_rate: (u32, u32),
        colorspace: Colorspace,
    ) -> Result<Self, StegoError> {
        let (planes, frame_len) = frame_geometry(colorspace, width, height)?;
        let raw = format!(
            "YUV4MPEG2 W{width} H{height} F{}:{} Ip A1:1 C{}",
            frame_rate.0,
            frame_rate.1,
            colorspace.tag()
        );
        Ok(Self {
            width,
            height,
            frame_rate,
            colorspace,
            planes,
            frame_len,
            raw: raw.into_bytes(),
        })
    }

    /// Parses a header line without its trailing newline.
    pub fn parse(line: &[u8]) -> Result<Self, StegoError> {
        if !line.is_ascii() {
            return Err(StegoError::UnsupportedFormat(
                "Y4M header is not ASCII".to_string(),
            ));
        }
        let text = String::from_utf8_lossy(line);

        let mut tokens = text.split(' ').filter(|t| !t.is_empty());
        if tokens.next().map(str::as_bytes) != Some(STREAM_MAGIC) {
            return Err(StegoError::UnsupportedFormat(
                "missing YUV4MPEG2 signature".to_string(),
            ));
        }

        let mut width = None;
        let mut height = None;
        let mut frame_rate = None;
        let mut colorspace = Colorspace::C420;

        for token in tokens {
            let (tag, value) = token.split_at(1);
            match tag {
                "W" => width = Some(parse_number(value, "width")?),
                "H" => height = Some(parse_number(value, "height")?),
                "F" => frame_rate = Some(parse_ratio(value)?),
                "C" => colorspace = Colorspace::parse(value)?,
                // Interlacing, aspect ratio and extensions pass through in `raw`
                _ => {}
            }
        }

        let (Some(width), Some(height)) = (width, height) else {
            return Err(StegoError::UnsupportedFormat(
                "Y4M header without W/H".to_string(),
            ));
        };
        if width == 0 || height == 0 {
            return Err(StegoError::UnsupportedFormat(format!(
                "Y4M frame size {width}x{height}"
            )));
        }

        let (planes, frame_len) = frame_geometry(colorspace, width, height)?;

        Ok(Self {
            width,
            height,
            frame_rate: frame_rate.unwrap_or((25, 1)),
            colorspace,
            planes,
            frame_len,
            raw: line.to_vec(),
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frame rate as numerator and denominator.
    pub fn frame_rate(&self) -> (u32, u32) {
        self.frame_rate
    }

    /// Chroma layout.
    pub fn colorspace(&self) -> Colorspace {
        self.colorspace
    }

    /// Byte size of each plane, luma first.
    pub fn plane_sizes(&self) -> &[usize] {
        &self.planes
    }

    /// Bytes of plane data per frame.
    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Allocates a zeroed frame for this stream.
    pub fn new_frame(&self) -> Frame {
        let planes = self.planes.iter().map(|&size| vec![0u8; size]).collect();
        Frame::new(self.width, self.height, planes)
    }

    /// The header line including its newline.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.raw.clone();
        bytes.push(b'\n');
        bytes
    }
}

fn parse_number(value: &str, what: &str) -> Result<u32, StegoError> {
    value
        .parse()
        .map_err(|_| StegoError::UnsupportedFormat(format!("Y4M {what} '{value}'")))
}

fn parse_ratio(value: &str) -> Result<(u32, u32), StegoError> {
    let (num, den) = value
        .split_once(':')
        .ok_or_else(|| StegoError::UnsupportedFormat(format!("Y4M frame rate '{value}'")))?;
    Ok((
        parse_number(num, "frame rate")?,
        parse_number(den, "frame rate")?,
    ))
}

/// Reads one `\n`-terminated line.
///
/// Returns `None` at the end of the stream, including a final line cut off
/// before its newline.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<Vec<u8>>, StegoError> {
    let mut line = Vec::new();
    let read = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', &mut line)?;

    if line.last() != Some(&b'\n') {
        if read == MAX_LINE_LEN {
            return Err(StegoError::UnsupportedFormat(
                "Y4M header line too long".to_string(),
            ));
        }
        return Ok(None);
    }

    line.pop();
    Ok(Some(line))
}

/// Streaming frame reader.
pub struct Y4mReader<R> {
    reader: R,
    header: Y4mHeader,
    frame_count: u64,
}

impl Y4mReader<BufReader<File>> {
    /// Opens a `.y4m` file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StegoError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| StegoError::source_read(path, e))?;
        Self::new(BufReader::new(file)).map_err(|e| match e {
            StegoError::IoError(io) => StegoError::source_read(path, io),
            other => other,
        })
    }
}

impl<R: BufRead + Seek> Y4mReader<R> {
    /// Parses the stream header and counts frames by skipping over plane data.
    pub fn new(mut reader: R) -> Result<Self, StegoError> {
        let line = read_line(&mut reader)?.ok_or_else(|| {
            StegoError::UnsupportedFormat("empty or unterminated Y4M stream".to_string())
        })?;
        let header = Y4mHeader::parse(&line)?;

        let data_start = reader.stream_position()?;
        let end = reader.seek(SeekFrom::End(0))?;
        let available = end.saturating_sub(data_start);
        if header.frame_len() as u64 > available {
            return Err(StegoError::UnsupportedFormat(format!(
                "Y4M frames of {} bytes but only {available} bytes of frame data",
                header.frame_len()
            )));
        }

        reader.seek(SeekFrom::Start(data_start))?;
        let frame_count = count_frames(&mut reader, end, header.frame_len() as u64)?;
        reader.seek(SeekFrom::Start(data_start))?;

        debug!(
            width = header.width,
            height = header.height,
            frames = frame_count,
            colorspace = ?header.colorspace,
            "opened Y4M stream"
        );
        Ok(Self {
            reader,
            header,
            frame_count,
        })
    }

    /// The stream header.
    pub fn header(&self) -> &Y4mHeader {
        &self.header
    }
}

/// Counts complete frames from the current position without reading pixels.
fn count_frames<R: BufRead + Seek>(
    reader: &mut R,
    end: u64,
    frame_len: u64,
) -> Result<u64, StegoError> {
    let mut count = 0u64;
    while let Some(line) = read_line(reader)? {
        if !line.starts_with(FRAME_MAGIC) {
            return Err(StegoError::UnsupportedFormat(format!(
                "expected FRAME header after frame {count}"
            )));
        }

        let data_start = reader.stream_position()?;
        if data_start + frame_len > end {
            warn!(frame = count, "ignoring incomplete trailing frame");
            break;
        }

        reader.seek(SeekFrom::Start(data_start + frame_len))?;
        count += 1;
    }

    Ok(count)
}

impl<R: BufRead + Seek> FrameSource for Y4mReader<R> {
    fn info(&self) -> VideoInfo {
        VideoInfo {
            width: self.header.width,
            height: self.header.height,
            frame_rate: self.header.frame_rate,
            frame_count: self.frame_count,
        }
    }

    fn read_frame(&mut self, frame: &mut Frame) -> Result<bool, StegoError> {
        let Some(line) = read_line(&mut self.reader)? else {
            return Ok(false);
        };
        if !line.starts_with(FRAME_MAGIC) {
            return Err(StegoError::UnsupportedFormat(
                "expected FRAME header".to_string(),
            ));
        }
        frame.set_params(&line[FRAME_MAGIC.len()..]);
        frame.reshape(self.header.width, self.header.height, &self.header.planes);

        for plane in frame.planes_mut() {
            match self.reader.read_exact(plane) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    warn!("stream ends inside a frame");
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(true)
    }
}

/// Streaming frame writer.
pub struct Y4mWriter<W: Write> {
    writer: BufWriter<W>,
    frame_len: usize,
}

impl<W: Write> Y4mWriter<W> {
    /// Writes `header` and returns a writer ready for frames.
    pub fn new(writer: W, header: &Y4mHeader) -> Result<Self, StegoError> {
        let mut writer = BufWriter::new(writer);
        writer.write_all(&header.to_bytes())?;
        Ok(Self {
            writer,
            frame_len: header.frame_len(),
        })
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, StegoError> {
        self.writer
            .into_inner()
            .map_err(|e| StegoError::IoError(e.into_error()))
    }
}

impl<W: Write> FrameSink for Y4mWriter<W> {
    fn write_frame(&mut self, frame: &Frame) -> Result<(), StegoError> {
        let len: usize = frame.planes().iter().map(Vec::len).sum();
        if len != self.frame_len {
            return Err(StegoError::UnsupportedFormat(format!(
                "frame of {len} bytes in a stream of {} byte frames",
                self.frame_len
            )));
        }

        self.writer.write_all(FRAME_MAGIC)?;
        self.writer.write_all(frame.params())?;
        self.writer.write_all(b"\n")?;
        for plane in frame.planes() {
            self.writer.write_all(plane)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), StegoError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_stream(frames: usize) -> Vec<u8> {
        let header = Y4mHeader::new(4, 2, (30, 1), Colorspace::C420).unwrap();
        let mut writer = Y4mWriter::new(Vec::new(), &header).unwrap();
        for i in 0..frames {
            let mut frame = header.new_frame();
            for (j, sample) in frame.channel0_mut().iter_mut().enumerate() {
                *sample = (i * 10 + j) as u8;
            }
            writer.write_frame(&frame).unwrap();
        }
        writer.into_inner().unwrap()
    }

    #[test]
    fn test_plane_sizes() {
        assert_eq!(Colorspace::C420.plane_sizes(5, 3), Some(vec![15, 6, 6]));
        assert_eq!(Colorspace::C422.plane_sizes(5, 3), Some(vec![15, 9, 9]));
        assert_eq!(Colorspace::C444.plane_sizes(5, 3), Some(vec![15, 15, 15]));
        assert_eq!(Colorspace::Mono.plane_sizes(5, 3), Some(vec![15]));
    }

    const ALL_COLORSPACES: [(&str, Colorspace); 4] = [
        ("mono", Colorspace::Mono),
        ("420jpeg", Colorspace::C420),
        ("422", Colorspace::C422),
        ("444", Colorspace::C444),
    ];

    #[test]
    fn test_oversized_geometry_rejected() {
        for (tag, colorspace) in ALL_COLORSPACES {
            assert_eq!(colorspace.plane_sizes(u32::MAX, u32::MAX), None, "C{tag}");

            let line = format!("YUV4MPEG2 W4294967295 H4294967295 F25:1 C{tag}");
            let result = Y4mHeader::parse(line.as_bytes());
            assert!(
                matches!(result, Err(StegoError::UnsupportedFormat(_))),
                "C{tag}: {result:?}"
            );

            let result = Y4mHeader::new(u32::MAX, u32::MAX, (25, 1), colorspace);
            assert!(matches!(result, Err(StegoError::UnsupportedFormat(_))), "C{tag}");
        }
    }

    #[test]
    fn test_oversized_stream_rejected_without_allocating() {
        for (tag, _) in ALL_COLORSPACES {
            let bytes = format!("YUV4MPEG2 W4294967295 H4294967295 F25:1 C{tag}\n");
            let result = Y4mReader::new(Cursor::new(bytes.into_bytes()));
            assert!(
                matches!(result, Err(StegoError::UnsupportedFormat(_))),
                "C{tag}"
            );
        }
    }

    #[test]
    fn test_frame_larger_than_stream_rejected() {
        for (tag, _) in ALL_COLORSPACES {
            // 4 GiB of luma per frame, backed by a few bytes.
            let mut bytes = format!("YUV4MPEG2 W65536 H65536 F25:1 C{tag}\n").into_bytes();
            bytes.extend_from_slice(b"FRAME\n");
            bytes.extend_from_slice(&[0u8; 16]);

            let result = Y4mReader::new(Cursor::new(bytes));
            assert!(
                matches!(result, Err(StegoError::UnsupportedFormat(_))),
                "C{tag}"
            );
        }
    }

    #[test]
    fn test_frame_sized_on_read() {
        let mut reader = Y4mReader::new(Cursor::new(sample_stream(1))).unwrap();
        let mut frame = Frame::default();
        assert!(frame.planes().is_empty());

        assert!(reader.read_frame(&mut frame).unwrap());
        let sizes: Vec<usize> = frame.planes().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![8, 2, 2]);
        assert_eq!((frame.width(), frame.height()), (4, 2));
    }

    #[test]
    fn test_parse_header() {
        let header = Y4mHeader::parse(b"YUV4MPEG2 W640 H480 F30000:1001 It A1:1 C444 XYSCSS=444").unwrap();
        assert_eq!(header.width(), 640);
        assert_eq!(header.height(), 480);
        assert_eq!(header.frame_rate(), (30000, 1001));
        assert_eq!(header.colorspace(), Colorspace::C444);
        assert_eq!(header.frame_len(), 640 * 480 * 3);
    }

    #[test]
    fn test_parse_header_default_colorspace() {
        let header = Y4mHeader::parse(b"YUV4MPEG2 W2 H2 F25:1").unwrap();
        assert_eq!(header.colorspace(), Colorspace::C420);
    }

    #[test]
    fn test_reject_high_bit_depth() {
        let result = Y4mHeader::parse(b"YUV4MPEG2 W2 H2 F25:1 C420p10");
        assert!(matches!(result, Err(StegoError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_reject_missing_signature() {
        let result = Y4mHeader::parse(b"RIFF W2 H2");
        assert!(matches!(result, Err(StegoError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_reject_missing_size() {
        let result = Y4mHeader::parse(b"YUV4MPEG2 W2 F25:1");
        assert!(matches!(result, Err(StegoError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_counts_frames() {
        let reader = Y4mReader::new(Cursor::new(sample_stream(7))).unwrap();
        let info = reader.info();
        assert_eq!(info.frame_count, 7);
        assert_eq!((info.width, info.height), (4, 2));
        assert_eq!(info.frame_rate, (30, 1));
    }

    #[test]
    fn test_ignores_incomplete_trailing_frame() {
        let mut bytes = sample_stream(3);
        bytes.truncate(bytes.len() - 5);

        let mut reader = Y4mReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.info().frame_count, 2);

        let mut frame = Frame::default();
        let mut read = 0;
        while reader.read_frame(&mut frame).unwrap() {
            read += 1;
        }
        assert_eq!(read, 2);
    }

    #[test]
    fn test_read_write_identity() {
        let original = sample_stream(3);
        let mut reader = Y4mReader::new(Cursor::new(original.clone())).unwrap();
        let mut writer = Y4mWriter::new(Vec::new(), reader.header()).unwrap();

        let mut frame = Frame::default();
        while reader.read_frame(&mut frame).unwrap() {
            writer.write_frame(&frame).unwrap();
        }
        writer.finish().unwrap();

        assert_eq!(writer.into_inner().unwrap(), original);
    }

    #[test]
    fn test_frame_params_preserved() {
        let header = Y4mHeader::parse(b"YUV4MPEG2 W2 H2 F25:1 Cmono").unwrap();
        let mut bytes = header.to_bytes();
        bytes.extend_from_slice(b"FRAME Ib\n");
        bytes.extend_from_slice(&[1, 2, 3, 4]);

        let mut reader = Y4mReader::new(Cursor::new(bytes.clone())).unwrap();
        let mut frame = Frame::default();
        assert!(reader.read_frame(&mut frame).unwrap());
        assert_eq!(frame.params(), b" Ib");
        assert_eq!(frame.channel0(), &[1, 2, 3, 4]);

        let mut writer = Y4mWriter::new(Vec::new(), reader.header()).unwrap();
        writer.write_frame(&frame).unwrap();
        assert_eq!(writer.into_inner().unwrap(), bytes);
    }

    #[test]
    fn test_empty_stream_rejected() {
        let result = Y4mReader::new(Cursor::new(Vec::new()));
        assert!(matches!(result, Err(StegoError::UnsupportedFormat(_))));
    }
}
