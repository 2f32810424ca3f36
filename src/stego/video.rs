//! LSB steganography for video.
//!
//! Bits go into channel 0 of every frame, frame by frame, each frame in
//! row-major order. Frames are decoded, patched and re-encoded one at a time,
//! so memory stays bounded by a single frame no matter how long the video is.
//! Frames past the end of the stream are copied through untouched.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::capacity::CapacityReport;
use crate::config::StegoConfig;
use crate::error::StegoError;
use crate::extract::{Extractor, Recovered};
use crate::naming::{sanitize_file_name, sibling_with_suffix, with_forced_extension};
use crate::outcome::{EmbedReport, ExtractReport};
use crate::payload::{BitStream, Header, SecretBlob, VideoHeader};
use crate::video::{Frame, FrameSink, FrameSource, Y4mReader, Y4mWriter};

use super::{embed_bits, feed_samples, persist_with, write_payload};

/// Extension of the lossless container video output is written in.
pub const VIDEO_OUTPUT_EXTENSION: &str = "y4m";

/// Smallest possible video header: name length byte plus the length field.
const MIN_VIDEO_HEADER_LEN: usize = 1 + 4;

/// Copies every frame from `source` to `sink`, hiding `stream` in channel 0.
///
/// Capacity is checked against the source's frame count before the first
/// frame is read. Returns the number of bits embedded.
pub fn embed_frames<S, K>(
    source: &mut S,
    sink: &mut K,
    stream: &BitStream,
) -> Result<u64, StegoError>
where
    S: FrameSource,
    K: FrameSink,
{
    let info = source.info();
    CapacityReport::video(info.frame_count, info.width, info.height, stream.header_len())
        .ensure_fits(stream.len())?;

    let mut bits = stream.bits();
    let mut written = 0u64;
    let mut frames = 0u64;
    let mut frame = Frame::default();

    while source.read_frame(&mut frame)? {
        if written < stream.len() {
            written += embed_bits(frame.channel0_mut().iter_mut(), &mut bits);
        }
        sink.write_frame(&frame)?;
        frames += 1;
    }
    sink.finish()?;

    if written != stream.len() {
        return Err(StegoError::IncompleteEmbedding {
            written,
            expected: stream.len(),
        });
    }

    debug!(frames, bits = written, "embedded secret in video");
    Ok(written)
}

/// Recovers the hidden file from `source`, decoding only as many frames as needed.
pub fn extract_frames<S: FrameSource>(source: &mut S) -> Result<Recovered<VideoHeader>, StegoError> {
    let mut extractor = Extractor::<VideoHeader>::new();
    let mut frame = Frame::default();
    let mut frames = 0u64;

    while source.read_frame(&mut frame)? {
        frames += 1;
        if let Some(recovered) = feed_samples(&mut extractor, frame.channel0())? {
            debug!(frames, bits = recovered.bits_read, "extracted secret from video");
            return Ok(recovered);
        }
    }

    Err(extractor.exhausted())
}

/// Capacity of the video at `carrier`.
///
/// The header size depends on the secret's name; without a secret the
/// smallest header (an empty name) is assumed.
pub fn video_capacity(
    carrier: &Path,
    secret: Option<&SecretBlob>,
) -> Result<CapacityReport, StegoError> {
    let header_bytes = match secret {
        Some(blob) => VideoHeader::for_blob(blob)?.to_bytes().len(),
        None => MIN_VIDEO_HEADER_LEN,
    };

    let info = Y4mReader::open(carrier)?.info();
    Ok(CapacityReport::video(
        info.frame_count,
        info.width,
        info.height,
        header_bytes,
    ))
}

/// Hides `secret` in the video `carrier`.
///
/// The output always uses the `.y4m` extension; without `output` it goes next
/// to the carrier as `<stem><output_suffix>.y4m`.
pub fn hide_in_video(
    carrier: &Path,
    secret: &Path,
    output: Option<&Path>,
    config: &StegoConfig,
) -> Result<EmbedReport, StegoError> {
    let blob = SecretBlob::from_path(secret)?;
    let stream = BitStream::frame::<VideoHeader>(&blob)?;

    let mut source = Y4mReader::open(carrier)?;
    let info = source.info();
    let capacity = CapacityReport::video(
        info.frame_count,
        info.width,
        info.height,
        stream.header_len(),
    );
    // Fail before the temporary output file exists
    capacity.ensure_fits(stream.len())?;

    let output = match output {
        Some(path) => with_forced_extension(path, VIDEO_OUTPUT_EXTENSION),
        None => sibling_with_suffix(
            carrier,
            &config.output_suffix,
            &format!(".{VIDEO_OUTPUT_EXTENSION}"),
        ),
    };

    let header = source.header().clone();
    let mut bits_embedded = 0;
    persist_with(&output, |file| {
        let mut sink = Y4mWriter::new(file, &header)?;
        bits_embedded = embed_frames(&mut source, &mut sink, &stream)?;
        Ok(())
    })?;

    info!(
        output = %output.display(),
        payload_bytes = blob.len(),
        frames = info.frame_count,
        bits = bits_embedded,
        "hid secret in video"
    );
    Ok(EmbedReport {
        output,
        payload_bytes: blob.len(),
        bits_embedded,
        capacity,
    })
}

/// Recovers the file hidden in the video `carrier`.
///
/// The file keeps its stored name, sanitized, inside `output_dir` (or the
/// configured recovery directory), which is created if missing.
pub fn reveal_from_video(
    carrier: &Path,
    output_dir: Option<&Path>,
    config: &StegoConfig,
) -> Result<ExtractReport, StegoError> {
    let mut source = Y4mReader::open(carrier)?;
    let recovered = extract_frames(&mut source)?;

    let stored = recovered.header.name();
    if stored.is_none() {
        warn!("stored file name is not valid UTF-8, using fallback");
    }

    let mut file_name = sanitize_file_name(stored.as_deref().unwrap_or_default(), "");
    let used_fallback = file_name.is_empty();
    if used_fallback {
        file_name = config.video_fallback_name.clone();
    }

    let dir = output_dir.unwrap_or(config.recovery_dir.as_path());
    fs::create_dir_all(dir).map_err(|e| StegoError::output_write(dir, e))?;

    let output = dir.join(&file_name);
    write_payload(&output, &recovered.payload)?;

    info!(
        output = %output.display(),
        size = recovered.payload.len(),
        "recovered file from video"
    );
    Ok(ExtractReport {
        output,
        size: recovered.payload.len(),
        kind: file_name,
        used_fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::{Colorspace, VideoInfo, Y4mHeader};
    use std::io::Cursor;
    use tempfile::tempdir;

    /// In-memory frame source for exercising the pipeline without a container.
    struct MemorySource {
        info: VideoInfo,
        frames: Vec<Frame>,
        next: usize,
    }

    impl MemorySource {
        fn new(count: usize, width: u32, height: u32) -> Self {
            let frames = (0..count)
                .map(|i| {
                    let luma = (0..width * height).map(|j| (i as u32 * 7 + j * 3) as u8).collect();
                    Frame::new(width, height, vec![luma])
                })
                .collect();
            Self {
                info: VideoInfo {
                    width,
                    height,
                    frame_rate: (25, 1),
                    frame_count: count as u64,
                },
                frames,
                next: 0,
            }
        }
    }

    impl FrameSource for MemorySource {
        fn info(&self) -> VideoInfo {
            self.info
        }

        fn read_frame(&mut self, frame: &mut Frame) -> Result<bool, StegoError> {
            let Some(next) = self.frames.get(self.next) else {
                return Ok(false);
            };
            *frame = next.clone();
            self.next += 1;
            Ok(true)
        }
    }

    #[derive(Default)]
    struct MemorySink {
        frames: Vec<Frame>,
        finished: bool,
    }

    impl FrameSink for MemorySink {
        fn write_frame(&mut self, frame: &Frame) -> Result<(), StegoError> {
            self.frames.push(frame.clone());
            Ok(())
        }

        fn finish(&mut self) -> Result<(), StegoError> {
            self.finished = true;
            Ok(())
        }
    }

    fn stream(name: &str, data: &[u8]) -> BitStream {
        BitStream::frame::<VideoHeader>(&SecretBlob::from_bytes(name, data.to_vec())).unwrap()
    }

    #[test]
    fn test_embed_spans_frames() {
        // 8x8 frames hold 64 bits each; this stream needs several
        let stream = stream("notes.txt", b"across several frames");
        let mut source = MemorySource::new(6, 8, 8);
        let mut sink = MemorySink::default();

        let written = embed_frames(&mut source, &mut sink, &stream).unwrap();

        assert_eq!(written, stream.len());
        assert_eq!(sink.frames.len(), 6);
        assert!(sink.finished);

        let mut replay = MemorySource::new(0, 8, 8);
        replay.info.frame_count = sink.frames.len() as u64;
        replay.frames = sink.frames;
        let recovered = extract_frames(&mut replay).unwrap();

        assert_eq!(recovered.payload, b"across several frames");
        assert_eq!(recovered.header.name().as_deref(), Some("notes.txt"));
    }

    #[test]
    fn test_untouched_frames_are_identical() {
        let stream = stream("a", b"x");
        let mut source = MemorySource::new(3, 8, 8);
        let original = source.frames.clone();
        let mut sink = MemorySink::default();

        embed_frames(&mut source, &mut sink, &stream).unwrap();

        // 1 + 1 + 4 + 1 bytes = 56 bits fit in the first frame
        assert_eq!(sink.frames[1], original[1]);
        assert_eq!(sink.frames[2], original[2]);
        assert_eq!(&sink.frames[0].channel0()[56..], &original[0].channel0()[56..]);
    }

    #[test]
    fn test_capacity_checked_before_reading() {
        let stream = stream("big.bin", &[0u8; 100]);
        let mut source = MemorySource::new(2, 4, 4);
        let mut sink = MemorySink::default();

        let result = embed_frames(&mut source, &mut sink, &stream);

        assert!(matches!(result, Err(StegoError::InsufficientCapacity { .. })));
        assert_eq!(source.next, 0);
        assert!(sink.frames.is_empty());
    }

    #[test]
    fn test_extract_from_clean_video_is_an_error() {
        // Four samples never complete the name length byte
        let mut source = MemorySource::new(1, 2, 2);
        let result = extract_frames(&mut source);
        assert!(matches!(result, Err(StegoError::HeaderCorrupt(_))));
    }

    #[test]
    fn test_extract_truncated_video() {
        let stream = stream("long.bin", &[0x5A; 40]);
        let mut source = MemorySource::new(8, 8, 8);
        let mut sink = MemorySink::default();
        embed_frames(&mut source, &mut sink, &stream).unwrap();

        // Keep only the first two frames: the header fits, the payload does not
        let mut cut = MemorySource::new(0, 8, 8);
        cut.frames = sink.frames.into_iter().take(2).collect();
        cut.info.frame_count = 2;

        let result = extract_frames(&mut cut);
        assert!(matches!(result, Err(StegoError::TruncatedData { .. })));
    }

    #[test]
    fn test_source_shorter_than_announced() {
        // Announces 10 frames but yields 1, so only 64 of 128 bits land
        let stream = stream("a", &[7u8; 10]);
        let mut source = MemorySource::new(1, 8, 8);
        source.info.frame_count = 10;
        let mut sink = MemorySink::default();

        let result = embed_frames(&mut source, &mut sink, &stream);

        assert!(matches!(
            result,
            Err(StegoError::IncompleteEmbedding {
                written: 64,
                expected: 128
            })
        ));
        assert_eq!(sink.frames.len(), 1);
    }

    #[test]
    fn test_incomplete_embedding_writes_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.y4m");
        let header = Y4mHeader::new(8, 8, (25, 1), Colorspace::Mono).unwrap();
        let stream = stream("a", &[7u8; 10]);
        let mut source = MemorySource::new(1, 8, 8);
        source.info.frame_count = 10;

        let result = persist_with(&output, |file| {
            let mut sink = Y4mWriter::new(file, &header)?;
            embed_frames(&mut source, &mut sink, &stream)?;
            Ok(())
        });

        assert!(matches!(result, Err(StegoError::IncompleteEmbedding { .. })));
        assert!(!output.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_oversized_stream_header_is_an_error() {
        let dir = tempdir().unwrap();
        let secret = dir.path().join("s.bin");
        fs::write(&secret, [1, 2, 3]).unwrap();
        let config = StegoConfig::default();

        for tag in ["mono", "420jpeg", "422", "444"] {
            let carrier = dir.path().join(format!("huge_{tag}.y4m"));
            fs::write(
                &carrier,
                format!("YUV4MPEG2 W4294967295 H4294967295 F25:1 C{tag}\n"),
            )
            .unwrap();

            let out_dir = dir.path().join("recovered");
            let revealed = reveal_from_video(&carrier, Some(out_dir.as_path()), &config);
            assert!(matches!(revealed, Err(StegoError::UnsupportedFormat(_))), "C{tag}");
            assert!(!out_dir.exists());

            let capacity = video_capacity(&carrier, None);
            assert!(matches!(capacity, Err(StegoError::UnsupportedFormat(_))), "C{tag}");

            let output = dir.path().join("out.y4m");
            let hidden = hide_in_video(&carrier, &secret, Some(output.as_path()), &config);
            assert!(matches!(hidden, Err(StegoError::UnsupportedFormat(_))), "C{tag}");
            assert!(!output.exists());
        }
    }

    fn write_y4m(path: &Path, frames: usize, width: u32, height: u32) {
        let header = Y4mHeader::new(width, height, (24, 1), Colorspace::C420).unwrap();
        let mut writer = Y4mWriter::new(Vec::new(), &header).unwrap();
        for i in 0..frames {
            let mut frame = header.new_frame();
            for (j, sample) in frame.channel0_mut().iter_mut().enumerate() {
                *sample = ((i * 31 + j * 5) % 256) as u8;
            }
            writer.write_frame(&frame).unwrap();
        }
        fs::write(path, writer.into_inner().unwrap()).unwrap();
    }

    #[test]
    fn test_hide_and_reveal_files() {
        let dir = tempdir().unwrap();
        let carrier = dir.path().join("clip.y4m");
        let secret = dir.path().join("plan.txt");
        write_y4m(&carrier, 4, 16, 16);
        fs::write(&secret, b"meet at noon").unwrap();

        let config = StegoConfig::default();
        let output = dir.path().join("out.avi");
        let embedded = hide_in_video(&carrier, &secret, Some(output.as_path()), &config).unwrap();
        assert_eq!(embedded.output, dir.path().join("out.y4m"));

        let out_dir = dir.path().join("recovered");
        let revealed = reveal_from_video(&embedded.output, Some(out_dir.as_path()), &config).unwrap();

        assert_eq!(revealed.output, out_dir.join("plan.txt"));
        assert_eq!(fs::read(&revealed.output).unwrap(), b"meet at noon");
        assert!(!revealed.used_fallback);
    }

    #[test]
    fn test_hide_preserves_stream_layout() {
        let dir = tempdir().unwrap();
        let carrier = dir.path().join("clip.y4m");
        let secret = dir.path().join("s.bin");
        write_y4m(&carrier, 3, 8, 6);
        fs::write(&secret, [1, 2, 3]).unwrap();

        let embedded = hide_in_video(&carrier, &secret, None, &StegoConfig::default()).unwrap();
        assert_eq!(embedded.output, dir.path().join("clip_stego.y4m"));

        let original = fs::read(&carrier).unwrap();
        let stego = fs::read(&embedded.output).unwrap();
        assert_eq!(original.len(), stego.len());

        let before = Y4mReader::new(Cursor::new(original)).unwrap();
        let after = Y4mReader::new(Cursor::new(stego)).unwrap();
        assert_eq!(before.info(), after.info());
        assert_eq!(before.header(), after.header());
    }

    #[test]
    fn test_hide_too_large_writes_nothing() {
        let dir = tempdir().unwrap();
        let carrier = dir.path().join("tiny.y4m");
        let secret = dir.path().join("big.bin");
        write_y4m(&carrier, 1, 4, 4);
        fs::write(&secret, vec![0u8; 64]).unwrap();

        let output = dir.path().join("out.y4m");
        let result = hide_in_video(&carrier, &secret, Some(output.as_path()), &StegoConfig::default());

        assert!(matches!(result, Err(StegoError::InsufficientCapacity { .. })));
        assert!(!output.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_video_capacity() {
        let dir = tempdir().unwrap();
        let carrier = dir.path().join("clip.y4m");
        write_y4m(&carrier, 10, 8, 8);

        let report = video_capacity(&carrier, None).unwrap();
        assert_eq!(report.slots, 640);
        assert_eq!(report.max_payload(), 80 - 5);

        let blob = SecretBlob::from_bytes("abc", vec![]);
        let report = video_capacity(&carrier, Some(&blob)).unwrap();
        assert_eq!(report.max_payload(), 80 - 8);
    }
}
