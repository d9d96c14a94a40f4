//! Single-frame extraction.
//!
//! A [`FrameExtractor`] turns `(video, timestamp)` into one encoded still.
//! There are two strategies:
//!
//! - **seek**: jump to the nearest keyframe before the timestamp, then decode
//!   forward to the first frame at or after it.
//! - **trim**: decode from the start of the stream through an
//!   `fps,trim,setpts` filter chain and take the first frame inside a short
//!   window. Slower, but it does not depend on the container's seek index,
//!   which is what usually fails near the start of a stream.
//!
//! [`extract_with_fallback`] runs seek first and, if that yields nothing,
//! retries with trim slightly earlier.

use std::path::Path;

use ffmpeg_next::{
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    filter::Graph as FilterGraph,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use ffmpeg_sys_next::AVPixelFormat;
use image::DynamicImage;

use crate::conversion::{
    encode_jpeg, pts_to_seconds, rgb_frame_to_image, seconds_to_seek_timestamp,
    seconds_to_stream_timestamp,
};
use crate::error::FramecutError;
use crate::naming::format_clock;

/// Default JPEG quality for extracted frames.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;
/// Frame rate the trim strategy resamples to.
pub const TRIM_FPS: u32 = 30;
/// Width of the trim window in seconds.
pub const TRIM_WINDOW: f64 = 0.1;

/// Produces one encoded still image from a video.
///
/// Both methods return the encoded image bytes. An `Ok` with an empty buffer
/// counts as a failed extraction, the same as an `Err`.
pub trait FrameExtractor {
    /// Seek-based extraction at `timestamp` seconds.
    fn seek_frame(&mut self, video: &Path, timestamp: f64) -> Result<Vec<u8>, FramecutError>;

    /// Trim-filter extraction at `timestamp` seconds.
    fn trim_frame(&mut self, video: &Path, timestamp: f64) -> Result<Vec<u8>, FramecutError>;
}

/// Extract a frame at `timestamp`, falling back to a trim extraction at
/// `timestamp - fallback_offset` (floored at zero) when seeking fails.
///
/// The fallback only runs for positive timestamps. Failures are logged and
/// reported as `None`; they never propagate.
pub fn extract_with_fallback<E: FrameExtractor + ?Sized>(
    extractor: &mut E,
    video: &Path,
    timestamp: f64,
    fallback_offset: f64,
) -> Option<Vec<u8>> {
    let timestamp = timestamp.max(0.0);

    match extractor.seek_frame(video, timestamp) {
        Ok(bytes) if !bytes.is_empty() => return Some(bytes),
        Ok(_) => log::debug!("Seek at {} produced no data", format_clock(timestamp)),
        Err(error) => log::debug!("Seek at {} failed: {error}", format_clock(timestamp)),
    }

    if timestamp <= 0.0 {
        log::warn!("Frame extraction failed @{timestamp:.3}s: {}", video.display());
        return None;
    }

    let retry_at = (timestamp - fallback_offset).max(0.0);
    match extractor.trim_frame(video, retry_at) {
        Ok(bytes) if !bytes.is_empty() => {
            log::debug!(
                "Recovered frame for {} with trim at {}",
                format_clock(timestamp),
                format_clock(retry_at)
            );
            Some(bytes)
        }
        Ok(_) => {
            log::warn!("Frame extraction failed @{timestamp:.3}s: empty output");
            None
        }
        Err(error) => {
            log::warn!("Frame extraction failed @{timestamp:.3}s: {error}");
            None
        }
    }
}

/// FFmpeg-backed extractor that encodes frames as JPEG.
#[derive(Debug, Clone, Copy)]
pub struct FfmpegFrameExtractor {
    jpeg_quality: u8,
}

impl Default for FfmpegFrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegFrameExtractor {
    /// Create an extractor with [`DEFAULT_JPEG_QUALITY`].
    pub fn new() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Set the JPEG quality (clamped to 1-100).
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Decode the first frame at or after `timestamp` by seeking.
    ///
    /// If the stream ends before reaching `timestamp`, the last decoded frame
    /// is returned instead.
    ///
    /// # Errors
    ///
    /// [`FramecutError::FileOpen`] or [`FramecutError::NoVideoStream`] for
    /// unusable input, [`FramecutError::VideoDecodeError`] if no frame was
    /// decoded after the seek.
    pub fn decode_at(&self, video: &Path, timestamp: f64) -> Result<DynamicImage, FramecutError> {
        let mut input = crate::ffmpeg::open_input(video)?;
        let (stream_index, time_base, mut decoder) = video_decoder(&input)?;

        let seek_target = seconds_to_seek_timestamp(timestamp);
        input.seek(seek_target, ..seek_target)?;
        let target_pts = seconds_to_stream_timestamp(timestamp, time_base);
        log::debug!(
            "Seeking {} to {} (pts {target_pts})",
            video.display(),
            format_clock(timestamp)
        );

        let mut decoded = VideoFrame::empty();
        let mut latest = VideoFrame::empty();
        let mut have_latest = false;

        for (stream, packet) in input.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                if decoded.pts().unwrap_or(0) >= target_pts {
                    return frame_to_image(&decoded);
                }
                std::mem::swap(&mut decoded, &mut latest);
                have_latest = true;
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            if decoded.pts().unwrap_or(0) >= target_pts {
                return frame_to_image(&decoded);
            }
            std::mem::swap(&mut decoded, &mut latest);
            have_latest = true;
        }

        if have_latest {
            log::debug!("Stream ended before {}, using last frame", format_clock(timestamp));
            return frame_to_image(&latest);
        }

        Err(FramecutError::VideoDecodeError(format!(
            "No frame decoded after seeking to {timestamp:.3}s"
        )))
    }

    /// Decode from the start through `fps,trim,setpts` and return the first
    /// frame inside `[timestamp, timestamp + TRIM_WINDOW)`.
    ///
    /// # Errors
    ///
    /// As [`decode_at`](Self::decode_at), plus
    /// [`FramecutError::FilterGraphError`] if the filter chain cannot be
    /// built or fed.
    pub fn decode_trimmed(
        &self,
        video: &Path,
        timestamp: f64,
    ) -> Result<DynamicImage, FramecutError> {
        let mut input = crate::ffmpeg::open_input(video)?;
        let (stream_index, time_base, mut decoder) = video_decoder(&input)?;

        let start = timestamp.max(0.0);
        let end = start + TRIM_WINDOW;
        let spec = format!(
            "fps={TRIM_FPS},trim=start={start:.3}:end={end:.3},setpts=PTS-STARTPTS,format=pix_fmts=rgb24"
        );
        log::debug!("Trim extraction on {}: {spec}", video.display());

        // Past this point the window can no longer produce output.
        let give_up_after = end + 1.0;
        let mut trim: Option<TrimFilter> = None;
        let mut decoded = VideoFrame::empty();
        let mut filtered = VideoFrame::empty();

        'decode: for (stream, packet) in input.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                if trim.is_none() {
                    trim = Some(TrimFilter::new(&decoded, time_base, &spec)?);
                }
                if let Some(filter) = trim.as_mut()
                    && filter.push(&decoded, &mut filtered)?
                {
                    return rgb_frame_to_image(&filtered);
                }
                if pts_to_seconds(decoded.pts().unwrap_or(0), time_base) > give_up_after {
                    break 'decode;
                }
            }
        }

        if let Some(filter) = trim.as_mut() {
            let _ = decoder.send_eof();
            while decoder.receive_frame(&mut decoded).is_ok() {
                if filter.push(&decoded, &mut filtered)? {
                    return rgb_frame_to_image(&filtered);
                }
            }
            if filter.flush(&mut filtered)? {
                return rgb_frame_to_image(&filtered);
            }
        }

        Err(FramecutError::VideoDecodeError(format!(
            "No frame inside trim window [{start:.3}, {end:.3})"
        )))
    }
}

impl FrameExtractor for FfmpegFrameExtractor {
    fn seek_frame(&mut self, video: &Path, timestamp: f64) -> Result<Vec<u8>, FramecutError> {
        let image = self.decode_at(video, timestamp)?;
        encode_jpeg(&image, self.jpeg_quality)
    }

    fn trim_frame(&mut self, video: &Path, timestamp: f64) -> Result<Vec<u8>, FramecutError> {
        let image = self.decode_trimmed(video, timestamp)?;
        encode_jpeg(&image, self.jpeg_quality)
    }
}

fn video_decoder(input: &Input) -> Result<(usize, Rational, VideoDecoder), FramecutError> {
    let stream = input
        .streams()
        .best(Type::Video)
        .ok_or(FramecutError::NoVideoStream)?;
    let decoder = CodecContext::from_parameters(stream.parameters())?
        .decoder()
        .video()?;
    Ok((stream.index(), stream.time_base(), decoder))
}

/// Scale any decoded frame to RGB24 and wrap it as an image.
fn frame_to_image(frame: &VideoFrame) -> Result<DynamicImage, FramecutError> {
    let mut scaler = ScalingContext::get(
        frame.format(),
        frame.width(),
        frame.height(),
        Pixel::RGB24,
        frame.width(),
        frame.height(),
        ScalingFlags::BILINEAR,
    )?;
    let mut rgb_frame = VideoFrame::empty();
    scaler.run(frame, &mut rgb_frame)?;
    rgb_frame_to_image(&rgb_frame)
}

/// `buffer -> spec -> buffersink`, configured from the first decoded frame.
struct TrimFilter {
    graph: FilterGraph,
}

impl TrimFilter {
    fn new(first: &VideoFrame, time_base: Rational, spec: &str) -> Result<Self, FramecutError> {
        let buffer_args = format!(
            "video_size={}x{}:pix_fmt={}:time_base={}/{}:pixel_aspect=1/1",
            first.width(),
            first.height(),
            AVPixelFormat::from(first.format()) as i32,
            time_base.numerator(),
            time_base.denominator(),
        );

        let mut graph = FilterGraph::new();
        let buffer = ffmpeg_next::filter::find("buffer").ok_or_else(|| {
            FramecutError::FilterGraphError("FFmpeg 'buffer' filter not found".to_string())
        })?;
        let buffersink = ffmpeg_next::filter::find("buffersink").ok_or_else(|| {
            FramecutError::FilterGraphError("FFmpeg 'buffersink' filter not found".to_string())
        })?;

        graph
            .add(&buffer, "in", &buffer_args)
            .map_err(|e| FramecutError::FilterGraphError(format!("Failed to add buffer: {e}")))?;
        graph
            .add(&buffersink, "out", "")
            .map_err(|e| FramecutError::FilterGraphError(format!("Failed to add sink: {e}")))?;
        graph
            .output("in", 0)
            .and_then(|parser| parser.input("out", 0))
            .and_then(|parser| parser.parse(spec))
            .map_err(|e| FramecutError::FilterGraphError(format!("Failed to parse {spec}: {e}")))?;
        graph
            .validate()
            .map_err(|e| FramecutError::FilterGraphError(format!("Invalid filter graph: {e}")))?;

        Ok(Self { graph })
    }

    /// Feed one frame. Returns `true` once `output` holds a filtered frame.
    fn push(&mut self, frame: &VideoFrame, output: &mut VideoFrame) -> Result<bool, FramecutError> {
        self.graph
            .get("in")
            .ok_or_else(|| FramecutError::FilterGraphError("Filter 'in' not found".to_string()))?
            .source()
            .add(frame)
            .map_err(|e| FramecutError::FilterGraphError(format!("Failed to feed filter: {e}")))?;
        Ok(self.pull(output))
    }

    /// Signal end of input and drain what is left.
    fn flush(&mut self, output: &mut VideoFrame) -> Result<bool, FramecutError> {
        self.graph
            .get("in")
            .ok_or_else(|| FramecutError::FilterGraphError("Filter 'in' not found".to_string()))?
            .source()
            .flush()
            .map_err(|e| FramecutError::FilterGraphError(format!("Failed to flush filter: {e}")))?;
        Ok(self.pull(output))
    }

    fn pull(&mut self, output: &mut VideoFrame) -> bool {
        self.graph
            .get("out")
            .is_some_and(|mut sink| sink.sink().frame(output).is_ok())
    }
}
