//! Timestamp and pixel conversions shared by the FFmpeg backends.

use std::io::Cursor;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};
use image::{DynamicImage, RgbImage, codecs::jpeg::JpegEncoder};

use crate::error::FramecutError;

/// Copy an RGB24 frame into a tightly packed buffer.
///
/// FFmpeg rows are often padded past `width * 3` bytes; the padding is
/// dropped so the result can go straight into [`RgbImage::from_raw`].
pub fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * (height as usize)].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
    for row in 0..(height as usize) {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    buffer
}

/// Wrap an RGB24 frame as an [`image::DynamicImage`].
pub fn rgb_frame_to_image(rgb_frame: &VideoFrame) -> Result<DynamicImage, FramecutError> {
    let (width, height) = (rgb_frame.width(), rgb_frame.height());
    let buffer = frame_to_rgb_buffer(rgb_frame, width, height);
    let image = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        FramecutError::VideoDecodeError(format!(
            "Decoded frame does not fill a {width}x{height} RGB image"
        ))
    })?;
    Ok(DynamicImage::ImageRgb8(image))
}

/// Encode an image as JPEG with the given quality (1-100).
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, FramecutError> {
    let mut bytes = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    image.to_rgb8().write_with_encoder(encoder)?;
    Ok(bytes.into_inner())
}

/// Seconds to a timestamp in `time_base` units.
pub fn seconds_to_stream_timestamp(seconds: f64, time_base: Rational) -> i64 {
    let numerator = f64::from(time_base.numerator());
    let denominator = f64::from(time_base.denominator());
    if numerator == 0.0 {
        return 0;
    }
    (seconds * denominator / numerator).round() as i64
}

/// Seconds to a container-level seek target in `AV_TIME_BASE` (microseconds).
pub fn seconds_to_seek_timestamp(seconds: f64) -> i64 {
    (seconds.max(0.0) * 1_000_000.0) as i64
}

/// A PTS in `time_base` units to seconds.
pub fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * f64::from(time_base.numerator()) / f64::from(time_base.denominator())
}
