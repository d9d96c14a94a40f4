//! Video duration probing.
//!
//! The orchestrator only needs one number from the container: how long the
//! video is, so candidate timestamps can be clamped inside it. A probe that
//! cannot tell returns `0.0`, which turns clamping off.

use std::path::Path;

use ffmpeg_next::media::Type;

use crate::conversion::pts_to_seconds;
use crate::error::FramecutError;

/// Something that can report a video's duration in seconds.
pub trait DurationProbe {
    /// Duration of `video` in seconds, or `0.0` if it cannot be determined.
    fn probe(&self, video: &Path) -> f64;
}

/// Duration probe backed by the FFmpeg demuxer.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use framecut::{DurationProbe, FfmpegProbe};
///
/// let seconds = FfmpegProbe.probe(Path::new("input.mp4"));
/// println!("{seconds:.2}s");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegProbe;

impl FfmpegProbe {
    /// Read the duration, surfacing open failures instead of returning `0.0`.
    ///
    /// The container duration is preferred. When the container does not
    /// carry one, the best video stream's duration is used.
    ///
    /// # Errors
    ///
    /// [`FramecutError::FileOpen`] if the file cannot be opened as media.
    pub fn duration(&self, video: &Path) -> Result<f64, FramecutError> {
        let input = crate::ffmpeg::open_input(video)?;

        let container = input.duration();
        if container > 0 {
            // AV_TIME_BASE units.
            return Ok(container as f64 / 1_000_000.0);
        }

        let stream_seconds = input
            .streams()
            .best(Type::Video)
            .filter(|stream| stream.duration() > 0)
            .map(|stream| pts_to_seconds(stream.duration(), stream.time_base()))
            .unwrap_or(0.0);
        Ok(stream_seconds)
    }
}

impl DurationProbe for FfmpegProbe {
    fn probe(&self, video: &Path) -> f64 {
        match self.duration(video) {
            Ok(seconds) => seconds,
            Err(error) => {
                log::warn!("Could not probe duration of {}: {error}", video.display());
                0.0
            }
        }
    }
}

/// A probe that always reports the same duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDuration(pub f64);

impl DurationProbe for FixedDuration {
    fn probe(&self, _video: &Path) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_probes_as_zero() {
        let seconds = FfmpegProbe.probe(Path::new("definitely/not/here.mp4"));
        assert_eq!(seconds, 0.0);
    }

    #[test]
    fn missing_file_is_a_file_open_error() {
        let result = FfmpegProbe.duration(Path::new("definitely/not/here.mp4"));
        assert!(matches!(result, Err(FramecutError::FileOpen { .. })));
    }

    #[test]
    fn fixed_duration_reports_its_value() {
        assert_eq!(FixedDuration(42.5).probe(Path::new("any.mp4")), 42.5);
    }
}
