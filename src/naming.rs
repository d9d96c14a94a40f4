//! Output path and file naming.
//!
//! Every video gets its own directory under the output root, derived from
//! the uploader name and the video's base name. Names are sanitised so they
//! are valid on every common filesystem, and titles that would produce an
//! over-long path fall back to a short digest so reruns land in the same
//! place.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Longest path (in characters) accepted before falling back to a digest name.
pub const MAX_OUTPUT_PATH_CHARS: usize = 230;
/// Character budget for the uploader directory name.
pub const MAX_UPLOADER_CHARS: usize = 40;
/// Character budget for the video directory name.
pub const MAX_VIDEO_CHARS: usize = 80;

const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Format seconds as `HH:MM:SS.mmm`.
pub fn format_clock(seconds: f64) -> String {
    let (hours, minutes, secs, millis) = split_millis(seconds);
    format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
}

/// File name for a frame captured at `seconds`: `HH-MM-SS-mmm.jpg`.
pub fn frame_file_name(seconds: f64) -> String {
    let (hours, minutes, secs, millis) = split_millis(seconds);
    format!("{hours:02}-{minutes:02}-{secs:02}-{millis:03}.jpg")
}

fn split_millis(seconds: f64) -> (u64, u64, u64, u64) {
    let total_millis = if seconds.is_finite() {
        (seconds.max(0.0) * 1000.0).round() as u64
    } else {
        0
    };
    let total_secs = total_millis / 1000;
    (
        total_secs / 3600,
        (total_secs % 3600) / 60,
        total_secs % 60,
        total_millis % 1000,
    )
}

/// Make `name` safe to use as a single path component.
///
/// Reserved characters and control characters become `_`, whitespace runs
/// collapse to one space, trailing spaces and dots are removed, and the
/// result is cut to `max_chars` characters. An empty result becomes `_`.
pub fn sanitize_component(name: &str, max_chars: usize) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) || (c.is_control() && !c.is_whitespace()) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_end_matches([' ', '.']);
    let truncated: String = trimmed.chars().take(max_chars).collect();

    if truncated.is_empty() {
        "_".to_string()
    } else {
        truncated
    }
}

/// First eight hex characters of the SHA-256 digest of `value`.
pub fn short_digest(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    format!("{digest:x}")[..8].to_string()
}

/// Output directory for one video: `root/<uploader>/<video>`.
///
/// When the natural path would exceed [`MAX_OUTPUT_PATH_CHARS`], the video
/// component is replaced with `vid_<digest>`, where the digest covers the
/// root, uploader, and base name so distinct videos stay distinct.
pub fn choose_output_dir(root: &Path, uploader: &str, base: &str) -> PathBuf {
    let uploader_dir = sanitize_component(uploader, MAX_UPLOADER_CHARS);
    let video_dir = sanitize_component(base, MAX_VIDEO_CHARS);

    let natural = root.join(&uploader_dir).join(&video_dir);
    if natural.to_string_lossy().chars().count() <= MAX_OUTPUT_PATH_CHARS {
        return natural;
    }

    let digest = short_digest(&format!("{}{uploader}{base}", root.to_string_lossy()));
    log::debug!(
        "Output path for {base:?} exceeds {MAX_OUTPUT_PATH_CHARS} chars, using vid_{digest}"
    );
    root.join(uploader_dir).join(format!("vid_{digest}"))
}
