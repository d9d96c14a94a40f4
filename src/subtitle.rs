//! Subtitle parsing.
//!
//! This module turns WebVTT (`.vtt`) and SubRip (`.srt`) files into an
//! ordered list of [`SubtitleEntry`] values. Parsing is deliberately
//! forgiving: invalid UTF-8 is replaced rather than rejected, missing cue
//! numbers are tolerated, and timestamps that cannot be read become `0.0`.
//!
//! # Example
//!
//! ```no_run
//! use framecut::{FramecutError, parse_subtitles};
//!
//! let entries = parse_subtitles("episode.vtt")?;
//! for entry in &entries {
//!     println!("[{:.3} → {:.3}] {}", entry.start, entry.end, entry.text);
//! }
//! # Ok::<(), FramecutError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::FramecutError;

/// Minimum display time given to a cue whose end does not follow its start.
pub const MIN_CUE_SECONDS: f64 = 0.5;

static VTT_TIMING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}:)?\d{2}:\d{2}[.,]\d{1,3} --> (\d{1,2}:)?\d{2}:\d{2}[.,]\d{1,3}")
        .expect("timing regex is valid")
});

/// A single timed subtitle cue.
///
/// `start` and `end` are in seconds. After parsing, `end > start` always
/// holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleEntry {
    /// When the cue starts displaying, in seconds.
    pub start: f64,
    /// When the cue stops displaying, in seconds.
    pub end: f64,
    /// Cue text. Multi-line cues keep their line breaks.
    pub text: String,
}

impl SubtitleEntry {
    /// Build an entry, bumping `end` to `start + 0.5` when the cue would
    /// otherwise have no duration.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        let end = if end <= start {
            start + MIN_CUE_SECONDS
        } else {
            end
        };
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Length of the overlap between this cue and `[start, end]`, in
    /// seconds. Zero when the intervals do not overlap.
    pub fn overlap(&self, start: f64, end: f64) -> f64 {
        let left = self.start.max(start);
        let right = self.end.min(end);
        (right - left).max(0.0)
    }
}

/// Timed-text formats understood by [`parse_subtitles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// SubRip Text (.srt).
    Srt,
    /// Web Video Text Tracks (.vtt).
    WebVtt,
}

impl SubtitleFormat {
    /// Pick the format from a file extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// [`FramecutError::UnsupportedSubtitleFormat`] for anything other than
    /// `.srt` or `.vtt`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FramecutError> {
        let extension = path
            .as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "srt" => Ok(SubtitleFormat::Srt),
            "vtt" => Ok(SubtitleFormat::WebVtt),
            "" => Err(FramecutError::UnsupportedSubtitleFormat(
                "(no extension)".to_string(),
            )),
            other => Err(FramecutError::UnsupportedSubtitleFormat(format!(".{other}"))),
        }
    }
}

impl Display for SubtitleFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SubtitleFormat::Srt => write!(f, "SRT"),
            SubtitleFormat::WebVtt => write!(f, "WebVTT"),
        }
    }
}

/// Read and parse a subtitle file, choosing the parser by extension.
///
/// # Errors
///
/// - [`FramecutError::UnsupportedSubtitleFormat`] for unknown extensions.
/// - [`FramecutError::FileOpen`] if the file cannot be read.
pub fn parse_subtitles<P: AsRef<Path>>(path: P) -> Result<Vec<SubtitleEntry>, FramecutError> {
    let path = path.as_ref();
    let format = SubtitleFormat::from_path(path)?;

    let bytes = std::fs::read(path).map_err(|error| FramecutError::FileOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;
    let content = String::from_utf8_lossy(&bytes);
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let entries = match format {
        SubtitleFormat::Srt => parse_srt(content),
        SubtitleFormat::WebVtt => parse_vtt(content),
    };

    log::debug!(
        "Parsed {} {} cues from {}",
        entries.len(),
        format,
        path.display()
    );
    Ok(entries)
}

/// Parse WebVTT text.
///
/// Lines that are neither timing lines nor cue text (the `WEBVTT` header,
/// cue identifiers, `NOTE` blocks) are skipped. Cue settings after the end
/// timestamp are ignored.
pub fn parse_vtt(content: &str) -> Vec<SubtitleEntry> {
    let lines: Vec<&str> = content.lines().collect();
    let mut entries = Vec::new();

    let mut index = 0;
    if lines
        .first()
        .is_some_and(|line| line.trim().to_ascii_uppercase().starts_with("WEBVTT"))
    {
        index = 1;
    }

    while index < lines.len() {
        let line = lines[index];
        index += 1;

        if !VTT_TIMING_LINE.is_match(line) {
            continue;
        }

        let Some((left, right)) = split_timing_line(line) else {
            continue;
        };
        let start = parse_timestamp(left);
        let end = parse_timestamp(right.split_whitespace().next().unwrap_or(""));

        let mut text_lines = Vec::new();
        while index < lines.len() && !lines[index].trim().is_empty() {
            text_lines.push(lines[index]);
            index += 1;
        }

        entries.push(SubtitleEntry::new(
            start,
            end,
            text_lines.join("\n").trim(),
        ));
    }

    entries
}

/// Parse SubRip text.
///
/// Blocks are separated by empty lines; lines holding only whitespace are
/// dropped without ending the block. The numeric index line is optional;
/// blocks without a `-->` timing line are dropped.
pub fn parse_srt(content: &str) -> Vec<SubtitleEntry> {
    let mut entries = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in content.lines().chain(std::iter::once("")) {
        if line.is_empty() {
            if !block.is_empty() {
                if let Some(entry) = parse_srt_block(&block) {
                    entries.push(entry);
                }
                block.clear();
            }
            continue;
        }
        let line = line.trim_matches('\u{feff}');
        // Whitespace-only lines do not end a block.
        if !line.trim().is_empty() {
            block.push(line);
        }
    }

    entries
}

fn parse_srt_block(lines: &[&str]) -> Option<SubtitleEntry> {
    let is_index = |line: &str| {
        let line = line.trim();
        !line.is_empty() && line.chars().all(|c| c.is_ascii_digit())
    };

    let timing_index = usize::from(is_index(lines[0]));
    let timing_line = lines.get(timing_index)?;
    let (left, right) = split_timing_line(timing_line)?;

    let text = lines[timing_index + 1..].join("\n");
    Some(SubtitleEntry::new(
        parse_timestamp(left),
        parse_timestamp(right),
        text.trim(),
    ))
}

fn split_timing_line(line: &str) -> Option<(&str, &str)> {
    let (left, right) = line.split_once("-->")?;
    if right.contains("-->") {
        return None;
    }
    Some((left.trim(), right.trim()))
}

/// Parse `H:MM:SS.mmm`, `MM:SS.mmm`, or bare seconds into seconds.
///
/// `,` is accepted as the sub-second separator. Anything unreadable yields
/// `0.0`.
pub fn parse_timestamp(value: &str) -> f64 {
    let normalised = value.trim().replace(',', ".");
    let parts: Vec<&str> = normalised.split(':').collect();

    let parsed = match parts.as_slice() {
        [hours, minutes, seconds] => hours
            .trim()
            .parse::<u64>()
            .ok()
            .zip(minutes.trim().parse::<u64>().ok())
            .zip(seconds.trim().parse::<f64>().ok())
            .and_then(|((h, m), s)| {
                let whole = h.checked_mul(3600)?.checked_add(m.checked_mul(60)?)?;
                Some(whole as f64 + s)
            }),
        [minutes, seconds] => minutes
            .trim()
            .parse::<u64>()
            .ok()
            .zip(seconds.trim().parse::<f64>().ok())
            .and_then(|(m, s)| Some(m.checked_mul(60)? as f64 + s)),
        _ => normalised.parse::<f64>().ok(),
    };

    match parsed {
        Some(seconds) if seconds.is_finite() => seconds.max(0.0),
        _ => 0.0,
    }
}

/// Join the text of every cue overlapping `[start, end]`.
///
/// Cues are taken in start-time order; blank texts are dropped and the rest
/// are trimmed and joined with newlines. A cue that merely touches the
/// window edge (zero-length overlap) is not included.
pub fn collect_overlapping_text(entries: &[SubtitleEntry], start: f64, end: f64) -> String {
    let mut picked: Vec<&SubtitleEntry> = entries
        .iter()
        .filter(|entry| entry.overlap(start, end) > 0.0)
        .collect();
    picked.sort_by(|a, b| a.start.total_cmp(&b.start));

    picked
        .iter()
        .map(|entry| entry.text.trim())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
