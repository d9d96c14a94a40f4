//! Manifest-driven batch processing.
//!
//! A manifest is a JSONL file with one video per line:
//!
//! ```text
//! {"video_path": "videos/Channel/a.mp4", "subtitle_path": "videos/Channel/a.vtt", "created_at": 1724300000}
//! ```
//!
//! Videos are processed one after another. A failure in one video is
//! logged and recorded in the [`BatchSummary`]; the batch moves on.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FramecutError;
use crate::package::archive_directory;
use crate::pipeline::{VideoJob, VideoProcessor, VideoReport};
use crate::progress::{OperationType, ProgressTracker};

/// Archive name written next to the frames when packaging is requested.
pub const FRAMES_ARCHIVE_NAME: &str = "frames.zip";

/// One manifest line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// The video file.
    pub video_path: PathBuf,
    /// Its subtitle file.
    pub subtitle_path: PathBuf,
    /// Uploader override.
    #[serde(default)]
    pub uploader: Option<String>,
    /// Unix seconds when the video was added.
    #[serde(default)]
    pub created_at: Option<i64>,
}

impl ManifestEntry {
    /// The job this entry describes.
    pub fn to_job(&self) -> VideoJob {
        VideoJob {
            video_path: self.video_path.clone(),
            subtitle_path: self.subtitle_path.clone(),
            uploader: self.uploader.clone(),
        }
    }
}

/// Read a manifest, keeping entries with `created_at >= since` when given.
///
/// A missing manifest yields an empty list. Blank lines are ignored;
/// malformed lines are skipped with a warning. Entries without a
/// `created_at` count as time 0.
///
/// # Errors
///
/// [`FramecutError::ManifestError`] if the file exists but cannot be read.
pub fn load_manifest(path: &Path, since: Option<i64>) -> Result<Vec<ManifestEntry>, FramecutError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            log::warn!("Manifest {} does not exist", path.display());
            return Ok(Vec::new());
        }
        Err(error) => {
            return Err(FramecutError::ManifestError {
                line: 0,
                reason: format!("{}: {error}", path.display()),
            });
        }
    };
    let content = String::from_utf8_lossy(&bytes);

    let mut entries = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_manifest_line(line, index + 1) {
            Ok(entry) => entries.push(entry),
            Err(error) => log::warn!("{error}"),
        }
    }

    if let Some(since) = since {
        entries.retain(|entry| entry.created_at.unwrap_or(0) >= since);
    }
    Ok(entries)
}

fn parse_manifest_line(line: &str, number: usize) -> Result<ManifestEntry, FramecutError> {
    let entry: ManifestEntry =
        serde_json::from_str(line).map_err(|error| FramecutError::ManifestError {
            line: number,
            reason: error.to_string(),
        })?;
    if entry.video_path.as_os_str().is_empty() || entry.subtitle_path.as_os_str().is_empty() {
        return Err(FramecutError::ManifestError {
            line: number,
            reason: "empty video_path or subtitle_path".to_string(),
        });
    }
    Ok(entry)
}

/// Keep entries whose video file name contains `fragment`.
pub fn filter_by_video_name(entries: Vec<ManifestEntry>, fragment: &str) -> Vec<ManifestEntry> {
    if fragment.is_empty() {
        return entries;
    }
    entries
        .into_iter()
        .filter(|entry| {
            entry
                .video_path
                .file_name()
                .is_some_and(|name| name.to_string_lossy().contains(fragment))
        })
        .collect()
}

/// A video that failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    /// The video that failed.
    pub video_path: PathBuf,
    /// The error message.
    pub error: String,
}

/// Results of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Reports of videos that completed, in order.
    pub completed: Vec<VideoReport>,
    /// Videos that failed, in order.
    pub failed: Vec<BatchFailure>,
}

impl BatchSummary {
    /// Total frames kept across the batch.
    pub fn total_saved(&self) -> usize {
        self.completed.iter().map(|report| report.saved).sum()
    }
}

/// Process `jobs` in order under `out_root`.
///
/// With `package` set, each completed video's frame directory is archived
/// to [`FRAMES_ARCHIVE_NAME`] inside it; a packaging failure counts as a
/// failure of that video.
pub fn run_batch(
    processor: &mut VideoProcessor,
    jobs: &[VideoJob],
    out_root: &Path,
    package: bool,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    let mut tracker = ProgressTracker::new(
        processor.options().progress.clone(),
        OperationType::Batch,
        Some(jobs.len() as u64),
        1,
    );

    for job in jobs {
        let result = processor.process_to_dir(job, out_root).and_then(|report| {
            if package && report.saved > 0 {
                let zip_path = report.output_dir.join(FRAMES_ARCHIVE_NAME);
                archive_directory(&report.output_dir, &zip_path)?;
            }
            Ok(report)
        });

        match result {
            Ok(report) => summary.completed.push(report),
            Err(error) => {
                log::error!("Failed to process {}: {error}", job.video_path.display());
                summary.failed.push(BatchFailure {
                    video_path: job.video_path.clone(),
                    error: error.to_string(),
                });
            }
        }
        tracker.advance(None);
    }
    tracker.finish();

    log::info!(
        "Batch finished: {} completed, {} failed, {} frames saved",
        summary.completed.len(),
        summary.failed.len(),
        summary.total_saved()
    );
    summary
}
