//! Per-video orchestration.
//!
//! [`VideoProcessor`] drives one video end to end:
//!
//! 1. parse the subtitle file,
//! 2. probe the video's duration,
//! 3. for each entry past the warm-up, extract a frame at the entry's
//!    midpoint, fingerprint it, and keep or reject it,
//! 4. append a [`FrameRecord`] for every extracted frame,
//! 5. flush the trailing subtitle chunk.
//!
//! Per-entry failures (decode, hash, enhancement) are logged and skipped.
//! Only video-level failures return an error.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use framecut::{ProcessingOptions, VideoJob, VideoProcessor};
//!
//! let options = ProcessingOptions::new().with_chunk_size(6);
//! let mut processor = VideoProcessor::new(options)?;
//! let job = VideoJob::new("videos/Channel/2025-08-22 talk.mp4", "videos/Channel/2025-08-22 talk.vtt");
//! let report = processor.process_to_dir(&job, Path::new("frames"))?;
//! println!("saved {} frames into {}", report.saved, report.output_dir.display());
//! # Ok::<(), framecut::FramecutError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use serde_json::json;

use crate::config::ProcessingOptions;
use crate::enhance::{CaptionEnhancer, PassthroughEnhancer, enhance_or_empty};
use crate::error::FramecutError;
use crate::extractor::{FfmpegFrameExtractor, FrameExtractor, extract_with_fallback};
use crate::hash::{DctHasher, PerceptualHasher};
use crate::naming::{choose_output_dir, format_clock, frame_file_name};
use crate::probe::{DurationProbe, FfmpegProbe};
use crate::progress::{OperationType, ProgressTracker};
use crate::record::FrameRecord;
use crate::sink::{DirectorySink, OutputSink};
use crate::state::{FrameDecision, VideoProcessingState};
use crate::subtitle::{SubtitleEntry, parse_subtitles};

/// One video and its subtitle file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoJob {
    /// The video file.
    pub video_path: PathBuf,
    /// The subtitle file (`.vtt` or `.srt`).
    pub subtitle_path: PathBuf,
    /// Uploader name for the output directory. Defaults to the name of the
    /// directory holding the video.
    pub uploader: Option<String>,
}

impl VideoJob {
    /// A job with the uploader taken from the video's parent directory.
    pub fn new(video_path: impl Into<PathBuf>, subtitle_path: impl Into<PathBuf>) -> Self {
        Self {
            video_path: video_path.into(),
            subtitle_path: subtitle_path.into(),
            uploader: None,
        }
    }

    /// Override the uploader name.
    #[must_use]
    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        self.uploader = Some(uploader.into());
        self
    }

    /// The uploader name used for the output directory.
    pub fn uploader(&self) -> String {
        self.uploader.clone().unwrap_or_else(|| {
            self.video_path
                .parent()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    /// The video's file name without extension.
    pub fn base_name(&self) -> String {
        self.video_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// `root/<uploader>/<base name>`, sanitised.
    pub fn output_dir(&self, root: &Path) -> PathBuf {
        choose_output_dir(root, &self.uploader(), &self.base_name())
    }
}

/// The timestamps derived from one subtitle entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameCandidate {
    /// Clamped start.
    pub start: f64,
    /// Clamped end.
    pub end: f64,
    /// Clamped midpoint; the frame is taken here.
    pub mid: f64,
}

impl FrameCandidate {
    /// Clamp `entry` into `[0, duration - epsilon]`.
    ///
    /// With an unknown duration (`<= 0`), the upper bound becomes the
    /// entry's own end, so only negative times are clamped.
    pub fn from_entry(entry: &SubtitleEntry, duration: f64, epsilon: f64) -> Self {
        let safe_end = if duration > 0.0 {
            (duration - epsilon).max(0.0)
        } else {
            entry.end.max(entry.start)
        };
        let clamp = |t: f64| t.min(safe_end).max(0.0);

        let start = clamp(entry.start);
        let end = clamp(entry.end);
        Self {
            start,
            end,
            mid: clamp((start + end) / 2.0),
        }
    }
}

/// Summary of one processed video.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoReport {
    /// Where frames and the record log were written.
    pub output_dir: PathBuf,
    /// Entries in the subtitle file.
    pub entries_total: usize,
    /// Entries past the warm-up (and within the cap) that were attempted.
    pub entries_considered: usize,
    /// Frames kept.
    pub saved: usize,
    /// Frames rejected as near-duplicates.
    pub skipped_duplicates: usize,
    /// Entries whose frame could not be extracted.
    pub extraction_failures: usize,
    /// Kept frames that could not be fingerprinted.
    pub hash_failures: usize,
    /// Re-chunked subtitle text, in emission order.
    pub chunks: Vec<String>,
}

/// Runs the per-video pipeline with pluggable backends.
pub struct VideoProcessor {
    options: ProcessingOptions,
    extractor: Box<dyn FrameExtractor>,
    hasher: Box<dyn PerceptualHasher>,
    probe: Box<dyn DurationProbe>,
    enhancer: Box<dyn CaptionEnhancer>,
}

impl VideoProcessor {
    /// A processor using the FFmpeg extractor and probe, the DCT hasher,
    /// and the passthrough enhancer.
    ///
    /// # Errors
    ///
    /// [`FramecutError::InvalidThreshold`] if the options do not validate.
    pub fn new(options: ProcessingOptions) -> Result<Self, FramecutError> {
        options.validate()?;
        let extractor = FfmpegFrameExtractor::new().with_jpeg_quality(options.jpeg_quality);
        Ok(Self {
            options,
            extractor: Box::new(extractor),
            hasher: Box::new(DctHasher::new()),
            probe: Box::new(FfmpegProbe),
            enhancer: Box::new(PassthroughEnhancer),
        })
    }

    /// Replace the frame extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: impl FrameExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Replace the perceptual hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: impl PerceptualHasher + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    /// Replace the duration probe.
    #[must_use]
    pub fn with_probe(mut self, probe: impl DurationProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Replace the caption enhancer.
    #[must_use]
    pub fn with_enhancer(mut self, enhancer: impl CaptionEnhancer + 'static) -> Self {
        self.enhancer = Box::new(enhancer);
        self
    }

    /// The options this processor was built with.
    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Process `job` into `out_root/<uploader>/<video>/`.
    ///
    /// # Errors
    ///
    /// As [`process`](Self::process).
    pub fn process_to_dir(
        &mut self,
        job: &VideoJob,
        out_root: &Path,
    ) -> Result<VideoReport, FramecutError> {
        let mut sink = DirectorySink::new(job.output_dir(out_root), &self.options.log_file_name);
        self.process(job, &mut sink)
    }

    /// Process one video, writing through `sink`.
    ///
    /// # Errors
    ///
    /// - [`FramecutError::UnsupportedSubtitleFormat`] for an unknown
    ///   subtitle extension.
    /// - [`FramecutError::FileOpen`] if the subtitle or video file cannot be
    ///   read.
    /// - Any sink error (disk full, permissions).
    pub fn process(
        &mut self,
        job: &VideoJob,
        sink: &mut dyn OutputSink,
    ) -> Result<VideoReport, FramecutError> {
        let entries = parse_subtitles(&job.subtitle_path)?;
        let output_dir = sink.location().to_path_buf();
        let base_name = job.base_name();

        if entries.is_empty() {
            log::info!("No subtitle entries in {}, skipping", job.subtitle_path.display());
            return Ok(VideoReport {
                output_dir,
                ..VideoReport::default()
            });
        }

        fs::metadata(&job.video_path).map_err(|error| FramecutError::FileOpen {
            path: job.video_path.clone(),
            reason: error.to_string(),
        })?;

        let duration = self.probe.probe(&job.video_path);
        if duration <= 0.0 {
            log::warn!(
                "Could not determine duration of {}, timestamps will not be clamped",
                job.video_path.display()
            );
        }

        sink.begin()?;

        let total = self.options.entry_limit(entries.len());
        log::info!(
            "Processing {base_name}: {total}/{} entries, duration {duration:.2}s, threshold {}",
            entries.len(),
            self.options.similarity_threshold
        );

        let mut state =
            VideoProcessingState::new(self.options.similarity_threshold, self.options.chunk_size);
        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            OperationType::FrameExtraction,
            Some(total as u64),
            self.options.progress_batch_size,
        );

        for entry in &entries[..total] {
            self.process_entry(job, entry, &entries, duration, &mut state, sink)?;
            tracker.advance(Duration::try_from_secs_f64(entry.start).ok());
        }
        tracker.finish();

        let (counters, chunks) = state.finish(&entries);

        if self.options.write_chunks && self.options.chunk_size > 0 {
            self.write_chunk_summary(job, &chunks, sink);
        }

        log::info!(
            "{base_name}: saved {} frames, skipped {} similar frames, {} chunks",
            counters.saved,
            counters.skipped_duplicates,
            chunks.len()
        );

        Ok(VideoReport {
            output_dir,
            entries_total: entries.len(),
            entries_considered: counters.considered,
            saved: counters.saved,
            skipped_duplicates: counters.skipped_duplicates,
            extraction_failures: counters.extraction_failures,
            hash_failures: counters.hash_failures,
            chunks,
        })
    }

    fn process_entry(
        &mut self,
        job: &VideoJob,
        entry: &SubtitleEntry,
        entries: &[SubtitleEntry],
        duration: f64,
        state: &mut VideoProcessingState,
        sink: &mut dyn OutputSink,
    ) -> Result<(), FramecutError> {
        let candidate = FrameCandidate::from_entry(entry, duration, self.options.clamp_epsilon);
        if candidate.start < self.options.warm_up {
            log::debug!("Skipping entry at {} (warm-up)", format_clock(candidate.start));
            return Ok(());
        }
        state.record_considered();

        // Named after the midpoint even when the fallback grabbed an earlier frame.
        let file_name = frame_file_name(candidate.mid);
        let Some(bytes) = extract_with_fallback(
            self.extractor.as_mut(),
            &job.video_path,
            candidate.mid,
            self.options.fallback_offset,
        ) else {
            state.record_extraction_failure();
            return Ok(());
        };

        // Only accepted frames touch the sink, so a duplicate sharing a name
        // with an accepted frame cannot clobber it.
        let fingerprint = self.hasher.fingerprint(&bytes);
        let decision = state.decide(fingerprint, candidate.mid, entries);
        let image_path = match decision {
            FrameDecision::Duplicate => sink.location().join(&file_name),
            FrameDecision::Accepted { .. } => sink.write_frame(&file_name, &bytes)?,
        };
        let mut record = FrameRecord::new(&image_path, candidate.start, candidate.end, &entry.text);

        match decision {
            FrameDecision::Duplicate => {
                log::info!("  skip similar frame {file_name}");
            }
            FrameDecision::Accepted {
                fingerprint: Some(fingerprint),
            } => {
                log::info!("  save {file_name}");
                let (enhanced, info) = enhance_or_empty(
                    self.enhancer.as_mut(),
                    &image_path,
                    &fingerprint,
                    &entry.text,
                );
                record = record.with_enhancement(enhanced, info);
            }
            FrameDecision::Accepted { fingerprint: None } => {
                log::warn!("  save {file_name} without fingerprint (hashing failed)");
            }
        }

        sink.append_record(&record.to_json_line()?)
    }

    fn write_chunk_summary(&self, job: &VideoJob, chunks: &[String], sink: &mut dyn OutputSink) {
        let chunk_size = self.options.chunk_size;
        let document = json!({
            "video": job.video_path.to_string_lossy(),
            "subtitle": job.subtitle_path.to_string_lossy(),
            "subs_per_chunk": chunk_size,
            "chunks_count": chunks.len(),
            "chunks": chunks,
        });
        let name = format!("subs_chunks_{chunk_size}.json");
        match sink.write_json(&name, &document) {
            Ok(path) => log::info!("Wrote subtitle chunks to {}", path.display()),
            Err(error) => log::warn!("Could not write {name}: {error}"),
        }
    }
}
