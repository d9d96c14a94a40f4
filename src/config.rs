//! Processing configuration.
//!
//! [`ProcessingOptions`] carries every tunable of a run and is handed to
//! [`VideoProcessor`](crate::VideoProcessor) at construction. There is no
//! global state: two processors with different options can coexist.
//!
//! # Example
//!
//! ```
//! use framecut::ProcessingOptions;
//!
//! let options = ProcessingOptions::new()
//!     .with_similarity_threshold(4)
//!     .with_chunk_size(6)
//!     .with_write_chunks(true);
//! assert!(options.validate().is_ok());
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::dedup::MAX_THRESHOLD;
use crate::error::FramecutError;
use crate::extractor::DEFAULT_JPEG_QUALITY;
use crate::progress::{NoOpProgress, ProgressCallback};

/// Default maximum Hamming distance treated as a duplicate.
pub const DEFAULT_SIMILARITY_THRESHOLD: u32 = 5;
/// Entries starting before this many seconds are skipped.
pub const DEFAULT_WARM_UP: f64 = 12.0;
/// How much earlier the trim fallback retries.
pub const DEFAULT_FALLBACK_OFFSET: f64 = 0.2;
/// Candidate timestamps are kept this far inside the video's end.
pub const DEFAULT_CLAMP_EPSILON: f64 = 0.01;
/// File name of the per-video JSONL record log.
pub const DEFAULT_LOG_FILE_NAME: &str = "enhanced_captions.jsonl";

/// Options for processing one or more videos.
#[derive(Clone)]
pub struct ProcessingOptions {
    pub(crate) similarity_threshold: u32,
    pub(crate) chunk_size: usize,
    pub(crate) max_entries: Option<usize>,
    pub(crate) warm_up: f64,
    pub(crate) fallback_offset: f64,
    pub(crate) clamp_epsilon: f64,
    pub(crate) write_chunks: bool,
    pub(crate) log_file_name: String,
    pub(crate) jpeg_quality: u8,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) progress_batch_size: u64,
}

impl Debug for ProcessingOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ProcessingOptions")
            .field("similarity_threshold", &self.similarity_threshold)
            .field("chunk_size", &self.chunk_size)
            .field("max_entries", &self.max_entries)
            .field("warm_up", &self.warm_up)
            .field("fallback_offset", &self.fallback_offset)
            .field("clamp_epsilon", &self.clamp_epsilon)
            .field("write_chunks", &self.write_chunks)
            .field("log_file_name", &self.log_file_name)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("progress_batch_size", &self.progress_batch_size)
            .finish()
    }
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingOptions {
    /// Defaults: threshold 5, chunking off, no entry cap, 12 s warm-up,
    /// 0.2 s fallback offset, JPEG quality 95, no progress callback.
    pub fn new() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            chunk_size: 0,
            max_entries: None,
            warm_up: DEFAULT_WARM_UP,
            fallback_offset: DEFAULT_FALLBACK_OFFSET,
            clamp_epsilon: DEFAULT_CLAMP_EPSILON,
            write_chunks: false,
            log_file_name: DEFAULT_LOG_FILE_NAME.to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            progress: Arc::new(NoOpProgress),
            progress_batch_size: 1,
        }
    }

    /// Maximum Hamming distance at which a frame counts as a duplicate.
    /// Smaller is stricter. Must be within `0..=64`.
    #[must_use]
    pub fn with_similarity_threshold(mut self, threshold: u32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Close a subtitle chunk every `size` accepted frames. 0 disables.
    #[must_use]
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Process at most `max` subtitle entries per video. `Some(0)` and
    /// `None` both mean no cap.
    #[must_use]
    pub fn with_max_entries(mut self, max: Option<usize>) -> Self {
        self.max_entries = max.filter(|&max| max > 0);
        self
    }

    /// Skip entries that start before `seconds`.
    #[must_use]
    pub fn with_warm_up(mut self, seconds: f64) -> Self {
        self.warm_up = seconds.max(0.0);
        self
    }

    /// How much earlier the trim fallback retries after a failed seek.
    #[must_use]
    pub fn with_fallback_offset(mut self, seconds: f64) -> Self {
        self.fallback_offset = seconds.max(0.0);
        self
    }

    /// Distance kept between candidate timestamps and the video's end.
    #[must_use]
    pub fn with_clamp_epsilon(mut self, seconds: f64) -> Self {
        self.clamp_epsilon = seconds.max(0.0);
        self
    }

    /// Write `subs_chunks_<N>.json` next to the frames when chunking is on.
    #[must_use]
    pub fn with_write_chunks(mut self, write: bool) -> Self {
        self.write_chunks = write;
        self
    }

    /// Override the record log file name.
    #[must_use]
    pub fn with_log_file_name(mut self, name: impl Into<String>) -> Self {
        self.log_file_name = name.into();
        self
    }

    /// JPEG quality for extracted frames (clamped to 1-100).
    #[must_use]
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Fire the progress callback every `size` entries (minimum 1).
    #[must_use]
    pub fn with_progress_batch_size(mut self, size: u64) -> Self {
        self.progress_batch_size = size.max(1);
        self
    }

    /// Check the options for values that cannot be honoured.
    ///
    /// # Errors
    ///
    /// [`FramecutError::InvalidThreshold`] if the threshold exceeds 64.
    pub fn validate(&self) -> Result<(), FramecutError> {
        if self.similarity_threshold > MAX_THRESHOLD {
            return Err(FramecutError::InvalidThreshold(self.similarity_threshold));
        }
        Ok(())
    }

    /// The configured similarity threshold.
    pub fn similarity_threshold(&self) -> u32 {
        self.similarity_threshold
    }

    /// The configured chunk size (0 when disabled).
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// The configured warm-up in seconds.
    pub fn warm_up(&self) -> f64 {
        self.warm_up
    }

    /// The record log file name.
    pub fn log_file_name(&self) -> &str {
        &self.log_file_name
    }

    /// The configured JPEG quality.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// How many of `available` entries to process.
    pub(crate) fn entry_limit(&self, available: usize) -> usize {
        self.max_entries
            .map_or(available, |max| max.min(available))
    }
}
