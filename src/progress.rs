//! Progress reporting.
//!
//! [`VideoProcessor`](crate::VideoProcessor) reports one unit of progress per
//! subtitle entry it walks, and [`run_batch`](crate::run_batch) one per video.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use framecut::{ProcessingOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let options = ProcessingOptions::new().with_progress(Arc::new(PrintProgress));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// The kind of work being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Walking one video's subtitle entries.
    FrameExtraction,
    /// Walking the videos of a batch.
    Batch,
}

/// A progress snapshot.
///
/// Delivered to [`ProgressCallback::on_progress`] every
/// [`progress_batch_size`](crate::ProcessingOptions::with_progress_batch_size)
/// items, and once more when the operation finishes.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// Items processed so far.
    pub current: u64,
    /// Total items expected, if known.
    pub total: Option<u64>,
    /// Completion percentage (0.0 - 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining from current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Video position of the item just processed, when there is one.
    pub current_timestamp: Option<Duration>,
}

/// Receives progress updates.
///
/// Callbacks observe; they cannot stop the operation.
pub trait ProgressCallback: Send + Sync {
    /// Called at the configured cadence.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards everything. The default callback.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Drives a [`ProgressCallback`] through one walk.
///
/// For [`OperationType::FrameExtraction`] a step is one subtitle entry of a
/// single video (warm-up entries included, so `total` is the entry cap).
/// For [`OperationType::Batch`] a step is one finished or failed video.
/// Reports go out every `every` steps and once more from `finish`.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    done: u64,
    every: u64,
    started: Instant,
    since_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        every: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            done: 0,
            every: every.max(1),
            started: Instant::now(),
            since_report: 0,
        }
    }

    /// One entry (or video) is done. `position` is the entry's start time
    /// in the video; batch walks pass `None`.
    pub(crate) fn advance(&mut self, position: Option<Duration>) {
        self.done += 1;
        self.since_report += 1;

        if self.since_report >= self.every {
            self.report(position);
            self.since_report = 0;
        }
    }

    /// Last report for the walk, whatever the cadence.
    pub(crate) fn finish(&mut self) {
        self.report(None);
    }

    fn report(&self, position: Option<Duration>) {
        let elapsed = self.started.elapsed();

        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.done as f32 / total as f32) * 100.0);

        // Linear projection from the average time per step so far.
        let estimated_remaining = self.total.filter(|_| self.done > 0).map(|total| {
            let left = total.saturating_sub(self.done);
            elapsed.mul_f64(left as f64 / self.done as f64)
        });

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current: self.done,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_timestamp: position,
        });
    }
}
