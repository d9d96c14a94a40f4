//! The mutable state of one video's processing run.
//!
//! [`VideoProcessingState`] owns the accepted-fingerprint set, the segment
//! chunker, and the counters. It is created per video, threaded through
//! the entry loop, and consumed by [`finish`](VideoProcessingState::finish).
//! Nothing in it touches the filesystem, so accept/reject and chunking can
//! be driven directly in tests.

use crate::chunker::SegmentChunker;
use crate::dedup::Deduplicator;
use crate::hash::Fingerprint;
use crate::subtitle::SubtitleEntry;

/// Outcome for one extracted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameDecision {
    /// Too close to an accepted frame; the frame is discarded.
    Duplicate,
    /// Kept. `fingerprint` is `None` when hashing failed.
    Accepted {
        /// The fingerprint added to the accepted set, if any.
        fingerprint: Option<Fingerprint>,
    },
}

/// Per-video counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCounters {
    /// Entries past the warm-up that were attempted.
    pub considered: usize,
    /// Frames kept.
    pub saved: usize,
    /// Frames rejected as duplicates.
    pub skipped_duplicates: usize,
    /// Entries whose frame could not be extracted.
    pub extraction_failures: usize,
    /// Kept frames that could not be fingerprinted.
    pub hash_failures: usize,
}

/// Dedup set, chunk state, and counters for one video.
#[derive(Debug, Clone)]
pub struct VideoProcessingState {
    dedup: Deduplicator,
    chunker: SegmentChunker,
    counters: FrameCounters,
}

impl VideoProcessingState {
    /// Fresh state for a video.
    pub fn new(similarity_threshold: u32, chunk_size: usize) -> Self {
        Self {
            dedup: Deduplicator::new(similarity_threshold),
            chunker: SegmentChunker::new(chunk_size),
            counters: FrameCounters::default(),
        }
    }

    /// Note that an entry passed the warm-up and will be attempted.
    pub fn record_considered(&mut self) {
        self.counters.considered += 1;
    }

    /// Note that an entry's frame could not be extracted.
    pub fn record_extraction_failure(&mut self) {
        self.counters.extraction_failures += 1;
    }

    /// Accept or reject a frame extracted at `time`.
    ///
    /// A frame without a fingerprint cannot be compared, so it is always
    /// kept. Every kept frame advances the chunker.
    pub fn decide(
        &mut self,
        fingerprint: Option<Fingerprint>,
        time: f64,
        entries: &[SubtitleEntry],
    ) -> FrameDecision {
        if let Some(candidate) = &fingerprint
            && self.dedup.is_duplicate(candidate)
        {
            self.counters.skipped_duplicates += 1;
            return FrameDecision::Duplicate;
        }

        match &fingerprint {
            Some(accepted) => self.dedup.accept(accepted.clone()),
            None => self.counters.hash_failures += 1,
        }
        self.counters.saved += 1;

        if let Some(chunk) = self.chunker.on_accepted(time, entries) {
            log::debug!("Chunk closed at {time:.3}s ({} chars)", chunk.chars().count());
        }

        FrameDecision::Accepted { fingerprint }
    }

    /// Counters so far.
    pub fn counters(&self) -> FrameCounters {
        self.counters
    }

    /// The accepted-fingerprint set.
    pub fn deduplicator(&self) -> &Deduplicator {
        &self.dedup
    }

    /// The segment chunker.
    pub fn chunker(&self) -> &SegmentChunker {
        &self.chunker
    }

    /// Flush the trailing segment and return the final counters and chunks.
    pub fn finish(self, entries: &[SubtitleEntry]) -> (FrameCounters, Vec<String>) {
        (self.counters, self.chunker.finish(entries))
    }
}
