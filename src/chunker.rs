//! Re-chunking of subtitle text around accepted frames.
//!
//! Every `chunk_size` accepted frames close a segment. The segment's text is
//! rebuilt from the original subtitle entries that overlap the segment's time
//! window, so one long cue can feed several chunks and several short cues can
//! land in one. A chunk with no overlapping text is dropped rather than
//! emitted empty. After the last entry, [`SegmentChunker::finish`] emits one
//! more chunk for a partial trailing segment.

use crate::subtitle::{SubtitleEntry, collect_overlapping_text};

/// Segment boundary state for one video.
#[derive(Debug, Clone, Default)]
pub struct SegmentChunker {
    chunk_size: usize,
    segment_start: Option<f64>,
    saved_in_segment: usize,
    last_saved: Option<f64>,
    chunks: Vec<String>,
}

impl SegmentChunker {
    /// Create a chunker that closes a segment every `chunk_size` accepted
    /// frames. Zero disables chunking.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            ..Self::default()
        }
    }

    /// Frames per chunk (0 when disabled).
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Start time of the open segment, if any frame has been accepted.
    pub fn segment_start(&self) -> Option<f64> {
        self.segment_start
    }

    /// Accepted frames counted toward the open segment.
    pub fn saved_in_segment(&self) -> usize {
        self.saved_in_segment
    }

    /// Time of the most recently accepted frame.
    pub fn last_saved(&self) -> Option<f64> {
        self.last_saved
    }

    /// Chunks emitted so far.
    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    /// Record a frame accepted at `time`.
    ///
    /// Returns the chunk text when this frame closed a segment and the
    /// window had overlapping subtitle text.
    pub fn on_accepted(&mut self, time: f64, entries: &[SubtitleEntry]) -> Option<&str> {
        let segment_start = *self.segment_start.get_or_insert(time);
        self.saved_in_segment += 1;
        self.last_saved = Some(time);

        if self.chunk_size == 0 || self.saved_in_segment < self.chunk_size {
            return None;
        }

        self.segment_start = Some(time);
        self.saved_in_segment = 0;
        self.push_chunk(entries, segment_start, time)
    }

    /// Flush the partial trailing segment and return every chunk in
    /// emission order.
    pub fn finish(mut self, entries: &[SubtitleEntry]) -> Vec<String> {
        if self.chunk_size > 0 && self.saved_in_segment > 0 {
            if let (Some(start), Some(end)) = (self.segment_start, self.last_saved) {
                self.push_chunk(entries, start, end);
            }
        }
        self.chunks
    }

    fn push_chunk(&mut self, entries: &[SubtitleEntry], start: f64, end: f64) -> Option<&str> {
        let text = collect_overlapping_text(entries, start, end);
        if text.is_empty() {
            log::debug!("No subtitle text overlaps [{start:.3}, {end:.3}], chunk dropped");
            return None;
        }
        self.chunks.push(text);
        self.chunks.last().map(String::as_str)
    }
}
