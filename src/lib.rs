//! # framecut
//!
//! Subtitle-aligned frame extraction. For every subtitle cue in a video,
//! `framecut` grabs one still at the cue's midpoint, drops it if it looks
//! like a frame already kept, and regroups the original subtitle text around
//! the frames that survive.
//!
//! Frames are decoded with FFmpeg via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) and compared with a
//! 64-bit DCT perceptual hash.
//!
//! ## Quick Start
//!
//! ### Process One Video
//!
//! ```no_run
//! use std::path::Path;
//!
//! use framecut::{ProcessingOptions, VideoJob, VideoProcessor};
//!
//! let options = ProcessingOptions::new()
//!     .with_similarity_threshold(5)
//!     .with_chunk_size(6);
//! let mut processor = VideoProcessor::new(options).unwrap();
//!
//! let job = VideoJob::new("videos/Channel/talk.mp4", "videos/Channel/talk.vtt");
//! let report = processor.process_to_dir(&job, Path::new("frames")).unwrap();
//! for chunk in &report.chunks {
//!     println!("---\n{chunk}");
//! }
//! ```
//!
//! ### Parse Subtitles
//!
//! ```no_run
//! let entries = framecut::parse_subtitles("talk.srt").unwrap();
//! for entry in &entries {
//!     println!("{:.3} -> {:.3}: {}", entry.start, entry.end, entry.text);
//! }
//! ```
//!
//! ### Compare Two Images
//!
//! ```no_run
//! use framecut::{DctHasher, hamming_distance};
//!
//! let hasher = DctHasher::new();
//! let a = hasher.fingerprint_file("a.jpg").unwrap();
//! let b = hasher.fingerprint_file("b.jpg").unwrap();
//! println!("{a} vs {b}: distance {}", hamming_distance(&a, &b));
//! ```
//!
//! ## How a Video Is Processed
//!
//! - **Subtitle parsing**: WebVTT and SRT, chosen by extension. Bad bytes
//!   are decoded lossily; unparseable timestamps become `0.0`.
//! - **Warm-up**: cues that start in the first 12 seconds (configurable)
//!   are skipped.
//! - **Extraction**: seek to the cue midpoint; if that fails, retry 0.2 s
//!   earlier through an `fps,trim` filter chain.
//! - **Deduplication**: a frame within the Hamming threshold of any kept
//!   frame is deleted.
//! - **Chunking**: every N kept frames, the subtitle text overlapping that
//!   span is joined into one chunk.
//! - **Records**: one JSON line per extracted frame in
//!   `enhanced_captions.jsonl`.
//!
//! Backends sit behind [`FrameExtractor`], [`PerceptualHasher`],
//! [`DurationProbe`], [`CaptionEnhancer`], and [`OutputSink`], so any of
//! them can be swapped, and [`MemorySink`] keeps a run off the disk.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod batch;
pub mod chunker;
pub mod config;
mod conversion;
pub mod dedup;
pub mod enhance;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod hash;
pub mod naming;
pub mod package;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod record;
pub mod sink;
pub mod state;
pub mod subtitle;

pub use batch::{
    BatchFailure, BatchSummary, FRAMES_ARCHIVE_NAME, ManifestEntry, filter_by_video_name,
    load_manifest, run_batch,
};
pub use chunker::SegmentChunker;
pub use config::ProcessingOptions;
pub use dedup::{Deduplicator, hamming_distance, is_duplicate};
pub use enhance::{CaptionEnhancer, ImageInfo, PassthroughEnhancer};
pub use error::FramecutError;
pub use extractor::{FfmpegFrameExtractor, FrameExtractor, extract_with_fallback};
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use hash::{DctHasher, Fingerprint, PerceptualHasher};
pub use naming::{choose_output_dir, format_clock, frame_file_name, sanitize_component};
pub use package::archive_directory;
pub use pipeline::{FrameCandidate, VideoJob, VideoProcessor, VideoReport};
pub use probe::{DurationProbe, FfmpegProbe, FixedDuration};
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use record::FrameRecord;
pub use sink::{DirectorySink, MemorySink, OutputSink};
pub use state::{FrameCounters, FrameDecision, VideoProcessingState};
pub use subtitle::{
    SubtitleEntry, SubtitleFormat, collect_overlapping_text, parse_srt, parse_subtitles,
    parse_timestamp, parse_vtt,
};
