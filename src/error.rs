//! Error types for the `framecut` crate.
//!
//! This module defines [`FramecutError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context (file
//! paths, manifest line numbers, upstream messages) to diagnose a failed
//! video without extra logging at the call site.
//!
//! Only video-level failures surface as errors. A single bad frame inside a
//! video (decode failure, corrupt image, enhancement failure) is logged and
//! skipped by [`VideoProcessor`](crate::VideoProcessor) instead.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use serde_json::Error as JsonError;
use thiserror::Error;
use zip::result::ZipError;

/// The unified error type for all `framecut` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FramecutError {
    /// A subtitle or media file could not be opened.
    #[error("Failed to open file at {path}: {reason}")]
    FileOpen {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The subtitle file extension is not one of the supported formats.
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedSubtitleFormat(String),

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// FFmpeg filter graph setup or processing failed.
    #[error("Filter graph error: {0}")]
    FilterGraphError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// The similarity threshold is outside `0..=64`.
    #[error("Similarity threshold {0} is out of range (expected 0..=64)")]
    InvalidThreshold(u32),

    /// A manifest file could not be read.
    #[error("Manifest error at line {line}: {reason}")]
    ManifestError {
        /// One-based line number, or 0 when the whole file failed.
        line: usize,
        /// Why the line was rejected.
        reason: String,
    },

    /// Writing a zip archive failed.
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding or decoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// A record could not be serialised to JSON.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] JsonError),
}

impl From<FfmpegError> for FramecutError {
    fn from(error: FfmpegError) -> Self {
        FramecutError::FfmpegError(error.to_string())
    }
}

impl From<ZipError> for FramecutError {
    fn from(error: ZipError) -> Self {
        FramecutError::ArchiveError(error.to_string())
    }
}
