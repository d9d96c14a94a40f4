//! Perceptual fingerprints.
//!
//! A [`Fingerprint`] summarises the visual structure of a frame so that
//! near-identical frames produce fingerprints a small Hamming distance
//! apart. [`DctHasher`] computes the classic 64-bit DCT perceptual hash:
//!
//! 1. convert to RGB, then to 8-bit luma,
//! 2. resize to 32×32 with a Lanczos filter,
//! 3. run a 2-D DCT-II,
//! 4. keep the top-left 8×8 low-frequency block,
//! 5. set one bit per coefficient that is above the block's median.
//!
//! The 64 bits are written most-significant first as 16 lowercase hex
//! characters.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use image::{DynamicImage, imageops::FilterType};
use rustdct::{Dct2, DctPlanner};

use crate::error::FramecutError;

const HASH_SIZE: usize = 8;
const SAMPLE_SIZE: usize = HASH_SIZE * 4;

/// A fixed-length perceptual hash string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an existing fingerprint string (e.g. one read back from a log).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Encode 64 hash bits as 16 hex characters.
    pub fn from_bits(bits: u64) -> Self {
        Self(format!("{bits:016x}"))
    }

    /// The fingerprint text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of characters in the fingerprint.
    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    /// Whether the fingerprint is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Computes fingerprints from encoded image bytes.
///
/// Implementations return `None` when the bytes cannot be decoded. Callers
/// treat such a frame as "not a duplicate" but still keep it.
pub trait PerceptualHasher {
    /// Fingerprint an encoded image (JPEG, PNG, ...).
    fn fingerprint(&self, image_bytes: &[u8]) -> Option<Fingerprint>;
}

/// 64-bit DCT perceptual hash backed by [`rustdct`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DctHasher;

impl DctHasher {
    /// Create a hasher.
    pub fn new() -> Self {
        Self
    }

    /// Fingerprint an already-decoded image.
    pub fn fingerprint_image(&self, image: &DynamicImage) -> Fingerprint {
        let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
        let luma = rgb
            .grayscale()
            .resize_exact(SAMPLE_SIZE as u32, SAMPLE_SIZE as u32, FilterType::Lanczos3)
            .to_luma8();

        let mut coefficients: Vec<f32> = luma.pixels().map(|p| f32::from(p.0[0])).collect();
        dct_2d(&mut coefficients, SAMPLE_SIZE);

        let mut low_frequency = Vec::with_capacity(HASH_SIZE * HASH_SIZE);
        for row in 0..HASH_SIZE {
            let start = row * SAMPLE_SIZE;
            low_frequency.extend_from_slice(&coefficients[start..start + HASH_SIZE]);
        }

        let median = median(&low_frequency);
        let bits = low_frequency
            .iter()
            .fold(0u64, |acc, &value| (acc << 1) | u64::from(value > median));

        Fingerprint::from_bits(bits)
    }

    /// Read an image file and fingerprint it.
    ///
    /// # Errors
    ///
    /// [`FramecutError::IoError`] if the file cannot be read, or
    /// [`FramecutError::ImageError`] if it cannot be decoded.
    pub fn fingerprint_file<P: AsRef<Path>>(&self, path: P) -> Result<Fingerprint, FramecutError> {
        let image = image::open(path)?;
        Ok(self.fingerprint_image(&image))
    }
}

impl PerceptualHasher for DctHasher {
    fn fingerprint(&self, image_bytes: &[u8]) -> Option<Fingerprint> {
        match image::load_from_memory(image_bytes) {
            Ok(image) => Some(self.fingerprint_image(&image)),
            Err(error) => {
                log::warn!("Could not decode frame for hashing: {error}");
                None
            }
        }
    }
}

/// In-place separable 2-D DCT-II over a `size`×`size` row-major buffer.
fn dct_2d(buffer: &mut [f32], size: usize) {
    let mut planner = DctPlanner::new();
    let dct = planner.plan_dct2(size);

    for row in buffer.chunks_exact_mut(size) {
        dct.process_dct2(row);
    }

    let mut column = vec![0f32; size];
    for x in 0..size {
        for y in 0..size {
            column[y] = buffer[y * size + x];
        }
        dct.process_dct2(&mut column);
        for y in 0..size {
            buffer[y * size + x] = column[y];
        }
    }
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.0
    } else {
        sorted[middle]
    }
}
