//! Near-duplicate detection against the frames already accepted for a video.
//!
//! Comparison is a linear scan over every accepted fingerprint. Per-video
//! frame counts are in the tens to low hundreds, so no index is kept.

use crate::hash::Fingerprint;

/// Largest meaningful threshold for a 64-bit fingerprint.
pub const MAX_THRESHOLD: u32 = 64;

/// Count the positions at which two fingerprints differ.
///
/// Comparison is per character and case-sensitive.
///
/// # Panics
///
/// Panics if the fingerprints have different lengths. Every fingerprint in
/// one run comes from the same hasher, so a mismatch is a programming error.
pub fn hamming_distance(a: &Fingerprint, b: &Fingerprint) -> u32 {
    assert_eq!(
        a.len(),
        b.len(),
        "fingerprints must have equal length ({a} vs {b})"
    );
    a.as_str()
        .chars()
        .zip(b.as_str().chars())
        .filter(|(x, y)| x != y)
        .count() as u32
}

/// Whether `candidate` is within `threshold` of any fingerprint in `accepted`.
///
/// An empty accepted set never produces a duplicate.
pub fn is_duplicate(candidate: &Fingerprint, accepted: &[Fingerprint], threshold: u32) -> bool {
    accepted
        .iter()
        .any(|existing| hamming_distance(candidate, existing) <= threshold)
}

/// The accepted-fingerprint set for one video.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    accepted: Vec<Fingerprint>,
    threshold: u32,
}

impl Deduplicator {
    /// Create an empty set that treats distances `<= threshold` as duplicates.
    pub fn new(threshold: u32) -> Self {
        Self {
            accepted: Vec::new(),
            threshold,
        }
    }

    /// The configured threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Whether `candidate` duplicates an accepted frame. Does not modify the set.
    pub fn is_duplicate(&self, candidate: &Fingerprint) -> bool {
        is_duplicate(candidate, &self.accepted, self.threshold)
    }

    /// Add a fingerprint to the accepted set.
    pub fn accept(&mut self, fingerprint: Fingerprint) {
        self.accepted.push(fingerprint);
    }

    /// Fingerprints accepted so far, in acceptance order.
    pub fn accepted(&self) -> &[Fingerprint] {
        &self.accepted
    }

    /// Number of accepted fingerprints.
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    /// Whether nothing has been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}
