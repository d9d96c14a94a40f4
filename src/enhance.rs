//! Caption enhancement hook.
//!
//! After a frame is kept, the orchestrator may ask a [`CaptionEnhancer`] to
//! describe the image and rewrite the subtitle text with that description in
//! hand. Real enhancers usually call out to a vision model; the crate only
//! defines the contract and ships [`PassthroughEnhancer`]. Enhancement
//! failures are logged and recorded as empty fields.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::FramecutError;
use crate::hash::Fingerprint;

/// What an enhancer learned about a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageInfo {
    /// Path of the analysed frame.
    pub image: PathBuf,
    /// The frame's perceptual fingerprint.
    pub fingerprint: String,
    /// Free-form description.
    pub description: String,
}

/// Image analysis and caption rewriting.
pub trait CaptionEnhancer {
    /// Analyse the frame stored at `image_path`.
    fn analyze(
        &mut self,
        image_path: &Path,
        fingerprint: &Fingerprint,
    ) -> Result<ImageInfo, FramecutError>;

    /// Rewrite `text` given `info`. Returns `(enhanced_text, info_string)`.
    fn enhance(&mut self, text: &str, info: &ImageInfo) -> Result<(String, String), FramecutError>;
}

/// Returns the subtitle text unchanged (trimmed) and the fingerprint as info.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEnhancer;

impl CaptionEnhancer for PassthroughEnhancer {
    fn analyze(
        &mut self,
        image_path: &Path,
        fingerprint: &Fingerprint,
    ) -> Result<ImageInfo, FramecutError> {
        Ok(ImageInfo {
            image: image_path.to_path_buf(),
            fingerprint: fingerprint.to_string(),
            description: String::new(),
        })
    }

    fn enhance(&mut self, text: &str, info: &ImageInfo) -> Result<(String, String), FramecutError> {
        Ok((text.trim().to_string(), format!("phash={}", info.fingerprint)))
    }
}

/// Run `analyze` then `enhance`, degrading to empty strings on any failure.
pub(crate) fn enhance_or_empty(
    enhancer: &mut dyn CaptionEnhancer,
    image_path: &Path,
    fingerprint: &Fingerprint,
    text: &str,
) -> (String, String) {
    let result = enhancer
        .analyze(image_path, fingerprint)
        .and_then(|info| enhancer.enhance(text, &info));

    match result {
        Ok(pair) => pair,
        Err(error) => {
            log::warn!("Caption enhancement failed for {}: {error}", image_path.display());
            (String::new(), String::new())
        }
    }
}
