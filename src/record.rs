//! The per-frame JSONL record.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FramecutError;

/// One line of a video's record log.
///
/// Written for every entry whose frame was extracted, whether the frame was
/// kept or rejected as a duplicate. Rejected frames carry empty
/// `subtitle_enhanced` and `image_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Path the frame was written to.
    pub image: String,
    /// Clamped entry start, in seconds.
    pub start: f64,
    /// Clamped entry end, in seconds.
    pub end: f64,
    /// The subtitle text exactly as parsed.
    pub subtitle_orig: String,
    /// Enhanced caption, or empty.
    pub subtitle_enhanced: String,
    /// Image description from the enhancer, or empty.
    pub image_info: String,
}

impl FrameRecord {
    /// A record with empty enhancement fields.
    pub fn new(image: &Path, start: f64, end: f64, subtitle: impl Into<String>) -> Self {
        Self {
            image: image.to_string_lossy().into_owned(),
            start,
            end,
            subtitle_orig: subtitle.into(),
            subtitle_enhanced: String::new(),
            image_info: String::new(),
        }
    }

    /// Attach enhancement output.
    #[must_use]
    pub fn with_enhancement(mut self, enhanced: String, info: String) -> Self {
        self.subtitle_enhanced = enhanced;
        self.image_info = info;
        self
    }

    /// Serialise as a single JSON line. Non-ASCII text is written as-is.
    pub fn to_json_line(&self) -> Result<String, FramecutError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_stable_keys() {
        let record = FrameRecord::new(Path::new("out/a.jpg"), 15.0, 16.0, "你好\nworld")
            .with_enhancement("better".to_string(), "info".to_string());
        let line = record.to_json_line().unwrap();

        assert!(!line.contains('\n'));
        assert!(line.contains("你好"));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        for key in ["image", "start", "end", "subtitle_orig", "subtitle_enhanced", "image_info"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(serde_json::from_str::<FrameRecord>(&line).unwrap(), record);
    }

    #[test]
    fn new_records_have_empty_enhancement() {
        let record = FrameRecord::new(Path::new("a.jpg"), 1.0, 2.0, "x");
        assert!(record.subtitle_enhanced.is_empty());
        assert!(record.image_info.is_empty());
    }
}
