use image::RgbImage;
use serde::{Deserialize, Serialize};
use tabula_core::BoundingBox;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("Image encode error: {0}")]
    ImageEncode(String),
    #[error("Recognition engine error: {0}")]
    Engine(String),
    #[error("Tesseract not available — build with `tesseract` feature")]
    NotAvailable,
}

/// One recognized token inside a text line: where it was found (when the
/// engine reports regions), what it read, and how certain it is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedSpan {
    pub bbox: Option<BoundingBox>,
    pub text: String,
    pub confidence: f32,
}

impl RecognizedSpan {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self { bbox: None, text: text.into(), confidence }
    }
}

/// A detected text line: an ordered sequence of recognized spans.
pub type RecognizedLine = Vec<RecognizedSpan>;

/// Engine instantiation parameters: language hint plus the detection
/// thresholds the engine applies before recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerOptions {
    pub language: String,
    pub detection_threshold: f32,
    pub box_threshold: f32,
}

impl Default for RecognizerOptions {
    fn default() -> Self {
        Self {
            language: "fra".to_string(),
            detection_threshold: 0.3,
            box_threshold: 0.5,
        }
    }
}

/// Abstraction over a text recognition engine.
///
/// Implementations accept an enhanced cell crop and return the detected
/// lines, each a sequence of (region, text, confidence) spans. A loaded
/// engine is safe for sequential reuse across cells and documents; callers
/// wanting parallel document throughput instantiate one per worker.
pub trait RecognitionBackend: Send + Sync {
    fn recognize(&self, crop: &RgbImage) -> Result<Vec<RecognizedLine>, RecognitionError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns the same preset lines for every crop — lets the table pipeline
/// be exercised without a recognition engine installed.
pub struct MockRecognizer {
    pub lines: Vec<RecognizedLine>,
}

impl MockRecognizer {
    pub fn new(lines: Vec<RecognizedLine>) -> Self {
        Self { lines }
    }

    /// Single line, single span, with the given confidence.
    pub fn with_text(text: impl Into<String>, confidence: f32) -> Self {
        Self::new(vec![vec![RecognizedSpan::new(text, confidence)]])
    }
}

impl RecognitionBackend for MockRecognizer {
    fn recognize(&self, _crop: &RgbImage) -> Result<Vec<RecognizedLine>, RecognitionError> {
        Ok(self.lines.clone())
    }
}

/// Pops one scripted response per call — for tests that need different
/// results (or failures) per cell. Returns no detections once exhausted.
pub struct ScriptedRecognizer {
    responses:
        std::sync::Mutex<std::collections::VecDeque<Result<Vec<RecognizedLine>, RecognitionError>>>,
}

impl ScriptedRecognizer {
    pub fn new(
        responses: impl IntoIterator<Item = Result<Vec<RecognizedLine>, RecognitionError>>,
    ) -> Self {
        Self { responses: std::sync::Mutex::new(responses.into_iter().collect()) }
    }
}

impl RecognitionBackend for ScriptedRecognizer {
    fn recognize(&self, _crop: &RgbImage) -> Result<Vec<RecognizedLine>, RecognitionError> {
        match self.responses.lock() {
            Ok(mut queue) => queue.pop_front().unwrap_or_else(|| Ok(Vec::new())),
            Err(_) => Err(RecognitionError::Engine("scripted recognizer poisoned".into())),
        }
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, RgbImage};
    use leptess::LepTess;

    use super::{
        RecognitionBackend, RecognitionError, RecognizedLine, RecognizedSpan, RecognizerOptions,
    };

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        options: RecognizerOptions,
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, options: RecognizerOptions) -> Self {
            Self { data_path, options }
        }
    }

    impl RecognitionBackend for TesseractRecognizer {
        fn recognize(&self, crop: &RgbImage) -> Result<Vec<RecognizedLine>, RecognitionError> {
            let mut png = Vec::new();
            DynamicImage::ImageRgb8(crop.clone())
                .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                .map_err(|e| RecognitionError::ImageEncode(e.to_string()))?;

            let mut lt = LepTess::new(self.data_path.as_deref(), &self.options.language)
                .map_err(|e| RecognitionError::Engine(e.to_string()))?;
            lt.set_image_from_mem(&png)
                .map_err(|e| RecognitionError::ImageEncode(e.to_string()))?;
            let text = lt
                .get_utf8_text()
                .map_err(|e| RecognitionError::Engine(e.to_string()))?;
            // Tesseract reports one confidence for the whole crop; each
            // non-empty output line becomes a single-span line.
            let confidence = lt.mean_text_conf() as f32 / 100.0;

            Ok(text
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|l| vec![RecognizedSpan::new(l.trim(), confidence)])
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crop() -> RgbImage {
        RgbImage::new(4, 4)
    }

    #[test]
    fn mock_returns_preset_lines() {
        let r = MockRecognizer::with_text("PRIME 120,50", 0.93);
        let lines = r.recognize(&crop()).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0][0].text, "PRIME 120,50");
        assert_eq!(lines[0][0].confidence, 0.93);
    }

    #[test]
    fn mock_ignores_crop_content() {
        let r = MockRecognizer::with_text("hello", 0.8);
        assert_eq!(
            r.recognize(&crop()).unwrap(),
            r.recognize(&RgbImage::new(1, 1)).unwrap()
        );
    }

    #[test]
    fn scripted_pops_in_order_then_goes_silent() {
        let r = ScriptedRecognizer::new([
            Ok(vec![vec![RecognizedSpan::new("a", 0.9)]]),
            Err(RecognitionError::Engine("boom".into())),
        ]);
        assert_eq!(r.recognize(&crop()).unwrap()[0][0].text, "a");
        assert!(r.recognize(&crop()).is_err());
        assert!(r.recognize(&crop()).unwrap().is_empty());
    }

    #[test]
    fn default_options_carry_language_and_thresholds() {
        let opts = RecognizerOptions::default();
        assert_eq!(opts.language, "fra");
        assert_eq!(opts.detection_threshold, 0.3);
        assert_eq!(opts.box_threshold, 0.5);
    }
}
