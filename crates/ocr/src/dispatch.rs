use image::RgbImage;
use tabula_core::{BoundingBox, Cell};

use crate::recognizer::RecognitionBackend;

/// Recognize one enhanced cell crop and reduce the detections to a `Cell`.
///
/// Spans at or below `confidence_floor` are discarded; the survivors are
/// concatenated with single spaces and trimmed. The cell confidence is the
/// mean of the kept spans. Engine failures are logged and become an empty
/// cell — they never propagate and never abort the table.
pub fn read_cell<R: RecognitionBackend>(
    backend: &R,
    bbox: BoundingBox,
    crop: &RgbImage,
    confidence_floor: f32,
) -> Cell {
    let lines = match backend.recognize(crop) {
        Ok(lines) => lines,
        Err(e) => {
            tracing::warn!(x = bbox.x, y = bbox.y, error = %e, "recognition failed, cell left empty");
            return Cell::empty(bbox);
        }
    };

    let mut texts = Vec::new();
    let mut confidence_sum = 0.0f32;
    for span in lines.iter().flatten() {
        if span.confidence > confidence_floor {
            texts.push(span.text.as_str());
            confidence_sum += span.confidence;
        }
    }

    if texts.is_empty() {
        return Cell::empty(bbox);
    }

    let confidence = confidence_sum / texts.len() as f32;
    let text = texts.join(" ").trim().to_string();
    Cell { bbox, text, confidence }
}
