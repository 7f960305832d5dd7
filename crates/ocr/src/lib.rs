pub mod dispatch;
pub mod enhance;
pub mod recognizer;

pub use dispatch::read_cell;
pub use enhance::{crop_cell, enhance_cell, prepare_cell};
pub use recognizer::{
    MockRecognizer, RecognitionBackend, RecognitionError, RecognizedLine, RecognizedSpan,
    RecognizerOptions, ScriptedRecognizer,
};
