pub mod engine;
pub mod outputs;

pub use engine::{EngineError, TableEngine};
pub use outputs::{write_outputs, ExportReport, OutputPaths};
