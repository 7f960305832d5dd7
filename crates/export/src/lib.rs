pub mod csv;
pub mod json;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV write error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),
}

pub use crate::csv::{render_csv, sanitize_cell, write_csv};
pub use crate::json::{
    build_record, render_json, write_json, DocumentSet, FieldBinding, FieldMapping,
};
