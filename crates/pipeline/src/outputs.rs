use std::path::{Path, PathBuf};

use tabula_core::Table;
use tabula_export::{build_record, write_csv, write_json, DocumentSet, ExportError, FieldMapping};

/// Destinations for the two output artifacts.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub csv: PathBuf,
    pub json: PathBuf,
}

impl OutputPaths {
    /// `<dir>/output.csv` and `<dir>/output.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self { csv: dir.join("output.csv"), json: dir.join("output.json") }
    }
}

/// Per-format outcome of writing the output artifacts.
///
/// A failure in one format never suppresses the other: each field carries
/// its own result so callers keep whatever partial progress succeeded.
#[derive(Debug)]
pub struct ExportReport {
    pub csv: Result<PathBuf, ExportError>,
    pub json: Result<PathBuf, ExportError>,
}

impl ExportReport {
    pub fn fully_succeeded(&self) -> bool {
        self.csv.is_ok() && self.json.is_ok()
    }
}

/// Write both output artifacts for one recovered table.
///
/// The JSON artifact wraps a single document record built from the
/// caller-supplied field mapping. Failures are logged and reported, never
/// raised.
pub fn write_outputs(table: &Table, mapping: &FieldMapping, paths: &OutputPaths) -> ExportReport {
    let csv = write_csv(table, &paths.csv).map(|()| paths.csv.clone());
    if let Err(e) = &csv {
        tracing::warn!(path = %paths.csv.display(), error = %e, "CSV export failed");
    }

    let mut set = DocumentSet::default();
    set.push_record(build_record(table, mapping));
    let json = write_json(&set, &paths.json).map(|()| paths.json.clone());
    if let Err(e) = &json {
        tracing::warn!(path = %paths.json.display(), error = %e, "JSON export failed");
    }

    ExportReport { csv, json }
}
