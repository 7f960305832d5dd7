use std::path::Path;

use csv::{QuoteStyle, WriterBuilder};
use tabula_core::Table;

use crate::ExportError;

/// Replace commas with spaces and trim, so a naive comma split of the
/// serialized line recovers the cells without any escaping.
pub fn sanitize_cell(text: &str) -> String {
    text.trim().replace(',', " ")
}

/// The rows that actually serialize: empty-after-trim cells are dropped,
/// and rows with no surviving cells are skipped entirely. Both output
/// formats share this policy; the assembler itself never drops rows.
fn serializable_rows(table: &Table) -> Vec<Vec<String>> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let cells: Vec<String> = row
                .iter()
                .filter(|c| c.has_text())
                .map(|c| sanitize_cell(&c.text))
                .collect();
            if cells.is_empty() {
                None
            } else {
                Some(cells)
            }
        })
        .collect()
}

/// Render the table as CSV: one line per surviving row, cells comma-joined.
///
/// Quoting is disabled — sanitization already removed every comma, so the
/// output is exactly the join and splits back losslessly.
pub fn render_csv(table: &Table) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quote_style(QuoteStyle::Never)
        .from_writer(Vec::new());
    for row in serializable_rows(table) {
        writer.write_record(&row)?;
    }
    let bytes = writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn write_csv(table: &Table, path: &Path) -> Result<(), ExportError> {
    let rendered = render_csv(table)?;
    std::fs::write(path, rendered)?;
    tracing::debug!(path = %path.display(), rows = table.row_count(), "wrote CSV output");
    Ok(())
}
