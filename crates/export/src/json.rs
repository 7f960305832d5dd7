use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tabula_core::Table;

use crate::ExportError;

/// Binds one semantic output field to a table position.
///
/// `field` may be a dotted path ("assure.adresse"), which nests the value
/// inside the output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    pub field: String,
    pub row: usize,
    pub col: usize,
}

/// Caller-supplied mapping from table positions to named semantic fields.
///
/// The mapping addresses the assembler's table directly (no rows are
/// dropped before it applies); positions that are out of range or hold an
/// empty cell default the field to "".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub fields: Vec<FieldBinding>,
}

impl FieldMapping {
    pub fn bind(mut self, field: impl Into<String>, row: usize, col: usize) -> Self {
        self.fields.push(FieldBinding { field: field.into(), row, col });
        self
    }

    /// One binding per fixed-layout region: region i is row i, column 0.
    pub fn for_named_regions<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let fields = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| FieldBinding { field: name.to_string(), row: i, col: 0 })
            .collect();
        Self { fields }
    }
}

/// The JSON output artifact: a list of per-document records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSet {
    pub documents: Vec<Map<String, Value>>,
}

impl DocumentSet {
    pub fn push_record(&mut self, record: Map<String, Value>) {
        self.documents.push(record);
    }
}

/// Build one document record from a table: every bound field is populated
/// from its table position, defaulting to "" when the position is out of
/// range or empty. The full schema is emitted even for an empty table.
pub fn build_record(table: &Table, mapping: &FieldMapping) -> Map<String, Value> {
    let mut record = Map::new();
    for binding in &mapping.fields {
        let text = table.text_at(binding.row, binding.col);
        insert_path(&mut record, &binding.field, Value::String(text.to_string()));
    }
    record
}

/// Insert a value at a dotted path, creating intermediate objects. A
/// non-object in the way is replaced.
fn insert_path(record: &mut Map<String, Value>, path: &str, value: Value) {
    let mut parts = path.split('.').peekable();
    let mut current = record;
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            current.insert(part.to_string(), value);
            return;
        }
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry.as_object_mut() {
            Some(obj) => obj,
            None => return,
        };
    }
}

pub fn render_json(set: &DocumentSet) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(set)?)
}

pub fn write_json(set: &DocumentSet, path: &Path) -> Result<(), ExportError> {
    let rendered = render_json(set)?;
    std::fs::write(path, rendered)?;
    tracing::debug!(path = %path.display(), documents = set.documents.len(), "wrote JSON output");
    Ok(())
}
