use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// A row of bounding boxes sharing approximately the same y-origin.
///
/// `anchor_y` is the y of the row's *seed* box — the first box assigned to
/// the row — not a running mean. Later members may sit up to the clustering
/// tolerance away from the seed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub anchor_y: u32,
    pub boxes: Vec<BoundingBox>,
}

impl Row {
    /// Start a row from its seed box.
    pub fn seeded(seed: BoundingBox) -> Self {
        Self { anchor_y: seed.y, boxes: vec![seed] }
    }

    pub fn push(&mut self, bbox: BoundingBox) {
        self.boxes.push(bbox);
    }

    /// Order members left to right. Stable, so equal-x boxes keep
    /// their arrival order.
    pub fn sort_by_x(&mut self) {
        self.boxes.sort_by_key(|b| b.x);
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// A located box paired with its recognized text and confidence.
///
/// `text` is the dispatcher output: above-floor spans joined with single
/// spaces, trimmed — possibly empty. `confidence` is the mean confidence of
/// the spans that contributed, 0.0 when none survived the floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub bbox: BoundingBox,
    pub text: String,
    pub confidence: f32,
}

impl Cell {
    pub fn empty(bbox: BoundingBox) -> Self {
        Self { bbox, text: String::new(), confidence: 0.0 }
    }

    /// Whether any text survives trimming.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// The assembled table: rows in ascending anchor-y order, cells in
/// ascending x order within each row.
///
/// The assembler keeps every located row, including rows whose cells all
/// came back empty; dropping those is the serialization layer's job so both
/// output formats apply the same policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// Look up a cell's trimmed text by position. Empty string when the
    /// position is out of range or the cell has no text.
    pub fn text_at(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|c| c.text.trim())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: u32, y: u32) -> BoundingBox {
        BoundingBox::new(x, y, 40, 15)
    }

    #[test]
    fn seeded_row_takes_anchor_from_seed() {
        let row = Row::seeded(bbox(60, 12));
        assert_eq!(row.anchor_y, 12);
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn sort_by_x_orders_members() {
        let mut row = Row::seeded(bbox(60, 10));
        row.push(bbox(10, 12));
        row.push(bbox(110, 11));
        row.sort_by_x();
        let xs: Vec<u32> = row.boxes.iter().map(|b| b.x).collect();
        assert_eq!(xs, vec![10, 60, 110]);
    }

    #[test]
    fn cell_has_text_ignores_whitespace() {
        let mut cell = Cell::empty(bbox(0, 0));
        assert!(!cell.has_text());
        cell.text = "   ".into();
        assert!(!cell.has_text());
        cell.text = " prime ".into();
        assert!(cell.has_text());
    }

    #[test]
    fn text_at_out_of_range_is_empty() {
        let table = Table {
            rows: vec![vec![Cell { bbox: bbox(0, 0), text: " 120,50 ".into(), confidence: 0.9 }]],
        };
        assert_eq!(table.text_at(0, 0), "120,50");
        assert_eq!(table.text_at(0, 1), "");
        assert_eq!(table.text_at(3, 0), "");
    }
}
