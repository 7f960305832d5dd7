use image::{GrayImage, RgbImage};
use thiserror::Error;

use tabula_core::{BoundingBox, Cell, EngineConfig, Table};
use tabula_detect::{CellLocator, DebugSink};
use tabula_ocr::{dispatch, enhance, RecognitionBackend};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(
        "binary image is {binary_w}x{binary_h} but original is {original_w}x{original_h}; \
         the rectification stage must supply pixel-aligned images"
    )]
    DimensionMismatch {
        binary_w: u32,
        binary_h: u32,
        original_w: u32,
        original_h: u32,
    },
}

/// The table recovery engine: locate → enhance → recognize → assemble.
///
/// The locator and the recognition backend are injected; the engine owns
/// every intermediate structure only for the duration of one
/// `recover_table` call. Processing is synchronous and strictly sequential
/// — each stage fully consumes its input before the next begins.
pub struct TableEngine<L: CellLocator, R: RecognitionBackend> {
    locator: L,
    recognizer: R,
    config: EngineConfig,
    diagnostics: Option<DebugSink>,
}

impl<L: CellLocator, R: RecognitionBackend> TableEngine<L, R> {
    pub fn new(locator: L, recognizer: R, config: EngineConfig) -> Self {
        let diagnostics = config.diagnostics_dir.as_ref().map(DebugSink::new);
        Self { locator, recognizer, config, diagnostics }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recover the table of one document.
    ///
    /// `binary` drives geometry detection; `original` is the high-fidelity
    /// source the cells are cropped from. An unreadable document degrades
    /// to an empty or partially empty table — only misaligned inputs are
    /// an error.
    pub fn recover_table(
        &self,
        binary: &GrayImage,
        original: &RgbImage,
    ) -> Result<Table, EngineError> {
        if binary.dimensions() != original.dimensions() {
            let (binary_w, binary_h) = binary.dimensions();
            let (original_w, original_h) = original.dimensions();
            return Err(EngineError::DimensionMismatch {
                binary_w,
                binary_h,
                original_w,
                original_h,
            });
        }

        // 1. Locate candidate cell boxes, grouped into rows.
        let rows = self.locator.locate(binary);
        tracing::debug!(rows = rows.len(), "located candidate rows");

        if let Some(sink) = &self.diagnostics {
            let boxes: Vec<BoundingBox> =
                rows.iter().flat_map(|r| r.boxes.iter().copied()).collect();
            sink.write_box_overlay("2_boxes.png", original, &boxes);
        }

        // 2. Enhance and recognize each cell, row by row, left to right.
        let mut table = Table::default();
        for row in rows {
            let mut cells = Vec::with_capacity(row.len());
            for bbox in row.boxes {
                let cell = match enhance::prepare_cell(original, &bbox, &self.config) {
                    Some(crop) => dispatch::read_cell(
                        &self.recognizer,
                        bbox,
                        &crop,
                        self.config.confidence_floor,
                    ),
                    None => Cell::empty(bbox),
                };
                cells.push(cell);
            }
            table.rows.push(cells);
        }

        tracing::info!(
            rows = table.row_count(),
            cells = table.cell_count(),
            "table recovered"
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_detect::{FixedLayout, GridLocator, NamedRegion};
    use tabula_ocr::{MockRecognizer, RecognitionError, RecognizedSpan, ScriptedRecognizer};

    fn blob(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, image::Luma([255]));
            }
        }
    }

    /// Binary page with two cells on the first line and one below.
    fn sample_page() -> (GrayImage, RgbImage) {
        let mut binary = GrayImage::new(240, 120);
        blob(&mut binary, 20, 20, 30, 12);
        blob(&mut binary, 120, 22, 30, 12);
        blob(&mut binary, 20, 80, 30, 12);
        let original = RgbImage::from_pixel(240, 120, image::Rgb([255, 255, 255]));
        (binary, original)
    }

    fn ok_line(text: &str) -> Result<Vec<Vec<RecognizedSpan>>, RecognitionError> {
        Ok(vec![vec![RecognizedSpan::new(text, 0.9)]])
    }

    #[test]
    fn recovers_rows_and_dispatch_order_is_row_major() {
        let (binary, original) = sample_page();
        let engine = TableEngine::new(
            GridLocator::new(EngineConfig::default()),
            ScriptedRecognizer::new([ok_line("A"), ok_line("B"), ok_line("C")]),
            EngineConfig::default(),
        );
        let table = engine.recover_table(&binary, &original).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows[0].len(), 2);
        assert_eq!(table.rows[1].len(), 1);
        // Cells dispatch left to right, top to bottom.
        assert_eq!(table.text_at(0, 0), "A");
        assert_eq!(table.text_at(0, 1), "B");
        assert_eq!(table.text_at(1, 0), "C");
    }

    #[test]
    fn failing_cell_leaves_siblings_intact() {
        let (binary, original) = sample_page();
        let engine = TableEngine::new(
            GridLocator::new(EngineConfig::default()),
            ScriptedRecognizer::new([
                ok_line("A"),
                Err(RecognitionError::Engine("crash on crop".into())),
                ok_line("C"),
            ]),
            EngineConfig::default(),
        );
        let table = engine.recover_table(&binary, &original).unwrap();
        assert_eq!(table.text_at(0, 0), "A");
        assert_eq!(table.text_at(0, 1), "");
        assert_eq!(table.text_at(1, 0), "C");
    }

    #[test]
    fn blank_page_yields_empty_table() {
        let binary = GrayImage::new(100, 100);
        let original = RgbImage::new(100, 100);
        let engine = TableEngine::new(
            GridLocator::new(EngineConfig::default()),
            MockRecognizer::with_text("never called", 0.9),
            EngineConfig::default(),
        );
        let table = engine.recover_table(&binary, &original).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let binary = GrayImage::new(100, 100);
        let original = RgbImage::new(100, 101);
        let engine = TableEngine::new(
            GridLocator::new(EngineConfig::default()),
            MockRecognizer::with_text("x", 0.9),
            EngineConfig::default(),
        );
        assert!(matches!(
            engine.recover_table(&binary, &original),
            Err(EngineError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn fixed_layout_feeds_the_same_chain() {
        let binary = GrayImage::new(200, 100);
        let original = RgbImage::from_pixel(200, 100, image::Rgb([255, 255, 255]));
        let layout = FixedLayout::new(vec![
            NamedRegion::new("assurance", BoundingBox::new(10, 10, 60, 20)),
            NamedRegion::new("prime", BoundingBox::new(100, 50, 60, 20)),
        ]);
        let engine = TableEngine::new(
            layout,
            ScriptedRecognizer::new([ok_line("AXA"), ok_line("120.50")]),
            EngineConfig::default(),
        );
        let table = engine.recover_table(&binary, &original).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.text_at(0, 0), "AXA");
        assert_eq!(table.text_at(1, 0), "120.50");
    }

    #[test]
    fn sub_floor_detections_produce_empty_cells() {
        let (binary, original) = sample_page();
        let engine = TableEngine::new(
            GridLocator::new(EngineConfig::default()),
            MockRecognizer::with_text("ghost", 0.4),
            EngineConfig::default(),
        );
        let table = engine.recover_table(&binary, &original).unwrap();
        assert_eq!(table.row_count(), 2);
        assert!(table.rows.iter().flatten().all(|c| !c.has_text()));
    }

    #[test]
    fn diagnostics_write_box_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let (binary, original) = sample_page();
        let config = EngineConfig {
            diagnostics_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let engine = TableEngine::new(
            GridLocator::new(config.clone()),
            MockRecognizer::with_text("x", 0.9),
            config,
        );
        engine.recover_table(&binary, &original).unwrap();
        assert!(dir.path().join("0_dilated.png").exists());
        assert!(dir.path().join("1_contours.png").exists());
        assert!(dir.path().join("2_boxes.png").exists());
    }
}
