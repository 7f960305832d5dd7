use image::GrayImage;
use serde::{Deserialize, Serialize};
use tabula_core::{BoundingBox, EngineConfig, Row};

use crate::amplify::amplify;
use crate::cluster::cluster_rows;
use crate::debug::DebugSink;
use crate::extract::{contours_to_boxes, detect_contours};

/// Produces the rows of candidate cell boxes for one document.
///
/// Two strategies exist: geometric clustering over the binarized image
/// (`GridLocator`) and a caller-configured static layout (`FixedLayout`).
/// Both feed the same enhance → recognize → assemble chain downstream.
pub trait CellLocator {
    fn locate(&self, binary: &GrayImage) -> Vec<Row>;
}

/// Recovers rows from pixel geometry: amplify → extract → cluster.
pub struct GridLocator {
    config: EngineConfig,
    diagnostics: Option<DebugSink>,
}

impl GridLocator {
    pub fn new(config: EngineConfig) -> Self {
        let diagnostics = config.diagnostics_dir.as_ref().map(DebugSink::new);
        Self { config, diagnostics }
    }
}

impl CellLocator for GridLocator {
    fn locate(&self, binary: &GrayImage) -> Vec<Row> {
        let dilated = amplify(binary, &self.config);
        if let Some(sink) = &self.diagnostics {
            sink.write_gray("0_dilated.png", &dilated);
        }

        let contours = detect_contours(&dilated);
        if let Some(sink) = &self.diagnostics {
            let points: Vec<(u32, u32)> = contours
                .iter()
                .flat_map(|c| c.points.iter().map(|p| (p.x, p.y)))
                .collect();
            sink.write_contour_overlay("1_contours.png", &dilated, &points);
        }

        let boxes = contours_to_boxes(
            &contours,
            self.config.min_box_width,
            self.config.min_box_height,
        );
        tracing::debug!(
            contours = contours.len(),
            boxes = boxes.len(),
            "grid locator extracted regions"
        );

        cluster_rows(boxes, self.config.row_tolerance)
    }
}

/// A named region of a known document layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRegion {
    pub name: String,
    pub bbox: BoundingBox,
}

impl NamedRegion {
    pub fn new(name: impl Into<String>, bbox: BoundingBox) -> Self {
        Self { name: name.into(), bbox }
    }
}

/// Emits caller-configured regions instead of detecting them.
///
/// Each region becomes a single-box row, in configuration order, so a
/// layout's fields map 1:1 onto table rows. Field names are exposed for
/// binding to output records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedLayout {
    pub regions: Vec<NamedRegion>,
}

impl FixedLayout {
    pub fn new(regions: Vec<NamedRegion>) -> Self {
        Self { regions }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(|r| r.name.as_str())
    }
}

impl CellLocator for FixedLayout {
    fn locate(&self, _binary: &GrayImage) -> Vec<Row> {
        self.regions.iter().map(|r| Row::seeded(r.bbox)).collect()
    }
}
