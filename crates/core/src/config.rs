use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Dilation kernel dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSize {
    pub width: u32,
    pub height: u32,
}

impl KernelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Local contrast enhancement parameters for the cell preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaheParams {
    /// Histogram clip limit as a multiple of the uniform bin height.
    pub clip_limit: f32,
    /// Tiles per axis (8 gives the usual 8×8 grid).
    pub tile_grid: u32,
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self { clip_limit: 3.0, tile_grid: 8 }
    }
}

/// Tuning knobs for the table recovery engine.
///
/// Defaults are the fixed constants the algorithm was calibrated with.
/// There is no automatic tuning: callers needing different trade-offs
/// (under-merging splits cells, over-merging spans rows) adjust these
/// per document family, typically from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// First dilation pass: wide-short kernel bridging inter-character and
    /// inter-word gaps within a line without bridging across rows.
    pub gap_kernel: KernelSize,
    pub gap_iterations: u32,
    /// Second dilation pass: square kernel consolidating merged blocks.
    pub block_kernel: KernelSize,
    pub block_iterations: u32,

    /// Boxes with width or height at or below these are discarded as noise.
    pub min_box_width: u32,
    pub min_box_height: u32,

    /// Maximum |y - anchor_y| for a box to join the current row.
    pub row_tolerance: u32,

    /// Upward shift applied when cropping a cell from the original image,
    /// compensating for the contour boundary sitting below true glyph tops.
    pub crop_top_offset: u32,

    /// Recognized spans at or below this confidence are discarded.
    pub confidence_floor: f32,

    pub clahe: ClaheParams,
    /// Median-filter radius for the post-enhancement denoise pass.
    pub denoise_radius: u32,

    /// When set, intermediate images (dilated, contour overlay, box overlay)
    /// are written here. Purely observational.
    pub diagnostics_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gap_kernel: KernelSize::new(10, 2),
            gap_iterations: 2,
            block_kernel: KernelSize::new(5, 5),
            block_iterations: 2,
            min_box_width: 10,
            min_box_height: 10,
            row_tolerance: 20,
            crop_top_offset: 5,
            confidence_floor: 0.5,
            clahe: ClaheParams::default(),
            denoise_radius: 1,
            diagnostics_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_calibration() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.gap_kernel, KernelSize::new(10, 2));
        assert_eq!(cfg.block_kernel, KernelSize::new(5, 5));
        assert_eq!(cfg.gap_iterations, 2);
        assert_eq!(cfg.row_tolerance, 20);
        assert_eq!(cfg.min_box_width, 10);
        assert_eq!(cfg.crop_top_offset, 5);
        assert_eq!(cfg.confidence_floor, 0.5);
    }

    #[test]
    fn partial_toml_overrides_keep_defaults() {
        let cfg = EngineConfig::from_toml_str(
            r#"
            row_tolerance = 28
            confidence_floor = 0.6

            [gap_kernel]
            width = 14
            height = 3
            "#,
        )
        .unwrap();
        assert_eq!(cfg.row_tolerance, 28);
        assert_eq!(cfg.confidence_floor, 0.6);
        assert_eq!(cfg.gap_kernel, KernelSize::new(14, 3));
        // Untouched knobs fall back to defaults.
        assert_eq!(cfg.block_kernel, KernelSize::new(5, 5));
        assert_eq!(cfg.crop_top_offset, 5);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(EngineConfig::from_toml_str("row_tolerence = 20").is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = EngineConfig { row_tolerance: 25, ..Default::default() };
        let serialized = toml::to_string(&cfg).unwrap();
        let back = EngineConfig::from_toml_str(&serialized).unwrap();
        assert_eq!(back, cfg);
    }
}
