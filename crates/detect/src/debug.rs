use std::path::PathBuf;

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use tabula_core::BoundingBox;

const OVERLAY_GREEN: Rgb<u8> = Rgb([0, 255, 0]);

/// Writes intermediate pipeline images to a diagnostics directory.
///
/// Purely observational: nothing reads the images back, and every failure
/// is logged and swallowed so diagnostics can never fail a document.
#[derive(Debug, Clone)]
pub struct DebugSink {
    dir: PathBuf,
}

impl DebugSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write_gray(&self, name: &str, image: &GrayImage) {
        self.save(name, &DynamicImage::ImageLuma8(image.clone()));
    }

    /// Plot contour border points in green over a grayscale base.
    pub fn write_contour_overlay(&self, name: &str, base: &GrayImage, points: &[(u32, u32)]) {
        let mut canvas = DynamicImage::ImageLuma8(base.clone()).to_rgb8();
        let (w, h) = canvas.dimensions();
        for &(x, y) in points {
            if x < w && y < h {
                canvas.put_pixel(x, y, OVERLAY_GREEN);
            }
        }
        self.save(name, &DynamicImage::ImageRgb8(canvas));
    }

    /// Draw hollow rectangles for each box over a copy of the base image.
    pub fn write_box_overlay(&self, name: &str, base: &RgbImage, boxes: &[BoundingBox]) {
        let mut canvas = base.clone();
        for b in boxes {
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(b.x as i32, b.y as i32).of_size(b.width.max(1), b.height.max(1)),
                OVERLAY_GREEN,
            );
        }
        self.save(name, &DynamicImage::ImageRgb8(canvas));
    }

    fn save(&self, name: &str, image: &DynamicImage) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            tracing::warn!(dir = %self.dir.display(), error = %e, "diagnostics dir unavailable");
            return;
        }
        let path = self.dir.join(name);
        if let Err(e) = image.save(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to write diagnostic image");
        }
    }
}
