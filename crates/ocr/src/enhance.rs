use image::{imageops, RgbImage};
use imageproc::filter::median_filter;
use tabula_core::{BoundingBox, ClaheParams, EngineConfig};

/// Crop a cell from the original-resolution image.
///
/// The window is shifted upward by `top_offset` (the contour boundary sits
/// systematically a few pixels below true glyph tops) while keeping the
/// box's height, then clamped to the image bounds. Returns `None` when the
/// clamped window has no area.
pub fn crop_cell(original: &RgbImage, bbox: &BoundingBox, top_offset: u32) -> Option<RgbImage> {
    let (img_w, img_h) = original.dimensions();
    let x = bbox.x.min(img_w);
    let y = bbox.y.saturating_sub(top_offset).min(img_h);
    let width = bbox.width.min(img_w - x);
    let height = bbox.height.min(img_h - y);
    if width == 0 || height == 0 {
        return None;
    }
    Some(imageops::crop_imm(original, x, y, width, height).to_image())
}

/// Enhance a cell crop for recognition: local contrast equalization on the
/// luminance channel only, then an edge-preserving denoise.
///
/// The crop is converted to YCbCr, CLAHE is applied to the Y plane while
/// Cb/Cr pass through untouched, the planes recombine back to RGB, and a
/// median filter removes photographic grain without softening glyph edges.
pub fn enhance_cell(crop: &RgbImage, clahe_params: &ClaheParams, denoise_radius: u32) -> RgbImage {
    let (w, h) = crop.dimensions();
    let n = (w as usize) * (h as usize);

    let mut luma = vec![0u8; n];
    let mut cb = vec![0.0f32; n];
    let mut cr = vec![0.0f32; n];
    for (i, pixel) in crop.pixels().enumerate() {
        let [r, g, b] = pixel.0;
        let (y, pb, pr) = rgb_to_ycbcr(r, g, b);
        luma[i] = y;
        cb[i] = pb;
        cr[i] = pr;
    }

    let equalized = clahe(&luma, w, h, clahe_params);

    let mut enhanced = RgbImage::new(w, h);
    for (i, pixel) in enhanced.pixels_mut().enumerate() {
        let (r, g, b) = ycbcr_to_rgb(equalized[i], cb[i], cr[i]);
        pixel.0 = [r, g, b];
    }

    if denoise_radius == 0 {
        enhanced
    } else {
        median_filter(&enhanced, denoise_radius, denoise_radius)
    }
}

/// Crop and enhance in one step, with constants from the engine config.
pub fn prepare_cell(
    original: &RgbImage,
    bbox: &BoundingBox,
    config: &EngineConfig,
) -> Option<RgbImage> {
    let crop = crop_cell(original, bbox, config.crop_top_offset)?;
    Some(enhance_cell(&crop, &config.clahe, config.denoise_radius))
}

// ── YCbCr conversion (BT.601 full range) ─────────────────────────────────────

fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (u8, f32, f32) {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
    let cr = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
    (y.round().clamp(0.0, 255.0) as u8, cb, cr)
}

fn ycbcr_to_rgb(y: u8, cb: f32, cr: f32) -> (u8, u8, u8) {
    let y = y as f32;
    let r = y + 1.402 * (cr - 128.0);
    let g = y - 0.344_136 * (cb - 128.0) - 0.714_136 * (cr - 128.0);
    let b = y + 1.772 * (cb - 128.0);
    (
        r.round().clamp(0.0, 255.0) as u8,
        g.round().clamp(0.0, 255.0) as u8,
        b.round().clamp(0.0, 255.0) as u8,
    )
}

// ── Contrast-limited adaptive histogram equalization ─────────────────────────

/// CLAHE over a grayscale plane.
///
/// The plane is divided into a `tile_grid` × `tile_grid` grid; each tile
/// gets a clipped-histogram equalization mapping, and every pixel blends
/// the mappings of its four nearest tile centers bilinearly. The clip limit
/// is a multiple of the uniform bin height; clipped mass is redistributed
/// evenly across all bins.
pub(crate) fn clahe(plane: &[u8], width: u32, height: u32, params: &ClaheParams) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 {
        return Vec::new();
    }

    // Degenerate grids collapse to at most one tile per axis per pixel.
    let tiles_x = (params.tile_grid.max(1) as usize).min(w);
    let tiles_y = (params.tile_grid.max(1) as usize).min(h);
    let tile_w = w.div_ceil(tiles_x);
    let tile_h = h.div_ceil(tiles_y);

    // Per-tile equalization lookup tables.
    let mut luts = vec![[0u8; 256]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(w);
            let y1 = (y0 + tile_h).min(h);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[plane[y * w + x] as usize] += 1;
                }
            }
            let count = ((x1 - x0) * (y1 - y0)) as u32;
            clip_histogram(&mut hist, count, params.clip_limit);

            let lut = &mut luts[ty * tiles_x + tx];
            let mut cdf = 0u64;
            for (v, entry) in lut.iter_mut().enumerate() {
                cdf += hist[v] as u64;
                *entry = ((cdf * 255) / count.max(1) as u64) as u8;
            }
        }
    }

    // Bilinear blend between the four surrounding tile mappings.
    let mut out = vec![0u8; w * h];
    for y in 0..h {
        let gy = (y as f32 - tile_h as f32 / 2.0) / tile_h as f32;
        let ty0 = (gy.floor().max(0.0) as usize).min(tiles_y - 1);
        let ty1 = (ty0 + 1).min(tiles_y - 1);
        let fy = (gy - gy.floor()).clamp(0.0, 1.0);
        let fy = if gy < 0.0 { 0.0 } else { fy };

        for x in 0..w {
            let gx = (x as f32 - tile_w as f32 / 2.0) / tile_w as f32;
            let tx0 = (gx.floor().max(0.0) as usize).min(tiles_x - 1);
            let tx1 = (tx0 + 1).min(tiles_x - 1);
            let fx = (gx - gx.floor()).clamp(0.0, 1.0);
            let fx = if gx < 0.0 { 0.0 } else { fx };

            let v = plane[y * w + x] as usize;
            let tl = luts[ty0 * tiles_x + tx0][v] as f32;
            let tr = luts[ty0 * tiles_x + tx1][v] as f32;
            let bl = luts[ty1 * tiles_x + tx0][v] as f32;
            let br = luts[ty1 * tiles_x + tx1][v] as f32;

            let top = tl + (tr - tl) * fx;
            let bottom = bl + (br - bl) * fx;
            out[y * w + x] = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Clip histogram bins at `clip_limit` times the uniform bin height and
/// spread the excess evenly over all bins.
fn clip_histogram(hist: &mut [u32; 256], count: u32, clip_limit: f32) {
    if clip_limit <= 0.0 {
        return;
    }
    let limit = ((clip_limit * count as f32 / 256.0).ceil() as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }
    // Spread the clipped mass evenly: a uniform share to every bin, the
    // residual stepped across the range so no value band is favored.
    let share = excess / 256;
    for bin in hist.iter_mut() {
        *bin += share;
    }
    let residual = (excess % 256) as usize;
    if residual > 0 {
        let step = (256 / residual).max(1);
        for i in (0..256).step_by(step).take(residual) {
            hist[i] += 1;
        }
    }
}
