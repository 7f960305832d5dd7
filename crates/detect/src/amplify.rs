use image::GrayImage;
use tabula_core::{EngineConfig, KernelSize};

/// Merge adjacent glyphs and words into coherent text blobs.
///
/// Two sequential dilation passes: a wide-short kernel bridges
/// inter-character and inter-word gaps within a line without bridging
/// across table rows, then a larger square kernel consolidates merged
/// multi-line blocks. Each pass runs for its configured iteration count.
pub fn amplify(binary: &GrayImage, config: &EngineConfig) -> GrayImage {
    let merged = dilate_repeated(binary, config.gap_kernel, config.gap_iterations);
    let consolidated = dilate_repeated(&merged, config.block_kernel, config.block_iterations);
    tracing::trace!(
        gap_kernel = ?config.gap_kernel,
        block_kernel = ?config.block_kernel,
        "amplified text regions"
    );
    consolidated
}

/// Apply a rectangular binary dilation `iterations` times.
pub fn dilate_repeated(binary: &GrayImage, kernel: KernelSize, iterations: u32) -> GrayImage {
    let mut current = binary.clone();
    for _ in 0..iterations {
        current = dilate_rect(&current, kernel);
    }
    current
}

/// Binary dilation with a rectangular kernel, as two separable
/// sliding-window passes. Any foreground pixel (> 0) in the window sets
/// the output pixel to 255.
pub fn dilate_rect(binary: &GrayImage, kernel: KernelSize) -> GrayImage {
    let (width, height) = binary.dimensions();
    let w = width as usize;
    let h = height as usize;
    let n = w * h;
    if n == 0 {
        return binary.clone();
    }

    let mut horizontal = vec![0u8; n];
    dilate_horizontal(binary.as_raw(), &mut horizontal, w, h, kernel.width as usize);

    let mut vertical = vec![0u8; n];
    dilate_vertical(&horizontal, &mut vertical, w, h, kernel.height as usize);

    GrayImage::from_raw(width, height, vertical).expect("dilated buffer matches dimensions")
}

/// Separable horizontal binary dilation (sliding window maximum).
///
/// For a kernel of width `kernel_w`, each output pixel is 255 if any input
/// pixel in the horizontal window `[x - r_left, x + r_right]` is > 0.
fn dilate_horizontal(input: &[u8], output: &mut [u8], w: usize, h: usize, kernel_w: usize) {
    if kernel_w <= 1 {
        output.copy_from_slice(input);
        return;
    }
    let r_left = (kernel_w - 1) / 2;
    let r_right = kernel_w / 2;

    for y in 0..h {
        let row = y * w;
        let mut count = 0usize;

        for x in 0..=r_right.min(w - 1) {
            if input[row + x] > 0 {
                count += 1;
            }
        }

        for x in 0..w {
            output[row + x] = if count > 0 { 255 } else { 0 };

            let enter = x + r_right + 1;
            if enter < w && input[row + enter] > 0 {
                count += 1;
            }

            if x >= r_left && input[row + x - r_left] > 0 {
                count -= 1;
            }
        }
    }
}

/// Separable vertical binary dilation (sliding window maximum).
fn dilate_vertical(input: &[u8], output: &mut [u8], w: usize, h: usize, kernel_h: usize) {
    if kernel_h <= 1 {
        output.copy_from_slice(input);
        return;
    }
    let r_top = (kernel_h - 1) / 2;
    let r_bot = kernel_h / 2;

    for x in 0..w {
        let mut count = 0usize;

        for y in 0..=r_bot.min(h - 1) {
            if input[y * w + x] > 0 {
                count += 1;
            }
        }

        for y in 0..h {
            output[y * w + x] = if count > 0 { 255 } else { 0 };

            let enter = y + r_bot + 1;
            if enter < h && input[enter * w + x] > 0 {
                count += 1;
            }

            if y >= r_top && input[(y - r_top) * w + x] > 0 {
                count -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_from(w: u32, h: u32, lit: &[(u32, u32)]) -> GrayImage {
        let mut img = GrayImage::new(w, h);
        for &(x, y) in lit {
            img.put_pixel(x, y, image::Luma([255]));
        }
        img
    }

    #[test]
    fn wide_kernel_bridges_word_gap() {
        // Two pixels 6 apart on one line; a 10-wide kernel connects them.
        let img = gray_from(40, 3, &[(10, 1), (16, 1)]);
        let out = dilate_rect(&img, KernelSize::new(10, 1));
        for x in 10..=16 {
            assert_eq!(out.get_pixel(x, 1).0[0], 255, "gap pixel {x} not bridged");
        }
    }

    #[test]
    fn short_kernel_preserves_row_separation() {
        // Pixels on rows 1 and 8; the 10x2 gap kernel must not join them.
        let img = gray_from(20, 10, &[(5, 1), (5, 8)]);
        let out = dilate_rect(&img, KernelSize::new(10, 2));
        for y in 3..=6 {
            assert_eq!(out.get_pixel(5, y).0[0], 0, "rows bridged at y={y}");
        }
    }

    #[test]
    fn square_kernel_grows_in_both_axes() {
        let img = gray_from(9, 9, &[(4, 4)]);
        let out = dilate_rect(&img, KernelSize::new(5, 5));
        assert_eq!(out.get_pixel(2, 2).0[0], 255);
        assert_eq!(out.get_pixel(6, 6).0[0], 255);
        assert_eq!(out.get_pixel(1, 4).0[0], 0);
        assert_eq!(out.get_pixel(4, 1).0[0], 0);
    }

    #[test]
    fn unit_kernel_is_identity() {
        let img = gray_from(5, 5, &[(2, 2)]);
        let out = dilate_rect(&img, KernelSize::new(1, 1));
        assert_eq!(out.as_raw(), img.as_raw());
    }

    #[test]
    fn iterations_compound_growth() {
        let img = gray_from(21, 3, &[(10, 1)]);
        let once = dilate_repeated(&img, KernelSize::new(3, 1), 1);
        let twice = dilate_repeated(&img, KernelSize::new(3, 1), 2);
        assert_eq!(once.get_pixel(8, 1).0[0], 0);
        assert_eq!(twice.get_pixel(8, 1).0[0], 255);
    }

    #[test]
    fn amplify_collapses_a_word_into_one_blob() {
        // Three "characters" spaced 4 px apart on one line.
        let mut lit = Vec::new();
        for start in [10u32, 16, 22] {
            for x in start..start + 2 {
                for y in 10..14 {
                    lit.push((x, y));
                }
            }
        }
        let img = gray_from(60, 30, &lit);
        let out = amplify(&img, &EngineConfig::default());
        // Every column between the first and last glyph is foreground
        // somewhere in the word band.
        for x in 10..24 {
            let hit = (0..30).any(|y| out.get_pixel(x, y).0[0] > 0);
            assert!(hit, "column {x} not covered after amplification");
        }
    }
}
