use image::GrayImage;
use imageproc::contours::{find_contours, Contour};
use tabula_core::BoundingBox;

/// Detect the contour tree of the dilated image.
///
/// `find_contours` walks outer borders and hole borders alike (the tree
/// retrieval mode), with each border reduced to its boundary points.
pub fn detect_contours(dilated: &GrayImage) -> Vec<Contour<u32>> {
    find_contours::<u32>(dilated)
}

/// Collapse each contour to its axis-aligned bounding rectangle, discarding
/// speckle noise below the minimum dimensions (strictly greater-than filter).
///
/// Output order is contour-detection order; no ordering guarantee is made.
/// Downstream stages impose order explicitly.
pub fn contours_to_boxes(
    contours: &[Contour<u32>],
    min_width: u32,
    min_height: u32,
) -> Vec<BoundingBox> {
    let mut boxes = Vec::new();
    for contour in contours {
        if contour.points.is_empty() {
            continue;
        }
        let mut min_x = u32::MAX;
        let mut min_y = u32::MAX;
        let mut max_x = 0u32;
        let mut max_y = 0u32;
        for p in &contour.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        // Border points are inclusive on both ends.
        let width = max_x - min_x + 1;
        let height = max_y - min_y + 1;
        if width > min_width && height > min_height {
            boxes.push(BoundingBox::new(min_x, min_y, width, height));
        }
    }
    boxes
}

/// Contour detection and bbox conversion in one step.
pub fn extract_boxes(dilated: &GrayImage, min_width: u32, min_height: u32) -> Vec<BoundingBox> {
    let contours = detect_contours(dilated);
    let boxes = contours_to_boxes(&contours, min_width, min_height);
    tracing::debug!(
        contours = contours.len(),
        kept = boxes.len(),
        "extracted candidate regions"
    );
    boxes
}
