use tabula_core::{BoundingBox, Row};

/// Group boxes into table rows by y proximity.
///
/// Single-pass greedy clustering: boxes are stable-sorted by ascending y
/// (ties keep extraction order), the first box seeds the first row, and each
/// subsequent box joins the current row iff its y lies within `tolerance`
/// of the row *seed's* y. On a miss the current row is sealed (stable-sorted
/// by ascending x) and the box seeds a new row.
///
/// The anchor never moves off the seed, so boxes arriving in a chain can
/// stretch a row's total y-span beyond `tolerance` — each member is only
/// checked against the seed, never its predecessor. Suitable for regularly
/// spaced table rows; densely packed or skewed tables can mis-cluster.
pub fn cluster_rows(mut boxes: Vec<BoundingBox>, tolerance: u32) -> Vec<Row> {
    if boxes.is_empty() {
        return Vec::new();
    }

    boxes.sort_by_key(|b| b.y);

    let mut rows = Vec::new();
    let mut iter = boxes.into_iter();
    let mut current = match iter.next() {
        Some(seed) => Row::seeded(seed),
        None => return Vec::new(),
    };

    for bbox in iter {
        if bbox.y.abs_diff(current.anchor_y) < tolerance {
            current.push(bbox);
        } else {
            current.sort_by_x();
            rows.push(current);
            current = Row::seeded(bbox);
        }
    }

    current.sort_by_x();
    rows.push(current);

    tracing::debug!(rows = rows.len(), tolerance, "clustered boxes into rows");
    rows
}
