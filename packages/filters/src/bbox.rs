//! Bounding-box parameter.

use denuncia_database_models::BoundingBox;

/// Parses a bounding box string `"minLon,minLat,maxLon,maxLat"` into a
/// [`BoundingBox`].
///
/// Returns `None` for anything other than exactly four finite decimal
/// numbers; callers skip the spatial filter in that case. Swapped corners
/// are normalized.
#[must_use]
pub fn parse_bbox(s: &str) -> Option<BoundingBox> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>()?;

    let [west, south, east, north] = parts.as_slice() else {
        log::debug!("Ignoring bbox with {} parts: {s:?}", parts.len());
        return None;
    };

    Some(BoundingBox::new(
        west.min(*east),
        south.min(*north),
        west.max(*east),
        south.max(*north),
    ))
}
