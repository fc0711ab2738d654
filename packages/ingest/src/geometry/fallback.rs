//! Manual polygon extraction used when the primary converter yields nothing.

use super::coordinates::parse_lenient;
use crate::types::{close_ring, Feature, Geometry};
use crate::xml::{collect_text, MarkupDocument};

/// Minimum number of parsed points before closing a ring.
const MIN_RING_POINTS: usize = 3;

/// Walk placemark → `Polygon` → `coordinates` directly.
///
/// Only the first polygon of each placemark and its first coordinate list
/// (the outer boundary) are read. Malformed tuples are discarded, rings with
/// fewer than three points are skipped and every emitted ring is closed.
pub fn parse_polygons(doc: &MarkupDocument<'_>) -> Vec<Feature> {
    let locator = doc.locator();
    let mut features = Vec::new();

    for (index, placemark) in doc.placemarks().into_iter().enumerate() {
        let Some(polygon) = locator.find_first(placemark, "Polygon") else {
            continue;
        };
        let Some(coordinates) = locator.find_first(polygon, "coordinates") else {
            continue;
        };

        let mut ring = parse_lenient(collect_text(coordinates).trim());
        if ring.len() < MIN_RING_POINTS {
            tracing::debug!(placemark = index, points = ring.len(), "Skipping degenerate ring");
            continue;
        }
        close_ring(&mut ring);

        features.push(Feature::from_placemark(index, Geometry::Polygon(vec![ring])));
    }

    features
}
