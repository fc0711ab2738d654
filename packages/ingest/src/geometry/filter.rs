//! Feature filtering.

use crate::types::Feature;

/// Keep only features with polygon or line geometry.
///
/// Points, multi-points and geometry-less features are dropped. Order is
/// preserved.
pub fn retain_areal_and_linear(features: Vec<Feature>) -> Vec<Feature> {
    let before = features.len();
    let kept: Vec<Feature> = features
        .into_iter()
        .filter(|f| f.geometry.as_ref().is_some_and(|g| g.is_areal_or_linear()))
        .collect();

    if kept.len() < before {
        tracing::debug!(dropped = before - kept.len(), kept = kept.len(), "Filtered features");
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Geometry;
    use serde_json::Map;

    #[test]
    fn test_filter_drops_points_and_empty_geometry() {
        let features = vec![
            Feature::from_placemark(0, Geometry::Point(vec![0.0, 0.0])),
            Feature::from_placemark(1, Geometry::LineString(vec![vec![0.0, 0.0], vec![1.0, 1.0]])),
            Feature::with_properties(None, Map::new()),
            Feature::from_placemark(3, Geometry::MultiPoint(vec![vec![0.0, 0.0]])),
            Feature::from_placemark(
                4,
                Geometry::Polygon(vec![vec![
                    vec![0.0, 0.0],
                    vec![1.0, 0.0],
                    vec![1.0, 1.0],
                    vec![0.0, 0.0],
                ]]),
            ),
        ];

        let kept = retain_areal_and_linear(features);
        let indices: Vec<_> = kept.iter().map(|f| f.placemark_index).collect();
        assert_eq!(indices, vec![Some(1), Some(4)]);
    }
}
