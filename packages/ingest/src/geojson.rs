//! GeoJSON FeatureCollection input.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{IngestError, Result};
use crate::types::{Feature, Geometry};

/// Feature as found on the wire. Geometry is kept raw so one unknown or
/// malformed geometry does not reject the whole document.
#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    geometry: Option<Value>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(default)]
    features: Vec<RawFeature>,
}

/// Parse a GeoJSON FeatureCollection into features with inline properties.
///
/// A missing `features` array yields no features. Features whose geometry is
/// absent or not a recognized GeoJSON geometry keep `geometry: None` and are
/// dropped later by the feature filter. Text that is not valid JSON fails
/// with `MalformedDocument`.
///
/// # Examples
/// ```
/// use cadastre_ingest::geojson::parse_feature_collection;
///
/// let json = br#"{"type":"FeatureCollection","features":[
///   {"type":"Feature","geometry":{"type":"Point","coordinates":[36.2,33.5]},"properties":{"ada":"1"}}
/// ]}"#;
/// let features = parse_feature_collection(json).unwrap();
/// assert_eq!(features.len(), 1);
/// assert_eq!(features[0].properties["ada"], "1");
/// ```
pub fn parse_feature_collection(bytes: &[u8]) -> Result<Vec<Feature>> {
    let raw: RawCollection =
        serde_json::from_slice(bytes).map_err(|e| IngestError::malformed("GeoJSON", e))?;

    let features: Vec<Feature> = raw
        .features
        .into_iter()
        .enumerate()
        .map(|(position, raw)| {
            let geometry = raw.geometry.as_ref().and_then(|value| {
                if value.is_null() {
                    return None;
                }
                Geometry::deserialize(value)
                    .inspect_err(|e| {
                        tracing::warn!(feature = position, error = %e, "Discarding unreadable geometry");
                    })
                    .ok()
            });
            let mut feature = Feature::with_properties(geometry, raw.properties.unwrap_or_default());
            feature.id = raw.id;
            if feature.geometry.is_some() {
                feature.source_geometry = raw.geometry;
            }
            feature
        })
        .collect();

    tracing::debug!(features = features.len(), "Parsed GeoJSON collection");
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::retain_areal_and_linear;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_polygons_round_trip_and_point_dropped() {
        let input = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "id": 1,
                 "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]},
                 "properties": {"ada": "1", "parsel": "2"}},
                {"type": "Feature",
                 "geometry": {"type": "Point", "coordinates": [0.5, 0.5]},
                 "properties": {}},
                {"type": "Feature",
                 "geometry": {"type": "MultiLineString", "coordinates": [[[0.0, 0.0], [1.0, 1.0]]]},
                 "properties": {"name": "road"}}
            ]
        });
        let bytes = serde_json::to_vec(&input).unwrap();

        let kept = retain_areal_and_linear(parse_feature_collection(&bytes).unwrap());
        assert_eq!(kept.len(), 2);

        let output = serde_json::to_value(&kept).unwrap();
        let features = input["features"].as_array().unwrap();
        assert_eq!(output[0], features[0]);
        assert_eq!(output[1], features[2]);
    }

    #[test]
    fn test_integer_coordinates_written_back_verbatim() {
        let input = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature",
                 "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]},
                 "properties": {"ada": "1"}}
            ]
        });
        let bytes = serde_json::to_vec(&input).unwrap();

        let features = parse_feature_collection(&bytes).unwrap();
        assert_eq!(features[0].geometry.as_ref().map(Geometry::type_name), Some("Polygon"));

        let output = serde_json::to_value(&features).unwrap();
        assert_eq!(output[0], input["features"][0]);
        assert_eq!(output[0]["geometry"]["coordinates"][0][1][0], json!(1));
    }

    #[test]
    fn test_null_and_unknown_geometry() {
        let bytes = br#"{"features":[
            {"type":"Feature","geometry":null,"properties":null},
            {"type":"Feature","geometry":{"type":"GeometryCollection","geometries":[]}},
            {"type":"Feature"}
        ]}"#;
        let features = parse_feature_collection(bytes).unwrap();
        assert_eq!(features.len(), 3);
        assert!(features.iter().all(|f| f.geometry.is_none()));
        assert!(features.iter().all(|f| f.source_geometry.is_none()));
        assert!(features[0].properties.is_empty());
        assert!(features.iter().all(|f| f.placemark_index.is_none()));
    }

    #[test]
    fn test_missing_features_array() {
        let features = parse_feature_collection(br#"{"type":"FeatureCollection"}"#).unwrap();
        assert!(features.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_feature_collection(b"{not json").unwrap_err();
        assert!(matches!(err, IngestError::MalformedDocument { format: "GeoJSON", .. }));
    }
}
