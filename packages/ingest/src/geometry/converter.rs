//! Primary KML → feature conversion.

use roxmltree::Node;
use serde_json::Value;

use super::coordinates::parse_strict;
use crate::error::ConversionError;
use crate::types::{close_ring, Feature, Geometry, Position};
use crate::xml::{element_children, get_tag_name, get_text, has_tag, MarkupDocument};

/// Local names of the KML geometry elements the converter understands.
const GEOMETRY_TAGS: [&str; 5] = ["MultiGeometry", "Polygon", "LineString", "LinearRing", "Point"];

/// Minimum number of positions of a closed ring (three distinct + closing).
const MIN_CLOSED_RING: usize = 4;

/// Trait for whole-document geometry converters.
///
/// Implementations turn a parsed KML document into features, each tagged
/// with the index of the placemark it came from (see
/// [`MarkupDocument::placemarks`]). Returning an error or no features makes
/// the pipeline fall back to the manual parser.
pub trait GeometryConverter {
    /// Convert all placemarks of `doc`.
    fn convert(&self, doc: &MarkupDocument<'_>) -> Result<Vec<Feature>, ConversionError>;
}

/// Default converter covering points, lines, polygons with holes and
/// multi-geometries. Coordinates are parsed strictly.
#[derive(Debug, Clone, Copy, Default)]
pub struct KmlGeometryConverter;

impl GeometryConverter for KmlGeometryConverter {
    fn convert(&self, doc: &MarkupDocument<'_>) -> Result<Vec<Feature>, ConversionError> {
        let locator = doc.locator();
        let mut features = Vec::new();

        for (index, placemark) in doc.placemarks().into_iter().enumerate() {
            let Some(element) = placemark
                .descendants()
                .skip(1)
                .find(|n| n.is_element() && GEOMETRY_TAGS.contains(&get_tag_name(*n)))
            else {
                continue;
            };

            let mut parts = GeometryParts::default();
            collect_parts(element, index, &mut parts)?;

            if let Some(geometry) = parts.into_geometry() {
                let mut feature = Feature::from_placemark(index, geometry);
                if let Some(name) = locator.find_first(placemark, "name") {
                    feature
                        .properties
                        .insert("name".to_string(), Value::String(get_text(name)));
                }
                features.push(feature);
            }
        }

        Ok(features)
    }
}

/// Geometry pieces gathered from one placemark, grouped by dimension.
#[derive(Debug, Default)]
struct GeometryParts {
    points: Vec<Position>,
    lines: Vec<Vec<Position>>,
    polygons: Vec<Vec<Vec<Position>>>,
}

impl GeometryParts {
    /// Combine the highest-dimension parts into a single geometry.
    fn into_geometry(mut self) -> Option<Geometry> {
        if !self.polygons.is_empty() {
            return Some(if self.polygons.len() == 1 {
                Geometry::Polygon(self.polygons.remove(0))
            } else {
                Geometry::MultiPolygon(self.polygons)
            });
        }
        if !self.lines.is_empty() {
            return Some(if self.lines.len() == 1 {
                Geometry::LineString(self.lines.remove(0))
            } else {
                Geometry::MultiLineString(self.lines)
            });
        }
        match self.points.len() {
            0 => None,
            1 => Some(Geometry::Point(self.points.remove(0))),
            _ => Some(Geometry::MultiPoint(self.points)),
        }
    }
}

fn collect_parts(
    element: Node<'_, '_>,
    placemark: usize,
    parts: &mut GeometryParts,
) -> Result<(), ConversionError> {
    match get_tag_name(element) {
        "MultiGeometry" => {
            for child in element_children(element) {
                collect_parts(child, placemark, parts)?;
            }
        }
        "Point" => {
            if let Some(position) = coordinates_of(element, placemark)?.into_iter().next() {
                parts.points.push(position);
            }
        }
        "LineString" | "LinearRing" => {
            let positions = coordinates_of(element, placemark)?;
            if positions.len() >= 2 {
                parts.lines.push(positions);
            }
        }
        "Polygon" => {
            if let Some(rings) = polygon_rings(element, placemark)? {
                parts.polygons.push(rings);
            }
        }
        _ => {}
    }
    Ok(())
}

/// Outer ring followed by inner rings, or `None` when the outer ring is degenerate.
fn polygon_rings(
    polygon: Node<'_, '_>,
    placemark: usize,
) -> Result<Option<Vec<Vec<Position>>>, ConversionError> {
    let outer_boundary = element_children(polygon).find(|n| has_tag(*n, "outerBoundaryIs"));
    let outer = match outer_boundary {
        Some(boundary) => closed_ring(coordinates_of(boundary, placemark)?),
        None => closed_ring(coordinates_of(polygon, placemark)?),
    };
    let Some(outer) = outer else {
        return Ok(None);
    };

    let mut rings = vec![outer];
    for boundary in element_children(polygon).filter(|n| has_tag(*n, "innerBoundaryIs")) {
        if let Some(inner) = closed_ring(coordinates_of(boundary, placemark)?) {
            rings.push(inner);
        }
    }
    Ok(Some(rings))
}

fn closed_ring(mut positions: Vec<Position>) -> Option<Vec<Position>> {
    close_ring(&mut positions);
    (positions.len() >= MIN_CLOSED_RING).then_some(positions)
}

/// Strictly parsed positions of the first `<coordinates>` below `element`.
fn coordinates_of(element: Node<'_, '_>, placemark: usize) -> Result<Vec<Position>, ConversionError> {
    let node = element
        .descendants()
        .find(|n| has_tag(*n, "coordinates"))
        .ok_or_else(|| ConversionError::MissingCoordinates {
            placemark,
            element: get_tag_name(element).to_string(),
        })?;

    let text: String = node.descendants().filter_map(|n| n.text()).collect();
    parse_strict(&text).map_err(|tuple| ConversionError::InvalidCoordinate { placemark, tuple })
}

/// Converter that never produces features. Forces the manual fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConverter;

impl GeometryConverter for NullConverter {
    fn convert(&self, _doc: &MarkupDocument<'_>) -> Result<Vec<Feature>, ConversionError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KML_NAMESPACE;
    use crate::types::is_ring_closed;
    use serde_json::Map;

    fn feature_name(properties: &Map<String, Value>) -> Option<&str> {
        properties.get("name").and_then(Value::as_str)
    }

    fn convert(xml: &str) -> Result<Vec<Feature>, ConversionError> {
        let doc = MarkupDocument::parse(xml, KML_NAMESPACE).unwrap();
        KmlGeometryConverter.convert(&doc)
    }

    #[test]
    fn test_polygon_with_hole_is_closed() {
        let xml = r#"<kml xmlns="http://www.opengis.net/kml/2.2"><Document>
            <Placemark><name>1/1</name><Polygon>
              <outerBoundaryIs><LinearRing><coordinates>0,0 4,0 4,4 0,4</coordinates></LinearRing></outerBoundaryIs>
              <innerBoundaryIs><LinearRing><coordinates>1,1 2,1 2,2 1,1</coordinates></LinearRing></innerBoundaryIs>
            </Polygon></Placemark>
        </Document></kml>"#;
        let features = convert(xml).unwrap();
        assert_eq!(features.len(), 1);

        let Some(Geometry::Polygon(rings)) = &features[0].geometry else {
            panic!("expected polygon");
        };
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].len(), 5);
        assert!(rings.iter().all(|ring| is_ring_closed(ring)));
        assert_eq!(feature_name(&features[0].properties), Some("1/1"));
        assert_eq!(features[0].placemark_index, Some(0));
    }

    #[test]
    fn test_point_and_line() {
        let xml = r#"<kml><Document>
            <Placemark><Point><coordinates>36.1,33.5,0</coordinates></Point></Placemark>
            <Placemark><LineString><coordinates>0,0 1,1 2,2</coordinates></LineString></Placemark>
        </Document></kml>"#;
        let features = convert(xml).unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(
            features[0].geometry,
            Some(Geometry::Point(vec![36.1, 33.5, 0.0]))
        );
        assert_eq!(features[1].geometry.as_ref().map(Geometry::type_name), Some("LineString"));
        assert_eq!(features[1].placemark_index, Some(1));
    }

    #[test]
    fn test_multi_geometry_keeps_polygons() {
        let xml = r#"<kml><Placemark><MultiGeometry>
            <Point><coordinates>5,5</coordinates></Point>
            <Polygon><outerBoundaryIs><LinearRing><coordinates>0,0 1,0 1,1 0,0</coordinates></LinearRing></outerBoundaryIs></Polygon>
            <Polygon><outerBoundaryIs><LinearRing><coordinates>2,2 3,2 3,3 2,2</coordinates></LinearRing></outerBoundaryIs></Polygon>
        </MultiGeometry></Placemark></kml>"#;
        let features = convert(xml).unwrap();
        let Some(Geometry::MultiPolygon(polygons)) = &features[0].geometry else {
            panic!("expected multipolygon");
        };
        assert_eq!(polygons.len(), 2);
    }

    #[test]
    fn test_multi_geometry_of_lines() {
        let xml = r#"<kml><Placemark><MultiGeometry>
            <LineString><coordinates>0,0 1,1</coordinates></LineString>
            <LineString><coordinates>2,2 3,3</coordinates></LineString>
        </MultiGeometry></Placemark></kml>"#;
        let features = convert(xml).unwrap();
        assert_eq!(
            features[0].geometry.as_ref().map(Geometry::type_name),
            Some("MultiLineString")
        );
    }

    #[test]
    fn test_malformed_coordinates_fail_conversion() {
        let xml = r#"<kml><Placemark><Polygon><outerBoundaryIs><LinearRing>
            <coordinates>0,0 1,zero 1,1 0,0</coordinates>
        </LinearRing></outerBoundaryIs></Polygon></Placemark></kml>"#;
        let err = convert(xml).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidCoordinate { placemark: 0, .. }));
    }

    #[test]
    fn test_missing_coordinates_fail_conversion() {
        let xml = r#"<kml><Placemark><Polygon/></Placemark></kml>"#;
        let err = convert(xml).unwrap_err();
        assert!(matches!(err, ConversionError::MissingCoordinates { .. }));
    }

    #[test]
    fn test_degenerate_polygon_dropped() {
        let xml = r#"<kml><Placemark><Polygon><outerBoundaryIs><LinearRing>
            <coordinates>0,0 1,1</coordinates>
        </LinearRing></outerBoundaryIs></Polygon></Placemark></kml>"#;
        assert!(convert(xml).unwrap().is_empty());
    }

    #[test]
    fn test_placemark_without_geometry_keeps_index_gap() {
        let xml = r#"<kml>
            <Placemark><name>no geometry</name></Placemark>
            <Placemark><LineString><coordinates>0,0 1,1</coordinates></LineString></Placemark>
        </kml>"#;
        let features = convert(xml).unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].placemark_index, Some(1));
    }

    #[test]
    fn test_null_converter() {
        let doc = MarkupDocument::parse("<kml><Placemark/></kml>", KML_NAMESPACE).unwrap();
        assert!(NullConverter.convert(&doc).unwrap().is_empty());
    }
}
