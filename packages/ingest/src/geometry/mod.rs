//! Geometry extraction from KML documents.
//!
//! The primary [`GeometryConverter`] runs first; when it fails or yields no
//! features the manual polygon parser takes over. The result of either tier
//! is filtered down to polygon and line geometry.

mod converter;
mod coordinates;
mod fallback;
mod filter;

pub use converter::{GeometryConverter, KmlGeometryConverter, NullConverter};
pub use coordinates::{parse_lenient, parse_strict};
pub use fallback::parse_polygons;
pub use filter::retain_areal_and_linear;

use crate::types::Feature;
use crate::xml::MarkupDocument;

/// Which tier produced the features of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometrySource {
    Converter,
    ManualFallback,
}

/// Convert `doc` with `converter`, falling back to the manual parser, then filter.
pub fn extract_features(
    converter: &dyn GeometryConverter,
    doc: &MarkupDocument<'_>,
) -> (Vec<Feature>, GeometrySource) {
    let converted = match converter.convert(doc) {
        Ok(features) => {
            tracing::debug!(features = features.len(), "Primary converter finished");
            features
        }
        Err(e) => {
            tracing::warn!(error = %e, "Primary geometry conversion failed");
            Vec::new()
        }
    };

    let (features, source) = if converted.is_empty() {
        tracing::warn!("Primary converter returned no features, trying manual parse");
        let manual = parse_polygons(doc);
        tracing::debug!(features = manual.len(), "Manual parse finished");
        (manual, GeometrySource::ManualFallback)
    } else {
        (converted, GeometrySource::Converter)
    };

    (retain_areal_and_linear(features), source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KML_NAMESPACE;
    use crate::error::ConversionError;

    struct FailingConverter;

    impl GeometryConverter for FailingConverter {
        fn convert(&self, _doc: &MarkupDocument<'_>) -> Result<Vec<Feature>, ConversionError> {
            Err(ConversionError::MissingCoordinates {
                placemark: 0,
                element: "Polygon".to_string(),
            })
        }
    }

    const TWO_POLYGONS: &str = r#"<kml><Document>
        <Placemark><Polygon><outerBoundaryIs><LinearRing><coordinates>0,0 1,0 1,1</coordinates></LinearRing></outerBoundaryIs></Polygon></Placemark>
        <Placemark><Point><coordinates>3,3</coordinates></Point></Placemark>
        <Placemark><Polygon><outerBoundaryIs><LinearRing><coordinates>2,2 3,2 3,3</coordinates></LinearRing></outerBoundaryIs></Polygon></Placemark>
    </Document></kml>"#;

    #[test]
    fn test_primary_converter_used_and_filtered() {
        let doc = MarkupDocument::parse(TWO_POLYGONS, KML_NAMESPACE).unwrap();
        let (features, source) = extract_features(&KmlGeometryConverter, &doc);
        assert_eq!(source, GeometrySource::Converter);
        assert_eq!(features.len(), 2);
        assert_eq!(features[1].placemark_index, Some(2));
    }

    #[test]
    fn test_failing_converter_falls_back() {
        let doc = MarkupDocument::parse(TWO_POLYGONS, KML_NAMESPACE).unwrap();
        let (features, source) = extract_features(&FailingConverter, &doc);
        assert_eq!(source, GeometrySource::ManualFallback);
        assert_eq!(features.len(), 2);
    }

    #[test]
    fn test_empty_converter_falls_back() {
        let doc = MarkupDocument::parse(TWO_POLYGONS, KML_NAMESPACE).unwrap();
        let (features, source) = extract_features(&NullConverter, &doc);
        assert_eq!(source, GeometrySource::ManualFallback);
        assert_eq!(features.len(), 2);
    }

    #[test]
    fn test_no_geometry_anywhere() {
        let doc = MarkupDocument::parse("<kml><Placemark/></kml>", KML_NAMESPACE).unwrap();
        let (features, _) = extract_features(&KmlGeometryConverter, &doc);
        assert!(features.is_empty());
    }
}
