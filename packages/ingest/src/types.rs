//! Core data types for the ingest pipeline.
//!
//! Geometry and feature types serialize in GeoJSON shape so that the
//! feature collection returned next to the records can be handed to any
//! GeoJSON consumer unchanged.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::config::{GEOJSON_EXTENSIONS, KML_EXTENSION, KMZ_EXTENSION};
use crate::error::{IngestError, Result};

/// Kind of an input document, decided by its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Zip container holding a KML document.
    Kmz,
    /// Raw KML text.
    Kml,
    /// GeoJSON FeatureCollection.
    GeoJson,
}

impl SourceKind {
    /// Detect the kind from a file name, ignoring case.
    ///
    /// # Examples
    /// ```
    /// use cadastre_ingest::types::SourceKind;
    ///
    /// assert_eq!(SourceKind::from_file_name("13.KMZ").unwrap(), SourceKind::Kmz);
    /// assert_eq!(SourceKind::from_file_name("parcels.geojson").unwrap(), SourceKind::GeoJson);
    /// assert!(SourceKind::from_file_name("parcels.shp").is_err());
    /// ```
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(KMZ_EXTENSION) {
            Ok(Self::Kmz)
        } else if lower.ends_with(KML_EXTENSION) {
            Ok(Self::Kml)
        } else if GEOJSON_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
            Ok(Self::GeoJson)
        } else {
            Err(IngestError::UnsupportedFormat(file_name.to_string()))
        }
    }

    /// Human-readable format name used in error messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kmz => "KMZ",
            Self::Kml => "KML",
            Self::GeoJson => "GeoJSON",
        }
    }
}

/// Raw input bytes together with their declared kind.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub file_name: String,
    pub kind: SourceKind,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    /// Wrap bytes, detecting the kind from `file_name`.
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>) -> Result<Self> {
        let file_name = file_name.into();
        let kind = SourceKind::from_file_name(&file_name)?;
        Ok(Self {
            file_name,
            kind,
            bytes,
        })
    }
}

/// A `[lng, lat]` or `[lng, lat, elevation]` position.
pub type Position = Vec<f64>;

/// GeoJSON geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
}

impl Geometry {
    /// GeoJSON type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::MultiPoint(_) => "MultiPoint",
            Self::LineString(_) => "LineString",
            Self::MultiLineString(_) => "MultiLineString",
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Whether this geometry may appear on a property record.
    #[must_use]
    pub fn is_areal_or_linear(&self) -> bool {
        matches!(
            self,
            Self::Polygon(_) | Self::MultiPolygon(_) | Self::LineString(_) | Self::MultiLineString(_)
        )
    }

    /// All polygon rings of this geometry (empty for non-areal types).
    #[must_use]
    pub fn rings(&self) -> Vec<&[Position]> {
        match self {
            Self::Polygon(rings) => rings.iter().map(Vec::as_slice).collect(),
            Self::MultiPolygon(polygons) => polygons
                .iter()
                .flat_map(|rings| rings.iter().map(Vec::as_slice))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Whether the first and last positions of a ring share longitude and latitude.
#[must_use]
pub fn is_ring_closed(ring: &[Position]) -> bool {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) => first.get(..2) == last.get(..2),
        _ => false,
    }
}

/// Append the first position when the ring is open.
pub fn close_ring(ring: &mut Vec<Position>) {
    if let Some(first) = ring.first().cloned() {
        if !is_ring_closed(ring) {
            ring.push(first);
        }
    }
}

fn feature_tag() -> String {
    "Feature".to_string()
}

fn collection_tag() -> String {
    "FeatureCollection".to_string()
}

/// GeoJSON feature.
///
/// Features read from GeoJSON keep their geometry exactly as written in
/// `source_geometry` and serialize it back verbatim, so integer coordinates
/// stay integers. [`Feature::geometry`] is the typed view used everywhere
/// else; records always carry the typed geometry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_tag")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    pub geometry: Option<Geometry>,

    #[serde(default)]
    pub properties: Map<String, Value>,

    /// Index of the placemark this feature was converted from.
    #[serde(skip)]
    pub placemark_index: Option<usize>,

    /// Geometry JSON as read from a GeoJSON document.
    #[serde(skip)]
    pub source_geometry: Option<Value>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireGeometry<'a> {
    Source(&'a Value),
    Typed(&'a Geometry),
}

#[derive(Serialize)]
struct WireFeature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a Value>,
    geometry: Option<WireGeometry<'a>>,
    properties: &'a Map<String, Value>,
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let geometry = match (&self.source_geometry, &self.geometry) {
            (Some(source), Some(_)) => Some(WireGeometry::Source(source)),
            (_, typed) => typed.as_ref().map(WireGeometry::Typed),
        };
        WireFeature {
            kind: &self.kind,
            id: self.id.as_ref(),
            geometry,
            properties: &self.properties,
        }
        .serialize(serializer)
    }
}

impl Feature {
    /// Feature converted from the placemark at `placemark_index`.
    #[must_use]
    pub fn from_placemark(placemark_index: usize, geometry: Geometry) -> Self {
        Self {
            kind: feature_tag(),
            id: None,
            geometry: Some(geometry),
            properties: Map::new(),
            placemark_index: Some(placemark_index),
            source_geometry: None,
        }
    }

    /// Feature read from an inline-properties source such as GeoJSON.
    #[must_use]
    pub fn with_properties(geometry: Option<Geometry>, properties: Map<String, Value>) -> Self {
        Self {
            kind: feature_tag(),
            id: None,
            geometry,
            properties,
            placemark_index: None,
            source_geometry: None,
        }
    }
}

/// GeoJSON feature collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_tag")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: collection_tag(),
            features,
        }
    }
}

/// A `(lat, lng)` pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Where a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrigin {
    /// Derived from an ingested document.
    Ingested,
    /// Produced by the mock generator.
    Mock,
}

/// Normalized property record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: u64,
    pub origin: RecordOrigin,

    /// Block (ada) number, `---` when unknown.
    pub ada: String,

    /// Parcel number, `---` when unknown.
    pub parsel: String,

    pub location: String,
    pub province: String,
    pub district: String,
    pub directorate: String,
    pub street: String,
    pub full_address: String,

    #[serde(rename = "type")]
    pub property_type: String,

    pub owner_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name_ar: Option<String>,

    /// Area in square metres.
    pub area: f64,

    /// Display string for the area, never empty.
    pub area_text: String,

    pub price: u64,
    pub registration_date: String,
    pub signature_date: String,
    pub daily_register_no: String,
    pub share_text: String,
    pub transaction_type: String,
    pub geometry: Geometry,
}

impl PropertyRecord {
    /// `ada/parsel` compound key.
    #[must_use]
    pub fn parcel_key(&self) -> String {
        format!("{}/{}", self.ada, self.parsel)
    }

    #[must_use]
    pub fn is_mock(&self) -> bool {
        self.origin == RecordOrigin::Mock
    }
}

/// Result of one ingestion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub properties: Vec<PropertyRecord>,
    pub feature_collection: FeatureCollection,
    pub count: usize,
}

impl IngestOutcome {
    #[must_use]
    pub fn new(properties: Vec<PropertyRecord>, features: Vec<Feature>) -> Self {
        let count = properties.len();
        Self {
            properties,
            feature_collection: FeatureCollection::new(features),
            count,
        }
    }

    /// Outcome made of synthetic records only.
    #[must_use]
    pub fn from_mock(properties: Vec<PropertyRecord>) -> Self {
        let features = properties
            .iter()
            .map(|record| {
                let mut feature = Feature::with_properties(Some(record.geometry.clone()), Map::new());
                feature.id = Some(Value::from(record.id));
                feature
            })
            .collect();
        Self::new(properties, features)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
