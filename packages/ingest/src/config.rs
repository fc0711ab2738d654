//! Configuration constants and the ingestion configuration value.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};
use crate::types::LatLng;

/// Namespace URI of OGC KML 2.2 documents.
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

/// Extension of compressed KML archives.
pub const KMZ_EXTENSION: &str = ".kmz";

/// Extension of raw KML documents.
pub const KML_EXTENSION: &str = ".kml";

/// Extensions of the GeoJSON family.
pub const GEOJSON_EXTENSIONS: [&str; 2] = [".json", ".geojson"];

/// Sentinel used for absent block/parcel identifiers and unknown areas.
pub const MISSING: &str = "---";

/// First id of the range reserved for synthetic records.
pub const MOCK_ID_BASE: u64 = 1_000_000;

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default maximum HTTP response size in bytes (100 MB).
pub const DEFAULT_MAX_RESPONSE_SIZE: u64 = 100 * 1024 * 1024;

/// Environment variable pointing at a YAML configuration file.
pub const CONFIG_ENV_VAR: &str = "CADASTRE_INGEST_CONFIG";

/// Fallback values for record fields that no source provides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordDefaults {
    /// Location of markup records without a district.
    pub location: String,
    /// Location of GeoJSON records without one.
    pub json_location: String,
    pub property_type: String,
    pub owner_name: String,
    pub province: String,
    pub directorate: String,
    pub share_text: String,
    pub transaction_type: String,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            location: "Halep / Merkez".to_string(),
            json_location: "Sam / Merkez".to_string(),
            property_type: "Arsa".to_string(),
            owner_name: "Mechul Malik".to_string(),
            province: "Halep".to_string(),
            directorate: "Halep Kadastro Müdürlüğü".to_string(),
            share_text: "Tamamı (1/1)".to_string(),
            transaction_type: "Kayıt".to_string(),
        }
    }
}

/// Half-open range `[min, max)` for placeholder prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceRange {
    pub min: u64,
    pub max: u64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: 100_000,
            max: 600_000,
        }
    }
}

/// Parameters of the synthetic dataset used when nothing real is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    pub count: usize,
    pub center: LatLng,
    pub region_label: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            count: 50,
            center: LatLng {
                lat: 33.5138,
                lng: 36.29,
            },
            region_label: "Damascus / Mezzeh".to_string(),
        }
    }
}

/// Settings of the HTTP retrieval collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub max_response_size: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: HTTP_TIMEOUT_SECS,
            max_retries: 3,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

/// Immutable configuration passed into every ingestion entry point.
///
/// # Examples
/// ```
/// use cadastre_ingest::config::IngestConfig;
///
/// let config = IngestConfig::from_yaml_str("price_range:\n  min: 10\n  max: 20\n").unwrap();
/// assert_eq!(config.price_range.min, 10);
/// assert_eq!(config.defaults.owner_name, "Mechul Malik");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Namespace URI used for qualified element lookup.
    pub namespace_uri: String,
    pub defaults: RecordDefaults,
    pub price_range: PriceRange,
    pub mock: MockConfig,
    pub http: HttpConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            namespace_uri: KML_NAMESPACE.to_string(),
            defaults: RecordDefaults::default(),
            price_range: PriceRange::default(),
            mock: MockConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Parse and validate a YAML configuration. Missing keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Load the file named by `CADASTRE_INGEST_CONFIG`, or the defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.is_empty() => Self::from_yaml_file(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.price_range.min >= self.price_range.max {
            return Err(IngestError::Config(format!(
                "price_range.min ({}) must be below price_range.max ({})",
                self.price_range.min, self.price_range.max
            )));
        }
        if self.http.timeout_secs == 0 {
            return Err(IngestError::Config(
                "http.timeout_secs must be positive".to_string(),
            ));
        }
        if self.namespace_uri.trim().is_empty() {
            return Err(IngestError::Config(
                "namespace_uri must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
