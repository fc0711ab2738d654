//! Error types for the ingest pipeline.
//!
//! Uses the dual-error pattern: `IngestError` for library consumers with
//! detailed error context, and `ConversionError` for the primary geometry
//! converter, which never escapes the pipeline (it triggers the fallback).

use thiserror::Error;

/// Main error type for the ingest library.
#[derive(Debug, Error)]
pub enum IngestError {
    /// File name does not carry a recognized extension.
    #[error("Unsupported file format: '{0}'. Expected .kmz, .kml, .json or .geojson")]
    UnsupportedFormat(String),

    /// KMZ archive without a KML entry.
    #[error("No KML document found inside archive '{archive}'")]
    MissingInnerDocument { archive: String },

    /// Input could not be parsed as the declared format.
    #[error("Malformed {format} document: {reason}")]
    MalformedDocument { format: &'static str, reason: String },

    /// Retrieving a named resource failed.
    #[error("Resource unavailable: {location}: {reason}")]
    ResourceUnavailable { location: String, reason: String },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// All HTTP retries failed.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// Response body larger than the configured limit.
    #[error("Response too large: {actual} bytes exceeds limit of {limit} bytes")]
    ResponseTooLarge { actual: u64, limit: u64 },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization error.
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl IngestError {
    /// Build a `MalformedDocument` error from any displayable cause.
    pub fn malformed(format: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::MalformedDocument {
            format,
            reason: reason.to_string(),
        }
    }

    /// Whether the error came from retrieving bytes rather than parsing them.
    #[must_use]
    pub fn is_resource_unavailable(&self) -> bool {
        matches!(self, Self::ResourceUnavailable { .. })
    }
}

/// Result type alias for ingest operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Failure of the primary geometry converter.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// A coordinate tuple could not be parsed.
    #[error("Invalid coordinate tuple '{tuple}' in placemark {placemark}")]
    InvalidCoordinate { placemark: usize, tuple: String },

    /// A geometry element lacks its coordinates.
    #[error("<{element}> without coordinates in placemark {placemark}")]
    MissingCoordinates {
        placemark: usize,
        element: String,
    },
}
