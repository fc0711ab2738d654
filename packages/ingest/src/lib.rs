//! Cadastre ingest - Normalize geospatial cadastral documents into property records.
//!
//! Accepts KMZ archives, raw KML documents and GeoJSON FeatureCollections,
//! and turns them into [`PropertyRecord`]s with validated polygon or line
//! geometry plus block/parcel numbers, owners, areas and registration data.
//!
//! # Example
//!
//! ```
//! use cadastre_ingest::Ingestor;
//!
//! let kml = br#"<kml><Placemark><name>12/34</name>
//!   <Polygon><outerBoundaryIs><LinearRing>
//!     <coordinates>36.1,33.5 36.2,33.5 36.2,33.6</coordinates>
//!   </LinearRing></outerBoundaryIs></Polygon>
//! </Placemark></kml>"#;
//!
//! let outcome = Ingestor::default().ingest_upload(kml, "parcels.kml").unwrap();
//! assert_eq!(outcome.count, 1);
//! assert_eq!(outcome.properties[0].ada, "12");
//! assert_eq!(outcome.properties[0].parsel, "34");
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Constants and the [`IngestConfig`] value
//! - [`types`]: Source kinds, GeoJSON features and property records
//! - [`error`]: Error types and Result alias
//! - [`archive`]: KMZ unwrapping
//! - [`xml`]: Namespace-tolerant element lookup
//! - [`geometry`]: Primary converter, manual fallback and feature filter
//! - [`metadata`]: Structured and legacy placemark metadata
//! - [`synth`]: Record synthesis
//! - [`geojson`]: GeoJSON input
//! - [`mock`]: Synthetic parcels
//! - [`http`]: HTTP retrieval
//! - [`ingest`]: Format dispatch and entry points
//! - [`output`]: JSON/YAML output
//! - [`cli`]: Command-line interface

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod geojson;
pub mod geometry;
pub mod http;
pub mod ingest;
pub mod metadata;
pub mod mock;
pub mod output;
pub mod synth;
pub mod types;
pub mod xml;

pub use ingest::Ingestor;
pub use mock::generate_mock;

pub use config::IngestConfig;
pub use error::{IngestError, Result};
pub use types::{FeatureCollection, IngestOutcome, PropertyRecord, SourceKind};
