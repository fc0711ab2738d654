//! Ingestion entry points.
//!
//! [`Ingestor`] detects the input kind from the file name and routes it
//! through the markup pipeline (KMZ/KML) or the GeoJSON pipeline. Every call
//! is independent: all parsed state lives on the stack of that call.

use std::path::Path;

use rand::Rng;

use crate::archive::{decode_markup, unwrap_kmz};
use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::geojson::parse_feature_collection;
use crate::geometry::{extract_features, retain_areal_and_linear, GeometryConverter, KmlGeometryConverter};
use crate::http::{create_client, download_bytes, is_remote};
use crate::metadata::extract_all;
use crate::mock::generate_mock_with;
use crate::synth::Synthesizer;
use crate::types::{IngestOutcome, SourceDocument, SourceKind};
use crate::xml::MarkupDocument;

/// Turns cadastral documents into normalized property records.
pub struct Ingestor {
    config: IngestConfig,
    converter: Box<dyn GeometryConverter>,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(IngestConfig::default())
    }
}

impl Ingestor {
    /// Ingestor using the built-in KML geometry converter.
    #[must_use]
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            converter: Box::new(KmlGeometryConverter),
        }
    }

    /// Replace the primary geometry converter.
    #[must_use]
    pub fn with_converter(mut self, converter: impl GeometryConverter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    #[must_use]
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Ingest uploaded bytes. The kind is decided by `file_name` alone.
    ///
    /// # Errors
    /// `UnsupportedFormat`, `MissingInnerDocument` or `MalformedDocument`.
    pub fn ingest_upload(&self, bytes: &[u8], file_name: &str) -> Result<IngestOutcome> {
        self.ingest_upload_with_rng(bytes, file_name, &mut rand::thread_rng())
    }

    /// Like [`Ingestor::ingest_upload`] with an explicit RNG for placeholder prices.
    pub fn ingest_upload_with_rng<R: Rng + ?Sized>(
        &self,
        bytes: &[u8],
        file_name: &str,
        rng: &mut R,
    ) -> Result<IngestOutcome> {
        let document = SourceDocument::new(bytes.to_vec(), file_name)?;
        self.ingest_document(&document, rng)
    }

    /// Ingest an already classified document.
    pub fn ingest_document<R: Rng + ?Sized>(
        &self,
        document: &SourceDocument,
        rng: &mut R,
    ) -> Result<IngestOutcome> {
        tracing::debug!(
            file = %document.file_name,
            kind = document.kind.as_str(),
            bytes = document.bytes.len(),
            "Ingesting document"
        );

        let outcome = match document.kind {
            SourceKind::Kmz => {
                let text = unwrap_kmz(&document.bytes, &document.file_name)?;
                self.ingest_markup(&text, rng)?
            }
            SourceKind::Kml => {
                let text = decode_markup(document.bytes.clone())?;
                self.ingest_markup(&text, rng)?
            }
            SourceKind::GeoJson => self.ingest_geojson(&document.bytes, rng)?,
        };

        tracing::info!(
            file = %document.file_name,
            count = outcome.count,
            "Ingestion finished"
        );
        Ok(outcome)
    }

    /// Retrieve a document by location and ingest it.
    ///
    /// `http://` and `https://` locations are downloaded, anything else is
    /// read from the local file system. The last path segment is used as the
    /// file name.
    ///
    /// # Errors
    /// `ResourceUnavailable` when retrieval fails, plus the errors of
    /// [`Ingestor::ingest_upload`].
    pub fn ingest_from_location(&self, location: &str) -> Result<IngestOutcome> {
        let document = self.fetch(location)?;
        self.ingest_document(&document, &mut rand::thread_rng())
    }

    /// Retrieve the bytes named by `location` without ingesting them.
    pub fn fetch(&self, location: &str) -> Result<SourceDocument> {
        let file_name = file_name_of(location);
        // Unsupported names fail before any I/O.
        SourceKind::from_file_name(&file_name)?;

        let bytes = self.retrieve(location).map_err(|e| {
            tracing::warn!(location, error = %e, "Retrieval failed");
            IngestError::ResourceUnavailable {
                location: location.to_string(),
                reason: e.to_string(),
            }
        })?;

        SourceDocument::new(bytes, file_name)
    }

    /// The configured synthetic dataset.
    pub fn mock_outcome<R: Rng + ?Sized>(&self, rng: &mut R) -> IngestOutcome {
        let mock = &self.config.mock;
        tracing::warn!(count = mock.count, "Substituting mock dataset");
        let records = generate_mock_with(
            mock.count,
            mock.center,
            &mock.region_label,
            &self.config.defaults,
            rng,
        );
        IngestOutcome::from_mock(records)
    }

    fn retrieve(&self, location: &str) -> Result<Vec<u8>> {
        if is_remote(location) {
            let client = create_client(&self.config.http)?;
            download_bytes(&client, location, &self.config.http)
        } else {
            Ok(std::fs::read(location)?)
        }
    }

    fn ingest_markup<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Result<IngestOutcome> {
        let doc = MarkupDocument::parse(text, &self.config.namespace_uri)?;

        let (features, source) = extract_features(self.converter.as_ref(), &doc);
        let metadata = extract_all(&doc);
        tracing::debug!(
            ?source,
            features = features.len(),
            placemarks = metadata.len(),
            "Extracted geometry and metadata"
        );

        let properties = Synthesizer::for_markup(&self.config).synthesize(&features, &metadata, rng);
        Ok(IngestOutcome::new(properties, features))
    }

    fn ingest_geojson<R: Rng + ?Sized>(&self, bytes: &[u8], rng: &mut R) -> Result<IngestOutcome> {
        let features = retain_areal_and_linear(parse_feature_collection(bytes)?);
        let properties = Synthesizer::for_json(&self.config).synthesize(&features, &[], rng);
        Ok(IngestOutcome::new(properties, features))
    }
}

/// Last path segment of a file path or URL, without query or fragment.
fn file_name_of(location: &str) -> String {
    if is_remote(location) {
        let path = location.split(['?', '#']).next().unwrap_or(location);
        return path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(path)
            .to_string();
    }
    Path::new(location)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| location.to_string())
}
