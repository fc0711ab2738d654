//! KMZ archive unwrapping and markup decoding.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::config::KML_EXTENSION;
use crate::error::{IngestError, Result};

/// Extract the KML document held in a KMZ archive.
///
/// The first entry whose name ends in `.kml` (ignoring case) is decoded as
/// UTF-8; other entries such as images are ignored.
///
/// # Arguments
/// * `bytes` - Raw archive bytes
/// * `archive_name` - Name used in error messages
pub fn unwrap_kmz(bytes: &[u8], archive_name: &str) -> Result<String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| IngestError::malformed("KMZ", e))?;

    let kml_name = archive
        .file_names()
        .find(|name| name.to_lowercase().ends_with(KML_EXTENSION))
        .map(str::to_string)
        .ok_or_else(|| IngestError::MissingInnerDocument {
            archive: archive_name.to_string(),
        })?;

    tracing::debug!(archive = archive_name, entry = %kml_name, "Found KML entry");

    let mut entry = archive
        .by_name(&kml_name)
        .map_err(|e| IngestError::malformed("KMZ", e))?;
    let mut raw = Vec::new();
    entry
        .read_to_end(&mut raw)
        .map_err(|e| IngestError::malformed("KMZ", e))?;

    decode_markup(raw)
}

/// Decode raw KML bytes as UTF-8 text.
pub fn decode_markup(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| IngestError::malformed("KML", e))
}
