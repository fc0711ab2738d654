//! Per-placemark metadata extraction.

use std::collections::BTreeMap;

use roxmltree::Node;

use super::legacy::fill_from_description;
use crate::config::MISSING;
use crate::xml::{collect_text, get_text, ElementLocator, MarkupDocument};

/// Key under which a structured `ada/parsel` identifier may be stored.
pub const PARCEL_NO_KEY: &str = "parcel_no";

/// Metadata gathered from one placemark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacemarkMetadata {
    /// Position in the document's placemark list.
    pub index: usize,

    /// Trimmed text of the `name` element, if any.
    pub name: Option<String>,

    /// Block number derived from `name`, or `---`.
    pub ada: String,

    /// Parcel number derived from `name`, or `---`.
    pub parsel: String,

    /// Structured fields first, legacy description values for the rest.
    pub fields: BTreeMap<String, String>,
}

impl PlacemarkMetadata {
    /// Non-empty value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Split an identifier of the form `ada/parsel`.
///
/// Both parts are trimmed. A missing or empty part becomes `---`.
///
/// # Examples
/// ```
/// use cadastre_ingest::metadata::split_parcel_id;
///
/// assert_eq!(split_parcel_id("12/34"), ("12".to_string(), "34".to_string()));
/// assert_eq!(split_parcel_id(" 7 "), ("7".to_string(), "---".to_string()));
/// ```
#[must_use]
pub fn split_parcel_id(value: &str) -> (String, String) {
    let mut parts = value.splitn(2, '/');
    let part = |p: Option<&str>| {
        p.map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(MISSING)
            .to_string()
    };
    let ada = part(parts.next());
    let parsel = part(parts.next());
    (ada, parsel)
}

/// Extract metadata for every placemark, in placemark-index order.
pub fn extract_all(doc: &MarkupDocument<'_>) -> Vec<PlacemarkMetadata> {
    let locator = doc.locator();
    doc.placemarks()
        .into_iter()
        .enumerate()
        .map(|(index, placemark)| extract_placemark(&locator, placemark, index))
        .collect()
}

/// Extract metadata from a single placemark.
///
/// Sources, in precedence order: `ExtendedData` `Data` entries, `SchemaData`
/// `SimpleData` entries, then the legacy rules over the HTML description.
pub fn extract_placemark(
    locator: &ElementLocator<'_>,
    placemark: Node<'_, '_>,
    index: usize,
) -> PlacemarkMetadata {
    let name = locator
        .find_first(placemark, "name")
        .map(get_text)
        .filter(|n| !n.is_empty());

    let (ada, parsel) = match &name {
        Some(name) => split_parcel_id(name),
        None => (MISSING.to_string(), MISSING.to_string()),
    };

    let mut fields = BTreeMap::new();
    collect_extended_data(locator, placemark, &mut fields);

    if let Some(description) = locator.find_first(placemark, "description") {
        fill_from_description(&collect_text(description), &mut fields);
    }

    PlacemarkMetadata {
        index,
        name,
        ada,
        parsel,
        fields,
    }
}

/// `Data` entries contribute `name` → `value`; `SimpleData` entries
/// contribute `name` → text. Entries without a name are skipped. Later
/// duplicates replace earlier ones.
fn collect_extended_data(
    locator: &ElementLocator<'_>,
    placemark: Node<'_, '_>,
    fields: &mut BTreeMap<String, String>,
) {
    let Some(extended) = locator.find_first(placemark, "ExtendedData") else {
        return;
    };

    for data in locator.find_all(extended, "Data") {
        let Some(key) = data.attribute("name") else {
            continue;
        };
        let value = locator
            .find_first(data, "value")
            .map(|v| collect_text(v).trim().to_string())
            .unwrap_or_default();
        fields.insert(key.to_string(), value);
    }

    // Populated data wins over schema data of the same name.
    for simple in locator.find_all(extended, "SimpleData") {
        let Some(key) = simple.attribute("name") else {
            continue;
        };
        let value = collect_text(simple).trim().to_string();
        let existing = fields.get(key).is_some_and(|v| !v.is_empty());
        if !existing {
            fields.insert(key.to_string(), value);
        }
    }
}
