//! Property record synthesis.
//!
//! Each filtered feature becomes one [`PropertyRecord`]. Field values are
//! resolved from three sources in order: the metadata of the placemark the
//! feature came from, the feature's own inline properties, then computed
//! values or configured defaults.

use rand::Rng;
use serde_json::{Map, Value};

use crate::config::{IngestConfig, PriceRange, MISSING};
use crate::metadata::{split_parcel_id, PlacemarkMetadata, PARCEL_NO_KEY};
use crate::types::{Feature, Geometry, PropertyRecord, RecordOrigin};

/// Builds property records for one ingestion call.
#[derive(Debug, Clone, Copy)]
pub struct Synthesizer<'a> {
    config: &'a IngestConfig,
    default_location: &'a str,
}

impl<'a> Synthesizer<'a> {
    /// Synthesizer for features converted from KML placemarks.
    #[must_use]
    pub fn for_markup(config: &'a IngestConfig) -> Self {
        Self {
            config,
            default_location: &config.defaults.location,
        }
    }

    /// Synthesizer for GeoJSON features, which use their own default location.
    #[must_use]
    pub fn for_json(config: &'a IngestConfig) -> Self {
        Self {
            config,
            default_location: &config.defaults.json_location,
        }
    }

    /// Build one record per feature.
    ///
    /// `metadata` is looked up by each feature's placemark index; features
    /// without one (GeoJSON) use inline properties only. Features without
    /// polygon or line geometry are skipped.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        features: &[Feature],
        metadata: &[PlacemarkMetadata],
        rng: &mut R,
    ) -> Vec<PropertyRecord> {
        let mut records = Vec::with_capacity(features.len());

        for feature in features {
            let Some(geometry) = feature.geometry.as_ref().filter(|g| g.is_areal_or_linear())
            else {
                tracing::warn!(
                    geometry = ?feature.geometry.as_ref().map(Geometry::type_name),
                    "Skipping feature without polygon or line geometry"
                );
                continue;
            };

            let meta = feature
                .placemark_index
                .and_then(|index| metadata.get(index).filter(|m| m.index == index));
            if feature.placemark_index.is_some() && meta.is_none() {
                tracing::warn!(placemark = ?feature.placemark_index, "No metadata for placemark");
            }

            let fields = FieldSources {
                meta,
                inline: &feature.properties,
            };
            let position = records.len();
            records.push(self.record(position, feature, &fields, geometry.clone(), rng));
        }

        records
    }

    fn record<R: Rng + ?Sized>(
        &self,
        position: usize,
        feature: &Feature,
        fields: &FieldSources<'_>,
        geometry: Geometry,
        rng: &mut R,
    ) -> PropertyRecord {
        let defaults = &self.config.defaults;

        let id = inline_id(fields.inline)
            .or_else(|| feature.id.as_ref().and_then(value_as_u64))
            .unwrap_or(position as u64 + 1);

        let (ada, parsel) = fields.parcel_ids();

        let area = fields.area();
        let area_text = fields
            .text("area_text", &["area_text"])
            .unwrap_or_else(|| {
                if area > 0.0 {
                    format!("{area} m²")
                } else {
                    MISSING.to_string()
                }
            });

        let price = fields
            .price()
            .unwrap_or_else(|| placeholder_price(self.config.price_range, rng));

        let registration_date = fields
            .text("registration_date", &["registration_date"])
            .or_else(|| fields.text("signature_date", &["signature_date"]))
            .unwrap_or_default();
        let signature_date = fields
            .text("signature_date", &["signature_date"])
            .unwrap_or_else(|| registration_date.clone());

        PropertyRecord {
            id,
            origin: RecordOrigin::Ingested,
            ada,
            parsel,
            location: fields
                .text("district", &["location", "MAHALLE"])
                .unwrap_or_else(|| self.default_location.to_string()),
            province: fields
                .text("province", &["province"])
                .unwrap_or_else(|| defaults.province.clone()),
            district: fields.text("district", &["district"]).unwrap_or_default(),
            directorate: fields
                .text("directorate", &["directorate"])
                .unwrap_or_else(|| defaults.directorate.clone()),
            street: fields.text("street", &["street"]).unwrap_or_default(),
            full_address: fields
                .text("full_address", &["full_address"])
                .unwrap_or_default(),
            property_type: fields
                .text("property_type", &["type", "CINSI"])
                .unwrap_or_else(|| defaults.property_type.clone()),
            owner_name: fields
                .text("owner_name", &["owner_name", "owner", "AD_SOYAD"])
                .unwrap_or_else(|| defaults.owner_name.clone()),
            owner_name_ar: fields.text("owner_name_ar", &["owner_name_ar"]),
            area,
            area_text,
            price,
            registration_date,
            signature_date,
            daily_register_no: fields
                .text("daily_register_no", &["daily_register_no"])
                .unwrap_or_default(),
            share_text: fields
                .text("share_text", &["share_text"])
                .unwrap_or_else(|| defaults.share_text.clone()),
            transaction_type: fields
                .text("transaction_type", &["transaction_type"])
                .unwrap_or_else(|| defaults.transaction_type.clone()),
            geometry,
        }
    }
}

/// Placemark metadata and inline properties of one feature.
struct FieldSources<'a> {
    meta: Option<&'a PlacemarkMetadata>,
    inline: &'a Map<String, Value>,
}

impl FieldSources<'_> {
    fn meta(&self, key: &str) -> Option<&str> {
        self.meta.and_then(|m| m.get(key))
    }

    fn inline(&self, key: &str) -> Option<String> {
        self.inline.get(key).and_then(value_as_text)
    }

    /// Metadata `meta_key`, else the first populated inline key.
    fn text(&self, meta_key: &str, inline_keys: &[&str]) -> Option<String> {
        self.meta(meta_key)
            .map(str::to_string)
            .or_else(|| inline_keys.iter().find_map(|key| self.inline(key)))
    }

    fn parcel_ids(&self) -> (String, String) {
        if let Some(meta) = self.meta.filter(|m| m.ada != MISSING || m.parsel != MISSING) {
            return (meta.ada.clone(), meta.parsel.clone());
        }
        if let Some(parcel_no) = self.meta(PARCEL_NO_KEY) {
            return split_parcel_id(parcel_no);
        }

        let ada = self.inline("ada");
        let parsel = self.inline("parsel");
        if ada.is_some() || parsel.is_some() {
            return (
                ada.unwrap_or_else(|| MISSING.to_string()),
                parsel.unwrap_or_else(|| MISSING.to_string()),
            );
        }
        if let Some(parcel_no) = self.inline("PARSEL_NO") {
            return split_parcel_id(&parcel_no);
        }
        (MISSING.to_string(), MISSING.to_string())
    }

    fn area(&self) -> f64 {
        if let Some(area) = self.meta("area") {
            return coerce_area(area);
        }
        ["area", "ALAN"]
            .iter()
            .find_map(|key| match self.inline.get(*key)? {
                Value::Number(n) => n.as_f64(),
                Value::String(s) if !s.trim().is_empty() => Some(coerce_area(s)),
                _ => None,
            })
            .filter(|area| area.is_finite() && *area >= 0.0)
            .unwrap_or(0.0)
    }

    fn price(&self) -> Option<u64> {
        if let Some(price) = self.meta("price").and_then(digits_as_u64) {
            return Some(price);
        }
        match self.inline.get("price")? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
            Value::String(s) => digits_as_u64(s),
            _ => None,
        }
    }
}

/// Numeric area from free text: everything but digits and `.` is stripped,
/// parsing stops at a second decimal point, unparsable text is 0.
///
/// # Examples
/// ```
/// use cadastre_ingest::synth::coerce_area;
///
/// assert_eq!(coerce_area("245.5 m²"), 245.5);
/// assert_eq!(coerce_area("1,250 m²"), 1250.0);
/// assert_eq!(coerce_area("bilinmiyor"), 0.0);
/// ```
#[must_use]
pub fn coerce_area(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let numeric = match cleaned.match_indices('.').nth(1) {
        Some((second_dot, _)) => &cleaned[..second_dot],
        None => cleaned.as_str(),
    };
    numeric.parse::<f64>().unwrap_or(0.0)
}

/// Whole currency units: the fraction after the first `.` is dropped and
/// grouping separators are ignored.
fn digits_as_u64(text: &str) -> Option<u64> {
    let whole = text.split('.').next().unwrap_or_default();
    let digits: String = whole.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn placeholder_price<R: Rng + ?Sized>(range: PriceRange, rng: &mut R) -> u64 {
    if range.min >= range.max {
        return range.min;
    }
    rng.gen_range(range.min..range.max)
}

fn inline_id(properties: &Map<String, Value>) -> Option<u64> {
    properties.get("id").and_then(value_as_u64)
}

fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
