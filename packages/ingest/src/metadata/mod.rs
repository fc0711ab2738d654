//! Placemark metadata: structured `ExtendedData` plus legacy description rules.

mod extractor;
mod legacy;

pub use extractor::{
    extract_all, extract_placemark, split_parcel_id, PlacemarkMetadata, PARCEL_NO_KEY,
};
pub use legacy::{fill_from_description, LegacyRule, Matcher, LEGACY_RULES};
