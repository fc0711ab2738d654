//! Synthetic parcel generation.
//!
//! Used only when no real data can be obtained. Records are geometrically
//! valid (closed square rings) and carry `origin: mock` plus ids from the
//! reserved range starting at [`MOCK_ID_BASE`], so they cannot be mistaken
//! for ingested parcels.

use chrono::NaiveDate;
use rand::Rng;

use crate::config::{RecordDefaults, MOCK_ID_BASE};
use crate::types::{Geometry, LatLng, PropertyRecord, RecordOrigin};

/// Half the side length of a mock parcel, in degrees.
const HALF_SIZE: f64 = 0.0005;

/// Maximum latitude offset from the center, in degrees.
const LAT_JITTER: f64 = 0.01;

/// Maximum longitude offset from the center, in degrees.
const LNG_JITTER: f64 = 0.015;

const DISTRICTS: [&str; 4] = ["Mezzeh", "Abu Rummaneh", "Kafr Souseh", "Baramkeh"];

const STREETS: [&str; 4] = [
    "Al-Jalaa St",
    "Fayez Mansour St",
    "Baghdad St",
    "Saadallah al-Jabiri St",
];

const REGISTRATION_YEARS: std::ops::RangeInclusive<i32> = 1990..=2015;

/// Generate `count` mock records around `center` with the default record values.
///
/// # Examples
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use cadastre_ingest::mock::generate_mock;
/// use cadastre_ingest::types::LatLng;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(1);
/// let records = generate_mock(3, LatLng { lat: 0.0, lng: 0.0 }, "X", &mut rng);
/// assert_eq!(records.len(), 3);
/// assert!(records.iter().all(|r| r.location == "X" && r.is_mock()));
/// ```
pub fn generate_mock<R: Rng + ?Sized>(
    count: usize,
    center: LatLng,
    region_label: &str,
    rng: &mut R,
) -> Vec<PropertyRecord> {
    generate_mock_with(count, center, region_label, &RecordDefaults::default(), rng)
}

/// Generate mock records, taking directorate, share and transaction type from `defaults`.
pub fn generate_mock_with<R: Rng + ?Sized>(
    count: usize,
    center: LatLng,
    region_label: &str,
    defaults: &RecordDefaults,
    rng: &mut R,
) -> Vec<PropertyRecord> {
    let province = region_label
        .split('/')
        .next()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(region_label)
        .to_string();

    let records: Vec<PropertyRecord> = (0..count)
        .map(|i| {
            let lat = center.lat + rng.gen_range(-LAT_JITTER..LAT_JITTER);
            let lng = center.lng + rng.gen_range(-LNG_JITTER..LNG_JITTER);
            let area = f64::from(rng.gen_range(100_u32..1000));
            let price = rng.gen_range(100_000_u64..900_000);
            let (date, year) = registration_date(rng);
            let register_no = rng.gen_range(1000_u32..10_000);

            PropertyRecord {
                id: MOCK_ID_BASE + i as u64,
                origin: RecordOrigin::Mock,
                ada: (100 + i % 5).to_string(),
                parsel: (i + 1).to_string(),
                location: region_label.to_string(),
                province: province.clone(),
                district: DISTRICTS[i % DISTRICTS.len()].to_string(),
                directorate: defaults.directorate.clone(),
                street: STREETS[i % STREETS.len()].to_string(),
                full_address: String::new(),
                property_type: property_type(i).to_string(),
                owner_name: format!("MOCK OWNER {}", i + 1),
                owner_name_ar: None,
                area,
                area_text: format!("{area} m²"),
                price,
                registration_date: date.clone(),
                signature_date: date,
                daily_register_no: format!("{year}/{register_no}"),
                share_text: defaults.share_text.clone(),
                transaction_type: defaults.transaction_type.clone(),
                geometry: square(lat, lng),
            }
        })
        .collect();

    tracing::info!(count = records.len(), region = region_label, "Generated mock parcels");
    records
}

fn property_type(i: usize) -> &'static str {
    if i % 5 == 0 {
        "Commercial"
    } else if i % 3 == 0 {
        "Industrial"
    } else {
        "Residential"
    }
}

/// Closed five-position ring centered on `(lat, lng)`.
fn square(lat: f64, lng: f64) -> Geometry {
    Geometry::Polygon(vec![vec![
        vec![lng - HALF_SIZE, lat - HALF_SIZE],
        vec![lng + HALF_SIZE, lat - HALF_SIZE],
        vec![lng + HALF_SIZE, lat + HALF_SIZE],
        vec![lng - HALF_SIZE, lat + HALF_SIZE],
        vec![lng - HALF_SIZE, lat - HALF_SIZE],
    ]])
}

/// Random `dd/mm/yyyy` date and its year.
fn registration_date<R: Rng + ?Sized>(rng: &mut R) -> (String, i32) {
    let year = rng.gen_range(REGISTRATION_YEARS);
    let month = rng.gen_range(1..=12);
    // Day 28 exists in every month.
    let day = rng.gen_range(1..=28);
    let formatted = NaiveDate::from_ymd_opt(year, month, day)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| format!("{day:02}/{month:02}/{year}"));
    (formatted, year)
}
