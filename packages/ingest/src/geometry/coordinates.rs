//! Parsing of KML `<coordinates>` text.
//!
//! KML coordinates are whitespace-separated `lng,lat[,elevation]` tuples.
//! Hand-edited files sometimes pad the commas (`36.1, 33.5`); that padding is
//! removed before splitting.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use crate::types::Position;

#[allow(clippy::expect_used)] // Static pattern
static PADDED_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*,\s*").expect("valid comma pattern"));

fn tuples(text: &str) -> Cow<'_, str> {
    PADDED_COMMA.replace_all(text, ",")
}

/// Parse every tuple, failing on the first malformed one.
///
/// Positions keep the dimension they were written with.
///
/// # Returns
/// The parsed positions, or the offending tuple
pub fn parse_strict(text: &str) -> Result<Vec<Position>, String> {
    tuples(text)
        .split_whitespace()
        .map(|token| parse_tuple(token).ok_or_else(|| token.to_string()))
        .collect()
}

/// Parse tuples leniently, discarding malformed ones.
///
/// Every position is three-dimensional; a missing or unreadable elevation
/// becomes `0`.
///
/// # Examples
/// ```
/// use cadastre_ingest::geometry::parse_lenient;
///
/// let positions = parse_lenient("36.1,33.5 bogus 36.2,33.6,12 7");
/// assert_eq!(positions, vec![vec![36.1, 33.5, 0.0], vec![36.2, 33.6, 12.0]]);
/// ```
pub fn parse_lenient(text: &str) -> Vec<Position> {
    tuples(text)
        .split_whitespace()
        .filter_map(|token| {
            let mut parts = token.split(',');
            let lng = parse_number(parts.next()?)?;
            let lat = parse_number(parts.next()?)?;
            let elevation = parts.next().and_then(parse_number).unwrap_or(0.0);
            Some(vec![lng, lat, elevation])
        })
        .collect()
}

fn parse_tuple(token: &str) -> Option<Position> {
    let parts: Vec<&str> = token.split(',').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    parts.into_iter().map(parse_number).collect()
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
