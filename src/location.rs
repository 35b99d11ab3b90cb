//! Parsing of the free-text location field found in Saved Media exports.
//!
//! The export writes locations as `"Latitude, Longitude: 38.73, -77.28"`.
//! Items without a fix carry `0.0, 0.0`, which is treated as "no location"
//! rather than a point in the Gulf of Guinea.

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    /// Builds a coordinate, rejecting out-of-range values and the (0, 0) sentinel
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        if latitude == 0.0 && longitude == 0.0 {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
        })
    }
}

/// Extracts a coordinate from a manifest location string.
///
/// Never fails: absent, malformed or sentinel input all yield `None`.
pub fn parse_location(text: Option<&str>) -> Option<GeoCoordinate> {
    let text = text?;
    let (_, values) = text.split_once(':')?;

    let mut parts = values.split(',');
    let latitude = parts.next()?.trim().parse::<f64>().ok()?;
    let longitude = parts.next()?.trim().parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }

    GeoCoordinate::new(latitude, longitude)
}
