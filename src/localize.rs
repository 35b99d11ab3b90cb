//! Conversion of UTC capture times into estimated local civil time.
//!
//! The offset is a coarse longitude bucket (15 degrees per hour), adjusted by
//! one hour when the regional DST rule for that longitude band is in force.
//! No timezone database is consulted.

use chrono::{NaiveDateTime, TimeDelta};

use crate::dst::region_for_longitude;
use crate::location::GeoCoordinate;

/// Timestamp format used by the manifest (`2025-06-15 12:00:00 UTC`)
pub const MANIFEST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// A UTC timestamp together with the adjustments applied to localize it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalizedTimestamp {
    /// Original capture time in UTC
    pub utc: NaiveDateTime,
    /// Whole-hour longitude bucket offset
    pub offset_hours: i64,
    /// Name of the DST region the longitude fell into, if any
    pub region: Option<&'static str>,
    /// Whether the extra DST hour was added
    pub dst: bool,
    /// Resulting naive local civil time
    pub local: NaiveDateTime,
}

/// Parses a manifest capture timestamp
pub fn parse_capture_time(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), MANIFEST_TIME_FORMAT).ok()
}

/// Hours east of UTC for a longitude.
///
/// Uses `f64::round`, so exact half buckets round away from zero:
/// 7.5° is +1 h and -7.5° is -1 h.
pub fn offset_hours(longitude: f64) -> i64 {
    (longitude / 15.0).round() as i64
}

/// Localizes `utc` at `coordinate`, keeping the intermediate decisions
pub fn localize(utc: NaiveDateTime, coordinate: Option<GeoCoordinate>) -> LocalizedTimestamp {
    let Some(coordinate) = coordinate else {
        return LocalizedTimestamp {
            utc,
            offset_hours: 0,
            region: None,
            dst: false,
            local: utc,
        };
    };

    let offset_hours = offset_hours(coordinate.longitude);
    let standard = utc + TimeDelta::hours(offset_hours);

    let region = region_for_longitude(coordinate.longitude);
    let dst = region.is_some_and(|r| r.rule.is_active(standard.date()));
    let local = if dst {
        standard + TimeDelta::hours(1)
    } else {
        standard
    };

    LocalizedTimestamp {
        utc,
        offset_hours,
        region: region.map(|r| r.name),
        dst,
        local,
    }
}

/// Local civil time for `utc` at `coordinate`; `utc` itself when there is no location
pub fn convert(utc: NaiveDateTime, coordinate: Option<GeoCoordinate>) -> NaiveDateTime {
    localize(utc, coordinate).local
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str) -> NaiveDateTime {
        parse_capture_time(text).unwrap()
    }

    fn coord(latitude: f64, longitude: f64) -> Option<GeoCoordinate> {
        GeoCoordinate::new(latitude, longitude)
    }

    #[test]
    fn test_parse_capture_time() {
        let parsed = parse_capture_time("2025-06-15 12:00:00 UTC").unwrap();
        assert_eq!(parsed.to_string(), "2025-06-15 12:00:00");

        assert!(parse_capture_time("2025-06-15T12:00:00Z").is_none());
        assert!(parse_capture_time("").is_none());
        assert!(parse_capture_time("2025-13-40 12:00:00 UTC").is_none());
    }

    #[test]
    fn test_no_coordinate_passes_through() {
        let utc = at("2025-06-15 12:00:00 UTC");
        assert_eq!(convert(utc, None), utc);

        let localized = localize(utc, None);
        assert_eq!(localized.offset_hours, 0);
        assert!(!localized.dst);
        assert!(localized.region.is_none());
    }

    #[test]
    fn test_new_york_summer() {
        let localized = localize(at("2025-06-15 12:00:00 UTC"), coord(40.0, -74.0));
        assert_eq!(localized.offset_hours, -5);
        assert!(localized.dst);
        assert_eq!(localized.region, Some("north-america"));
        assert_eq!(localized.local, at("2025-06-15 08:00:00 UTC"));
    }

    #[test]
    fn test_new_york_winter() {
        let local = convert(at("2025-01-15 12:00:00 UTC"), coord(40.0, -74.0));
        assert_eq!(local, at("2025-01-15 07:00:00 UTC"));
    }

    #[test]
    fn test_dst_decided_on_local_date() {
        // 04:00 UTC on the changeover Sunday is still Saturday evening locally
        let local = convert(at("2025-03-09 04:00:00 UTC"), coord(40.0, -74.0));
        assert_eq!(local, at("2025-03-08 23:00:00 UTC"));

        let local = convert(at("2025-03-09 06:00:00 UTC"), coord(40.0, -74.0));
        assert_eq!(local, at("2025-03-09 02:00:00 UTC"));
    }

    #[test]
    fn test_europe_and_australia() {
        let paris = convert(at("2025-06-15 12:00:00 UTC"), coord(48.85, 2.35));
        assert_eq!(paris, at("2025-06-15 13:00:00 UTC"));

        let sydney_summer = convert(at("2025-01-10 00:00:00 UTC"), coord(-33.87, 151.2));
        assert_eq!(sydney_summer, at("2025-01-10 11:00:00 UTC"));

        let sydney_winter = convert(at("2025-07-10 00:00:00 UTC"), coord(-33.87, 151.2));
        assert_eq!(sydney_winter, at("2025-07-10 10:00:00 UTC"));
    }

    #[test]
    fn test_outside_dst_bands() {
        // New Delhi: 77.2 / 15 = 5.15 -> +5, no DST band
        let localized = localize(at("2025-06-15 12:00:00 UTC"), coord(28.6, 77.2));
        assert_eq!(localized.offset_hours, 5);
        assert!(!localized.dst);
        assert_eq!(localized.local, at("2025-06-15 17:00:00 UTC"));
    }

    #[test]
    fn test_half_bucket_rounding() {
        assert_eq!(offset_hours(7.5), 1);
        assert_eq!(offset_hours(-7.5), -1);
        assert_eq!(offset_hours(22.5), 2);
        assert_eq!(offset_hours(-22.5), -2);
        assert_eq!(offset_hours(7.49), 0);
        assert_eq!(offset_hours(172.5), 12);
        assert_eq!(offset_hours(180.0), 12);
        assert_eq!(offset_hours(-180.0), -12);
    }

    #[test]
    fn test_offset_bounded_and_deterministic() {
        let utc = at("2024-12-31 23:30:00 UTC");
        let mut longitude = -180.0;
        while longitude <= 180.0 {
            let first = localize(utc, coord(10.0, longitude));
            let second = localize(utc, coord(10.0, longitude));
            assert_eq!(first, second);

            assert!(first.offset_hours.abs() <= 12);
            let shift = (first.local - utc).num_hours();
            assert_eq!(shift, first.offset_hours + i64::from(first.dst));
            assert!(shift.abs() <= 13);

            longitude += 0.25;
        }
    }
}
