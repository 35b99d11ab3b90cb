//! Daylight Saving Time windows for the three regional policies we approximate.
//!
//! Regions are picked by longitude band, not by country. The band table is
//! data so another policy can be added without touching the localizer.

use chrono::{Datelike, Days, NaiveDate};
use std::ops::RangeInclusive;

/// Sunday in a Monday-first, zero-indexed week (`Weekday::num_days_from_monday`)
pub const SUNDAY: u32 = 6;

/// Half-open `[start, end)` range of civil dates during which DST applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DstWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DstWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// A regional DST policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstRule {
    /// 2nd Sunday of March until the 1st Sunday of November
    NorthAmerica,
    /// Last Sunday of March until the last Sunday of October
    Europe,
    /// 1st Sunday of October until the 1st Sunday of April the following year
    SouthernHemisphere,
}

impl DstRule {
    /// The window that starts in `year`
    pub fn window(self, year: i32) -> Option<DstWindow> {
        let (start, end) = match self {
            DstRule::NorthAmerica => (
                nth_weekday_of_month(year, 3, SUNDAY, 2)?,
                nth_weekday_of_month(year, 11, SUNDAY, 1)?,
            ),
            DstRule::Europe => (
                last_weekday_of_month(year, 3, SUNDAY)?,
                last_weekday_of_month(year, 10, SUNDAY)?,
            ),
            DstRule::SouthernHemisphere => (
                nth_weekday_of_month(year, 10, SUNDAY, 1)?,
                nth_weekday_of_month(year + 1, 4, SUNDAY, 1)?,
            ),
        };
        Some(DstWindow { start, end })
    }

    /// Whether DST is in force on the given local civil date.
    ///
    /// The southern window wraps the new year, so a date is inside it when it
    /// falls on or after this year's start OR before the end of the window
    /// that began the previous October.
    pub fn is_active(self, date: NaiveDate) -> bool {
        let year = date.year();
        let in_window = |y: i32| self.window(y).is_some_and(|w| w.contains(date));

        match self {
            DstRule::NorthAmerica | DstRule::Europe => in_window(year),
            DstRule::SouthernHemisphere => in_window(year) || in_window(year - 1),
        }
    }
}

/// Longitude band mapped to the DST policy used inside it
#[derive(Debug, Clone)]
pub struct Region {
    pub name: &'static str,
    pub longitudes: RangeInclusive<f64>,
    pub rule: DstRule,
}

/// Checked in order; the first band containing the longitude wins
pub const REGIONS: &[Region] = &[
    Region {
        name: "north-america",
        longitudes: -170.0..=-50.0,
        rule: DstRule::NorthAmerica,
    },
    Region {
        name: "europe",
        longitudes: -25.0..=45.0,
        rule: DstRule::Europe,
    },
    Region {
        name: "australia",
        longitudes: 110.0..=180.0,
        rule: DstRule::SouthernHemisphere,
    },
];

/// Finds the DST region for a longitude, if any
pub fn region_for_longitude(longitude: f64) -> Option<&'static Region> {
    REGIONS
        .iter()
        .find(|region| region.longitudes.contains(&longitude))
}

/// The `n`th (1-based) occurrence of `weekday` in a month.
///
/// `weekday` uses Monday = 0 .. Sunday = 6.
pub fn nth_weekday_of_month(year: i32, month: u32, weekday: u32, n: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let shift = (weekday + 7 - first.weekday().num_days_from_monday()) % 7;
    let days = u64::from(shift) + 7 * u64::from(n.checked_sub(1)?);
    first.checked_add_days(Days::new(days))
}

/// The last occurrence of `weekday` in a month (Monday = 0 .. Sunday = 6)
pub fn last_weekday_of_month(year: i32, month: u32, weekday: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    let shift = (last.weekday().num_days_from_monday() + 7 - weekday) % 7;
    last.checked_sub_days(Days::new(u64::from(shift)))
}
