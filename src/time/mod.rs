//! Time module for astronomical time calculations
//!
//! This module provides functionality for working with astronomical time scales,
//! conversions between them, and computing with calendar dates. It is inspired by
//! the Python Skyfield library's time handling.
//!
//! Calendar fields passed to [`Timescale::utc`] may lie outside their natural
//! range (hour `-1`, minute `70`, day `190`): they are normalized by carrying
//! into the next coarser field, the same way Skyfield treats them.

use crate::constants::{DAY_MS, DAY_S, GREGORIAN_START, J2000, TT_MINUS_TAI, TT_MINUS_TAI_S};
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};
use thiserror::Error;

/// Error type for time operations
#[derive(Debug, Error)]
pub enum TimeError {
    #[error("Calendar error: {0}")]
    CalendarError(String),
}

/// Result type for time operations
pub type Result<T> = std::result::Result<T, TimeError>;

/// UTC Julian dates at which a new TAI-UTC offset took effect
const LEAP_SECOND_TABLE: &[(f64, i32)] = &[
    (2441317.5, 10), // 1972-01-01
    (2441499.5, 11), // 1972-07-01
    (2441683.5, 12), // 1973-01-01
    (2442048.5, 13), // 1974-01-01
    (2442413.5, 14), // 1975-01-01
    (2442778.5, 15), // 1976-01-01
    (2443144.5, 16), // 1977-01-01
    (2443509.5, 17), // 1978-01-01
    (2443874.5, 18), // 1979-01-01
    (2444239.5, 19), // 1980-01-01
    (2444786.5, 20), // 1981-07-01
    (2445151.5, 21), // 1982-07-01
    (2445516.5, 22), // 1983-07-01
    (2446247.5, 23), // 1985-07-01
    (2447161.5, 24), // 1988-01-01
    (2447892.5, 25), // 1990-01-01
    (2448257.5, 26), // 1991-01-01
    (2448804.5, 27), // 1992-07-01
    (2449169.5, 28), // 1993-07-01
    (2449534.5, 29), // 1994-07-01
    (2450083.5, 30), // 1996-01-01
    (2450630.5, 31), // 1997-07-01
    (2451179.5, 32), // 1999-01-01
    (2453736.5, 33), // 2006-01-01
    (2454832.5, 34), // 2009-01-01
    (2456109.5, 35), // 2012-07-01
    (2457204.5, 36), // 2015-07-01
    (2457754.5, 37), // 2017-01-01
];

/// Calendar tuple for representing a date and time
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarTuple {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: f64,
}

/// Raw calendar fields, any of which may be out of its natural range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarInput {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub second: f64,
}

impl From<(i32, i32, i32)> for CalendarInput {
    fn from(date: (i32, i32, i32)) -> Self {
        CalendarInput {
            year: date.0,
            month: date.1,
            day: date.2,
            hour: 0,
            minute: 0,
            second: 0.0,
        }
    }
}

impl From<(i32, i32, i32, i32, i32, f64)> for CalendarInput {
    fn from(t: (i32, i32, i32, i32, i32, f64)) -> Self {
        CalendarInput {
            year: t.0,
            month: t.1,
            day: t.2,
            hour: t.3,
            minute: t.4,
            second: t.5,
        }
    }
}

impl From<CalendarTuple> for CalendarInput {
    fn from(cal: CalendarTuple) -> Self {
        CalendarInput {
            year: cal.year,
            month: cal.month as i32,
            day: cal.day as i32,
            hour: cal.hour as i32,
            minute: cal.minute as i32,
            second: cal.second,
        }
    }
}

/// Represents a time scale for astronomical calculations
#[derive(Debug, Clone)]
pub struct Timescale {
    /// UTC Julian dates of each leap second
    leap_utc: Vec<f64>,
    /// The same instants expressed as TAI Julian dates
    leap_tai: Vec<f64>,
    /// TAI-UTC in seconds from each leap date onwards
    leap_offsets: Vec<f64>,
    /// Julian date for cutoff between Julian and Gregorian calendars
    julian_calendar_cutoff: Option<i32>,
}

impl Default for Timescale {
    fn default() -> Self {
        let (dates, offsets) = LEAP_SECOND_TABLE.iter().copied().unzip();
        Self::new(dates, offsets, Some(GREGORIAN_START))
    }
}

impl Timescale {
    /// Create a new timescale from leap second data
    ///
    /// `leap_dates` are UTC Julian dates in increasing order and `leap_offsets`
    /// the TAI-UTC value in seconds that applies from each date onwards.
    pub fn new(
        leap_dates: Vec<f64>,
        leap_offsets: Vec<i32>,
        julian_calendar_cutoff: Option<i32>,
    ) -> Self {
        let leap_offsets: Vec<f64> = leap_offsets.into_iter().map(f64::from).collect();
        let leap_tai = leap_dates
            .iter()
            .zip(&leap_offsets)
            .map(|(date, offset)| date + offset / DAY_S)
            .collect();

        Self {
            leap_utc: leap_dates,
            leap_tai,
            leap_offsets,
            julian_calendar_cutoff,
        }
    }

    /// Get the current time
    pub fn now(&self) -> Time {
        self.from_datetime(Utc::now())
    }

    /// Create a time from a UTC datetime
    pub fn from_datetime(&self, dt: DateTime<Utc>) -> Time {
        self.utc((
            dt.year(),
            dt.month() as i32,
            dt.day() as i32,
            dt.hour() as i32,
            dt.minute() as i32,
            dt.second() as f64 + dt.nanosecond() as f64 / 1_000_000_000.0,
        ))
    }

    /// Create a time from a UTC date and time
    pub fn utc<T: Into<CalendarInput>>(&self, date: T) -> Time {
        let input = date.into();
        let (whole, fraction) = self.calendar_to_jd_with_fraction(&input);
        self.utc_jd(whole, Some(fraction))
    }

    /// Create a time from a UTC Julian date
    pub fn utc_jd(&self, jd: f64, fraction: Option<f64>) -> Time {
        let (whole, fraction) = split_jd(jd, fraction);
        let leap_seconds = self.leap_offset_utc(whole + fraction);
        Time::from_parts(
            whole,
            fraction + (leap_seconds + TT_MINUS_TAI_S) / DAY_S,
            leap_seconds,
        )
    }

    /// Create a time from a TT Julian date
    pub fn tt_jd(&self, jd: f64, fraction: Option<f64>) -> Time {
        let (whole, fraction) = split_jd(jd, fraction);
        let leap_seconds = self.leap_offset_tai(whole + fraction - TT_MINUS_TAI);
        Time::from_parts(whole, fraction, leap_seconds)
    }

    /// TAI-UTC in seconds at the given UTC Julian date
    fn leap_offset_utc(&self, jd_utc: f64) -> f64 {
        match self.leap_utc.partition_point(|&date| date <= jd_utc) {
            0 => 0.0, // Before first leap second
            i => self.leap_offsets[i - 1],
        }
    }

    /// TAI-UTC in seconds at the given TAI Julian date
    fn leap_offset_tai(&self, jd_tai: f64) -> f64 {
        match self.leap_tai.partition_point(|&date| date <= jd_tai) {
            0 => 0.0,
            i => self.leap_offsets[i - 1],
        }
    }

    /// Convert a calendar date to Julian date with separate whole and fraction parts
    ///
    /// The whole part is the Julian date of midnight starting the (normalized)
    /// calendar day; the fraction carries hours, minutes and seconds and may
    /// fall outside `[0, 1)` when those fields are out of range.
    pub fn calendar_to_jd_with_fraction(&self, input: &CalendarInput) -> (f64, f64) {
        let jd = self.julian_day(input.year, input.month, input.day);
        let seconds = input.hour as f64 * 3600.0 + input.minute as f64 * 60.0 + input.second;

        // Julian days start at noon
        (jd as f64 - 0.5, seconds / DAY_S)
    }

    /// Convert a Julian date, split into whole and fraction, to a calendar tuple
    ///
    /// The time of day is rounded to the nearest millisecond.
    pub fn jd_to_calendar(&self, whole: f64, fraction: f64) -> CalendarTuple {
        // Shift to a midnight epoch
        let shifted = whole + 0.5;
        let day = shifted.floor();
        let ms = ((shifted - day + fraction) * DAY_MS).round() as i64;
        let day_ms = DAY_MS as i64;

        let jdn = day as i32 + ms.div_euclid(day_ms) as i32;
        let ms_of_day = ms.rem_euclid(day_ms);

        let (year, month, day) = self.julian_day_to_calendar_date(jdn);

        CalendarTuple {
            year,
            month,
            day,
            hour: (ms_of_day / 3_600_000) as u32,
            minute: (ms_of_day % 3_600_000 / 60_000) as u32,
            second: (ms_of_day % 60_000) as f64 / 1000.0,
        }
    }

    /// Normalize a month value to the range 1-12, adjusting the year as needed
    fn normalize_month(year: i32, month: i32) -> (i32, i32) {
        let month_0 = month - 1;
        (year + month_0.div_euclid(12), month_0.rem_euclid(12) + 1)
    }

    /// Calculate Julian day number from calendar date
    ///
    /// This follows the algorithm in the Explanatory Supplement to the Astronomical Almanac 15.11,
    /// which is also used by Skyfield. Days beyond the end of the month (or below 1)
    /// roll over linearly.
    pub fn julian_day(&self, year: i32, month: i32, day: i32) -> i32 {
        let (year, month) = Self::normalize_month(year, month);

        let janfeb = month <= 2;
        let g = year + 4716 - if janfeb { 1 } else { 0 };
        let f = (month + 9) % 12;
        let e = 1461 * g / 4 + day - 1402;
        let mut j = e + (153 * f + 2) / 5;

        let use_gregorian = match self.julian_calendar_cutoff {
            Some(cutoff) => j >= cutoff,
            None => true,
        };

        if use_gregorian {
            j += 38 - (g + 184) / 100 * 3 / 4;
        }

        j
    }

    /// Convert Julian day number to calendar date
    ///
    /// This follows the algorithm in the Explanatory Supplement to the Astronomical Almanac 15.11,
    /// which is also used by Skyfield.
    pub fn julian_day_to_calendar_date(&self, jd: i32) -> (i32, u32, u32) {
        let use_gregorian = match self.julian_calendar_cutoff {
            Some(cutoff) => jd >= cutoff,
            None => true,
        };

        let mut f = jd + 1401;
        if use_gregorian {
            f += (4 * jd + 274277) / 146097 * 3 / 4 - 38;
        }

        let e = 4 * f + 3;
        let g = (e % 1461) / 4;
        let h = 5 * g + 2;

        let day = (h % 153) / 5 + 1;
        let month = ((h / 153) + 2) % 12 + 1;
        let year = e / 1461 - 4716 + (12 + 2 - month) / 12;

        (year, month as u32, day as u32)
    }
}

/// Split a Julian date into whole and fraction parts
fn split_jd(jd: f64, fraction: Option<f64>) -> (f64, f64) {
    match fraction {
        Some(f) => (jd, f),
        None => {
            let whole = jd.floor();
            (whole, jd - whole)
        }
    }
}

/// Represents astronomical time with high precision
///
/// A `Time` is a TT Julian date split into whole and fractional days, plus the
/// TAI-UTC offset in force at that instant so that it can be turned back into
/// a UTC calendar date without consulting the timescale again.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    /// Whole part of the Julian date
    whole: f64,
    /// TT fraction of day (TT - whole), kept in `[0, 1)`
    tt_fraction: f64,
    /// TAI-UTC in seconds at this instant
    leap_seconds: f64,
}

impl Time {
    fn from_parts(whole: f64, tt_fraction: f64, leap_seconds: f64) -> Self {
        let carry = tt_fraction.floor();
        Time {
            whole: whole + carry,
            tt_fraction: tt_fraction - carry,
            leap_seconds,
        }
    }

    /// Get the TT (Terrestrial Time) as Julian date
    pub fn tt(&self) -> f64 {
        self.whole + self.tt_fraction
    }

    /// Get the TAI (International Atomic Time) as Julian date
    pub fn tai(&self) -> f64 {
        self.whole + self.tt_fraction - TT_MINUS_TAI
    }

    /// Get UTC as Julian date
    pub fn utc_jd(&self) -> f64 {
        self.whole + self.utc_fraction()
    }

    fn utc_fraction(&self) -> f64 {
        self.tt_fraction - (TT_MINUS_TAI_S + self.leap_seconds) / DAY_S
    }

    /// TAI-UTC in seconds at this instant
    pub fn leap_seconds(&self) -> f64 {
        self.leap_seconds
    }

    /// Get the TDB (Barycentric Dynamical Time) as Julian date
    pub fn tdb(&self) -> f64 {
        self.tt() + tdb_minus_tt(self.tt()) / DAY_S
    }

    /// TDB seconds since J2000.0, split into a large and a small part
    ///
    /// Ephemeris segments take the two parts separately so that the sum keeps
    /// sub-millisecond precision.
    pub fn tdb_seconds_from_j2000(&self) -> (f64, f64) {
        (
            (self.whole - J2000) * DAY_S,
            self.tt_fraction * DAY_S + tdb_minus_tt(self.tt()),
        )
    }

    /// Get the UTC calendar tuple
    pub fn utc_calendar(&self) -> CalendarTuple {
        Timescale::default().jd_to_calendar(self.whole, self.utc_fraction())
    }

    /// Get the TT calendar tuple
    pub fn tt_calendar(&self) -> CalendarTuple {
        Timescale::default().jd_to_calendar(self.whole, self.tt_fraction)
    }

    /// Get the UTC datetime
    pub fn utc_datetime(&self) -> Result<DateTime<Utc>> {
        let cal = self.utc_calendar();
        let second = cal.second.floor();
        let nano = ((cal.second - second) * 1_000_000_000.0).round() as u32;

        let naive = NaiveDate::from_ymd_opt(cal.year, cal.month, cal.day)
            .and_then(|date| date.and_hms_nano_opt(cal.hour, cal.minute, second as u32, nano))
            .ok_or_else(|| {
                TimeError::CalendarError(format!(
                    "{:04}-{:02}-{:02} is not representable",
                    cal.year, cal.month, cal.day
                ))
            })?;

        Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
    }

    /// Format UTC time as ISO 8601 string, to the whole second
    pub fn utc_iso(&self) -> String {
        let cal = self.utc_calendar();
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            cal.year, cal.month, cal.day, cal.hour, cal.minute, cal.second as u32
        )
    }
}

/// TDB - TT difference in seconds
fn tdb_minus_tt(jd_tdb: f64) -> f64 {
    // Implementation of USNO Circular 179, eq. 2.6
    let t = (jd_tdb - J2000) / 36525.0;

    0.001657 * f64::sin(628.3076 * t + 6.2401)
        + 0.000022 * f64::sin(575.3385 * t + 4.2970)
        + 0.000014 * f64::sin(1256.6152 * t + 6.1969)
        + 0.000005 * f64::sin(606.9777 * t + 4.0212)
        + 0.000005 * f64::sin(52.9691 * t + 0.4444)
        + 0.000002 * f64::sin(21.3299 * t + 5.5431)
        + 0.000010 * t * f64::sin(628.3076 * t + 4.2490)
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cal = self.utc_calendar();
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
            cal.year, cal.month, cal.day, cal.hour, cal.minute, cal.second as u32
        )
    }
}

impl Serialize for Time {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.utc_iso())
    }
}

impl Add<f64> for Time {
    type Output = Time;

    fn add(self, days: f64) -> Self::Output {
        Time::from_parts(self.whole, self.tt_fraction + days, self.leap_seconds)
    }
}

impl Sub<Time> for Time {
    type Output = f64;

    fn sub(self, other: Time) -> Self::Output {
        // Return the difference in days
        (self.whole - other.whole) + (self.tt_fraction - other.tt_fraction)
    }
}

impl PartialEq for Time {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Time {}

impl PartialOrd for Time {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Time {
    fn cmp(&self, other: &Self) -> Ordering {
        self.whole
            .total_cmp(&other.whole)
            .then_with(|| self.tt_fraction.total_cmp(&other.tt_fraction))
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(dt: DateTime<Utc>) -> Self {
        Timescale::default().from_datetime(dt)
    }
}
