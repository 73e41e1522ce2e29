//! Sample windows for each level of the refinement ladder
//!
//! A window varies one calendar field of its center around the center's UTC
//! calendar value, leaving finer fields at zero. Out-of-range field values
//! (hour `-3`, minute `75`) are normalized by [`Timescale::utc`].

use crate::almanac::Granularity;
use crate::time::{Time, Timescale};
use crate::{ApsidesError, Result};

/// Hours on either side of the center in an hour window
const HOUR_HALF_WIDTH: i32 = 24;
/// Minutes on either side of the center in a minute window
const MINUTE_HALF_WIDTH: i32 = 60;
/// Seconds on either side of the center in a second window
const SECOND_HALF_WIDTH: i32 = 60;
/// Longest day window, a little over Pluto's orbital period
pub const MAX_SPAN_DAYS: f64 = 100_000.0;

/// Build the ordered sample times of a window around `center`
///
/// Day windows start at midnight UTC on the center's date and run forward for
/// `round(span_days)` days. Hour, minute and second windows are centered on the
/// center's hour, minute and whole second, with 48, 120 and 120 samples.
pub fn build_window(
    ts: &Timescale,
    center: &Time,
    granularity: Granularity,
    span_days: f64,
) -> Result<Vec<Time>> {
    let cal = center.utc_calendar();
    let (year, month, day) = (cal.year, cal.month as i32, cal.day as i32);
    let (hour, minute) = (cal.hour as i32, cal.minute as i32);

    let window: Vec<Time> = match granularity {
        Granularity::Day => {
            if span_days > MAX_SPAN_DAYS {
                return Err(ApsidesError::DataError(format!(
                    "Day span of {} days exceeds the {} day limit",
                    span_days, MAX_SPAN_DAYS
                )));
            }
            // NaN and negative spans give no samples
            let days = span_days.round().max(0.0) as i32;
            (day..day + days)
                .map(|d| ts.utc((year, month, d)))
                .collect()
        }
        Granularity::Hour => (hour - HOUR_HALF_WIDTH..hour + HOUR_HALF_WIDTH)
            .map(|h| ts.utc((year, month, day, h, 0, 0.0)))
            .collect(),
        Granularity::Minute => (minute - MINUTE_HALF_WIDTH..minute + MINUTE_HALF_WIDTH)
            .map(|m| ts.utc((year, month, day, hour, m, 0.0)))
            .collect(),
        Granularity::Second => {
            let second = cal.second.floor() as i32;
            (second - SECOND_HALF_WIDTH..second + SECOND_HALF_WIDTH)
                .map(|s| ts.utc((year, month, day, hour, minute, s as f64)))
                .collect()
        }
    };

    if window.is_empty() {
        return Err(ApsidesError::EmptyWindow(granularity));
    }

    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const SECOND: f64 = 1.0 / 86_400.0;

    fn assert_spacing(window: &[Time], days: f64) {
        for pair in window.windows(2) {
            assert_relative_eq!(pair[1] - pair[0], days, epsilon = 1e-3 * SECOND);
        }
    }

    #[rstest]
    #[case(Granularity::Hour, 48, 1.0 / 24.0)]
    #[case(Granularity::Minute, 120, 1.0 / 1440.0)]
    #[case(Granularity::Second, 120, SECOND)]
    fn test_fixed_window_sizes(#[case] level: Granularity, #[case] len: usize, #[case] step: f64) {
        let ts = Timescale::default();
        let center = ts.utc((2019, 7, 4, 22, 10, 42.0));
        let window = build_window(&ts, &center, level, 187.0).unwrap();

        assert_eq!(window.len(), len);
        assert_spacing(&window, step);
        assert!(window[0] <= center && center <= window[len - 1]);
    }

    #[test]
    fn test_day_window_runs_forward_from_midnight() {
        let ts = Timescale::default();
        let center = ts.utc((2019, 5, 1, 13, 30, 0.0));
        let window = build_window(&ts, &center, Granularity::Day, 365.0).unwrap();

        assert_eq!(window.len(), 365);
        assert_spacing(&window, 1.0);
        assert_eq!(window[0].utc_iso(), "2019-05-01T00:00:00Z");
        assert_eq!(window[364].utc_iso(), "2020-04-29T00:00:00Z");
    }

    #[test]
    fn test_day_window_rounds_span() {
        let ts = Timescale::default();
        let center = ts.utc((2019, 12, 25));
        let window = build_window(&ts, &center, Granularity::Day, 27.3).unwrap();
        assert_eq!(window.len(), 27);
        assert_eq!(window[26].utc_iso(), "2020-01-20T00:00:00Z");
    }

    #[test]
    fn test_hour_window_crosses_days() {
        let ts = Timescale::default();
        let center = ts.utc((2020, 1, 1, 2, 45, 0.0));
        let window = build_window(&ts, &center, Granularity::Hour, 0.0).unwrap();

        assert_eq!(window[0].utc_iso(), "2019-12-31T02:00:00Z");
        assert_eq!(window[47].utc_iso(), "2020-01-02T01:00:00Z");
    }

    #[test]
    fn test_second_window_truncates_fraction() {
        let ts = Timescale::default();
        let center = ts.utc((2020, 1, 13, 20, 21, 30.75));
        let window = build_window(&ts, &center, Granularity::Second, 0.0).unwrap();

        assert_eq!(window[0].utc_iso(), "2020-01-13T20:20:30Z");
        assert_eq!(window[60].utc_iso(), "2020-01-13T20:21:30Z");
        assert_eq!(window[119].utc_iso(), "2020-01-13T20:22:29Z");
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.4)]
    #[case(-10.0)]
    #[case(f64::NAN)]
    fn test_empty_day_window(#[case] span: f64) {
        let ts = Timescale::default();
        let center = ts.utc((2019, 5, 1));
        let err = build_window(&ts, &center, Granularity::Day, span).unwrap_err();
        assert!(matches!(err, ApsidesError::EmptyWindow(Granularity::Day)));
    }

    #[rstest]
    #[case(MAX_SPAN_DAYS + 1.0)]
    #[case(3.0e9)]
    #[case(f64::INFINITY)]
    fn test_oversized_day_window(#[case] span: f64) {
        let ts = Timescale::default();
        let center = ts.utc((2019, 5, 1));
        let err = build_window(&ts, &center, Granularity::Day, span).unwrap_err();
        assert!(matches!(err, ApsidesError::DataError(_)));
    }

    #[test]
    fn test_longest_day_window() {
        let ts = Timescale::default();
        let center = ts.utc((2019, 5, 1));
        let window = build_window(&ts, &center, Granularity::Day, MAX_SPAN_DAYS).unwrap();
        assert_eq!(window.len(), MAX_SPAN_DAYS as usize);
    }
}
