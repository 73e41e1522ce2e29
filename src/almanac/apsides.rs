//! Nearest and farthest approach of one body to another

use std::fmt;

use log::info;
use serde::Serialize;

use crate::almanac::periods::search_span;
use crate::constants::AU_KM;
use crate::almanac::refine::{refine, DistanceProvider, Extremum};
use crate::almanac::Granularity;
use crate::time::{Time, Timescale};
use crate::Result;

/// A located apsis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Apsis {
    #[serde(rename = "date")]
    pub time: Time,
    /// Distance rounded to the nearest kilometer
    pub distance_km: i64,
    /// `aphelion`, `perigee`, ... or a bare `apo`/`peri` for other primaries
    #[serde(rename = "description")]
    pub label: String,
}

/// Both apsides of `body1` around `body2` found after a start date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApsidesReport {
    pub body1: String,
    pub body2: String,
    pub furthest: Apsis,
    pub nearest: Apsis,
    pub delta_km: i64,
}

/// Name of the apsis found by `extremum` for an orbit around `body2`
pub fn apsis_label(extremum: Extremum, body2: &str) -> String {
    let suffix = match body2.to_lowercase().as_str() {
        "earth" => "gee",
        "sun" => "helion",
        _ => "",
    };
    format!("{}{}", extremum.prefix(), suffix).replace("apoh", "aph")
}

/// Find the next apsides of `body1` around `body2` from `date_start`
///
/// The day-level window spans the orbital period of the pair, or 187 days when
/// the pair is not tabulated. The farthest point is searched first.
pub fn find_apsides<P: DistanceProvider + ?Sized>(
    ephemeris: &P,
    ts: &Timescale,
    date_start: Time,
    body1: &str,
    body2: &str,
) -> Result<ApsidesReport> {
    let span_days = search_span(body1, body2);
    info!(
        "Searching apsides of {} around {} over {} days from {}",
        body1, body2, span_days, date_start
    );

    let search = |extremum: Extremum| {
        refine(
            ephemeris,
            ts,
            extremum,
            date_start,
            body1,
            body2,
            Granularity::Day,
            span_days,
        )
        .map(|refinement| refinement.apsis)
    };

    let furthest = search(Extremum::Maximum)?;
    let nearest = search(Extremum::Minimum)?;

    Ok(ApsidesReport {
        body1: body1.to_string(),
        body2: body2.to_string(),
        delta_km: furthest.distance_km - nearest.distance_km,
        furthest,
        nearest,
    })
}

impl fmt::Display for Apsis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<11} {}  {:>12} km  ({:.6} AU)",
            self.label,
            self.time,
            self.distance_km,
            self.distance_km as f64 / AU_KM
        )
    }
}

impl fmt::Display for ApsidesReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} around {}", self.body1, self.body2)?;
        writeln!(f, "  {}", self.furthest)?;
        writeln!(f, "  {}", self.nearest)?;
        write!(f, "  {:<11} {:>37} km", "delta", self.delta_km)
    }
}
