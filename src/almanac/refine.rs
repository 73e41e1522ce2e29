//! Coarse-to-fine extremum search over sampled distances
//!
//! Each level of the ladder samples the distance over a window, picks the
//! extremal sample and recenters a finer window on it. The search stops once
//! the second-level window has been searched.

use std::fmt;

use log::debug;

use crate::almanac::apsides::{apsis_label, Apsis};
use crate::almanac::window::build_window;
use crate::almanac::Granularity;
use crate::time::{Time, Timescale};
use crate::{ApsidesError, Result};

/// Source of inter-body distances
///
/// Implemented by [`crate::Ephemeris`]; tests substitute analytic fakes.
pub trait DistanceProvider {
    /// Distance in kilometers between `body1` and `body2` at each time, in order
    fn distances(&self, body1: &str, body2: &str, times: &[Time]) -> Result<Vec<f64>>;
}

impl<P: DistanceProvider + ?Sized> DistanceProvider for &P {
    fn distances(&self, body1: &str, body2: &str, times: &[Time]) -> Result<Vec<f64>> {
        (**self).distances(body1, body2, times)
    }
}

/// Which extremum a search looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extremum {
    Minimum,
    Maximum,
}

impl Extremum {
    /// Label prefix of the matching apsis
    pub fn prefix(&self) -> &'static str {
        match self {
            Extremum::Minimum => "peri",
            Extremum::Maximum => "apo",
        }
    }

    /// Index of the extremal value
    ///
    /// The first index wins ties and NaN is never selected. Returns `None` when
    /// no value is comparable.
    pub fn select(&self, values: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;

        for (i, &value) in values.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, current)) => match self {
                    Extremum::Minimum => value < current,
                    Extremum::Maximum => value > current,
                },
            };
            if better {
                best = Some((i, value));
            }
        }

        best.map(|(i, _)| i)
    }
}

impl fmt::Display for Extremum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extremum::Minimum => f.write_str("minimum"),
            Extremum::Maximum => f.write_str("maximum"),
        }
    }
}

/// One level of a finished refinement
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementStep {
    pub granularity: Granularity,
    /// First sample of the window
    pub first: Time,
    /// Last sample of the window
    pub last: Time,
    /// Selected sample, the center of the next window
    pub center: Time,
    /// Unrounded distance at the selected sample
    pub distance_km: f64,
}

/// Result of [`refine`]: the apsis plus every window searched on the way
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    pub apsis: Apsis,
    pub steps: Vec<RefinementStep>,
}

/// Pinpoint the extremum of the distance between two bodies
///
/// Starts with a `granularity` window around `center` and moves one level finer
/// after each window until the second level has been searched. Body names are
/// lowercased before they reach the provider. Provider errors propagate
/// unchanged.
#[allow(clippy::too_many_arguments)]
pub fn refine<P: DistanceProvider + ?Sized>(
    ephemeris: &P,
    ts: &Timescale,
    extremum: Extremum,
    center: Time,
    body1: &str,
    body2: &str,
    granularity: Granularity,
    span_days: f64,
) -> Result<Refinement> {
    let body1 = body1.to_lowercase();
    let body2 = body2.to_lowercase();

    let mut center = center;
    let mut level = granularity;
    let mut steps = Vec::with_capacity(Granularity::LADDER.len());

    loop {
        let window = build_window(ts, &center, level, span_days)?;
        let distances = ephemeris.distances(&body1, &body2, &window)?;

        if distances.len() != window.len() {
            return Err(ApsidesError::DataError(format!(
                "Expected {} distances for the {} window, got {}",
                window.len(),
                level,
                distances.len()
            )));
        }

        let index = extremum.select(&distances).ok_or_else(|| {
            ApsidesError::DataError(format!(
                "No finite distance between {} and {} in the {} window",
                body1, body2, level
            ))
        })?;

        let step = RefinementStep {
            granularity: level,
            first: window[0],
            last: window[window.len() - 1],
            center: window[index],
            distance_km: distances[index],
        };

        debug!(
            "{} {} window {} .. {}: sample {} at {} ({:.0} km)",
            extremum, level, step.first, step.last, index, step.center, step.distance_km
        );

        let next = level.finer();
        let (time, distance_km) = (step.center, step.distance_km);
        steps.push(step);

        match next {
            Some(finer) => {
                center = time;
                level = finer;
            }
            None => {
                return Ok(Refinement {
                    apsis: Apsis {
                        time,
                        distance_km: distance_km.round() as i64,
                        label: apsis_label(extremum, &body2),
                    },
                    steps,
                });
            }
        }
    }
}
