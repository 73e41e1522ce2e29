//! Orbital periods used to size the day-level search window
//!
//! Values from the NSSDC planetary fact sheets, keyed by primary then
//! secondary body. They cover the bodies found in the common DE kernels.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::constants::DEFAULT_SPAN_DAYS;

lazy_static! {
    static ref ORBITAL_DAYS: HashMap<&'static str, HashMap<&'static str, f64>> = {
        let mut table = HashMap::new();
        table.insert(
            "sun",
            HashMap::from([
                ("earth", 365.0),
                ("mercury", 88.0),
                ("venus", 224.7),
                ("mars", 687.0),
                ("jupiter", 4331.0),
                ("saturn", 10747.0),
                ("uranus", 30589.0),
                ("neptune", 59800.0),
                ("pluto", 90560.0),
            ]),
        );
        table.insert("earth", HashMap::from([("moon", 27.3)]));
        table
    };
}

/// Orbital period in days of `secondary` around `primary`, if tabulated
pub fn orbital_period(primary: &str, secondary: &str) -> Option<f64> {
    ORBITAL_DAYS
        .get(primary.to_lowercase().as_str())?
        .get(secondary.to_lowercase().as_str())
        .copied()
}

/// Day-level search span for `body1` orbiting `body2`
///
/// Pairs missing from the table fall back to half an Earth year.
pub fn search_span(body1: &str, body2: &str) -> f64 {
    orbital_period(body2, body1).unwrap_or(DEFAULT_SPAN_DAYS)
}
