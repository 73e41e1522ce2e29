//! Standard SPICE target names and ID numbers
//!
//! This module provides mappings between celestial body names and ID numbers
//! used in the JPL ephemerides. Name lookups ignore case.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Map from target ID numbers to canonical names
    static ref TARGET_NAMES: HashMap<i32, &'static str> = {
        let mut m = HashMap::new();
        // Later pairs are the canonical spelling
        for &(id, name) in TARGET_NAME_PAIRS.iter() {
            m.insert(id, name);
        }
        m
    };

    /// Map from lowercase target names to ID numbers
    static ref TARGET_IDS: HashMap<String, i32> = {
        let mut m = HashMap::new();
        for &(id, name) in TARGET_NAME_PAIRS.iter() {
            m.insert(name.to_lowercase(), id);
        }
        m
    };
}

/// Get the name of a target given its ID number
pub fn target_name(id: i32) -> Option<&'static str> {
    TARGET_NAMES.get(&id).copied()
}

/// Get the ID number of a target given its name
///
/// Numeric strings are accepted as raw SPICE IDs.
pub fn target_id(name: &str) -> Option<i32> {
    let name = name.trim();
    TARGET_IDS
        .get(&name.to_lowercase())
        .copied()
        .or_else(|| name.parse().ok())
}

/// Title-case a target name if it looks safe to do so
pub fn titlecase(name: &str) -> String {
    if name.starts_with(['1', 'C', 'D']) {
        name.to_string()
    } else {
        name.split_whitespace()
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(c) => c
                        .to_uppercase()
                        .chain(chars.flat_map(|c| c.to_lowercase()))
                        .collect(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    }
}

/// Pairs of (id, name) for celestial bodies
const TARGET_NAME_PAIRS: &[(i32, &str)] = &[
    (0, "SOLAR_SYSTEM_BARYCENTER"),
    (0, "SSB"),
    (0, "SOLAR SYSTEM BARYCENTER"),
    (1, "MERCURY_BARYCENTER"),
    (1, "MERCURY BARYCENTER"),
    (2, "VENUS_BARYCENTER"),
    (2, "VENUS BARYCENTER"),
    (3, "EARTH_BARYCENTER"),
    (3, "EMB"),
    (3, "EARTH MOON BARYCENTER"),
    (3, "EARTH-MOON BARYCENTER"),
    (3, "EARTH BARYCENTER"),
    (4, "MARS_BARYCENTER"),
    (4, "MARS BARYCENTER"),
    (5, "JUPITER_BARYCENTER"),
    (5, "JUPITER BARYCENTER"),
    (6, "SATURN_BARYCENTER"),
    (6, "SATURN BARYCENTER"),
    (7, "URANUS_BARYCENTER"),
    (7, "URANUS BARYCENTER"),
    (8, "NEPTUNE_BARYCENTER"),
    (8, "NEPTUNE BARYCENTER"),
    (9, "PLUTO_BARYCENTER"),
    (9, "PLUTO BARYCENTER"),
    (10, "SUN"),
    (199, "MERCURY"),
    (299, "VENUS"),
    (399, "EARTH"),
    (301, "MOON"),
    (499, "MARS"),
    (401, "PHOBOS"),
    (402, "DEIMOS"),
    (599, "JUPITER"),
    (501, "IO"),
    (502, "EUROPA"),
    (503, "GANYMEDE"),
    (504, "CALLISTO"),
    (699, "SATURN"),
    (606, "TITAN"),
    (799, "URANUS"),
    (899, "NEPTUNE"),
    (801, "TRITON"),
    (999, "PLUTO"),
    (901, "CHARON"),
];

/// Common target name/ID pairs used in applications
pub mod targets {
    /// Solar System Barycenter
    pub const SOLAR_SYSTEM_BARYCENTER: i32 = 0;
    /// Earth-Moon Barycenter
    pub const EARTH_MOON_BARYCENTER: i32 = 3;
    /// Sun
    pub const SUN: i32 = 10;
    /// Earth
    pub const EARTH: i32 = 399;
    /// Moon
    pub const MOON: i32 = 301;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(target_id("earth"), Some(targets::EARTH));
        assert_eq!(target_id("Moon"), Some(targets::MOON));
        assert_eq!(target_id("SUN"), Some(targets::SUN));
        assert_eq!(target_id("Earth Barycenter"), Some(targets::EARTH_MOON_BARYCENTER));
        assert_eq!(target_id("vulcan"), None);
    }

    #[test]
    fn test_numeric_ids() {
        assert_eq!(target_id("399"), Some(399));
        assert_eq!(target_id(" 10 "), Some(10));
    }

    #[test]
    fn test_names() {
        assert_eq!(target_name(301), Some("MOON"));
        assert_eq!(target_name(0), Some("SOLAR SYSTEM BARYCENTER"));
        assert_eq!(titlecase("EARTH BARYCENTER"), "Earth Barycenter");
        assert_eq!(titlecase("MOON"), "Moon");
    }
}
