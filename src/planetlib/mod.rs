//! Planetary ephemeris calculations module
//!
//! An SPK kernel stores each body relative to some center, e.g. the Moon
//! relative to the Earth-Moon barycenter and the barycenter relative to the
//! solar system barycenter. Positions are found by walking those segments back
//! to the solar system barycenter and summing them.

use std::path::Path;

use log::debug;
use nalgebra::Vector3;

use crate::almanac::DistanceProvider;
use crate::jplephem::names::{self, targets};
use crate::jplephem::SPK;
use crate::time::Time;
use crate::{ApsidesError, Result};

/// Longest center chain followed before giving up
const MAX_CHAIN_LENGTH: usize = 8;

/// Planetary ephemeris backed by an SPK kernel
pub struct Ephemeris {
    spk: SPK,
}

impl Ephemeris {
    /// Open an SPK kernel such as `de421.bsp`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_spk(SPK::open(path)?))
    }

    pub fn from_spk(spk: SPK) -> Self {
        Self { spk }
    }

    /// The underlying kernel
    pub fn spk(&self) -> &SPK {
        &self.spk
    }

    /// Resolve a body name (or numeric SPICE id) to its id
    pub fn body_id(&self, name: &str) -> Result<i32> {
        names::target_id(name)
            .ok_or_else(|| ApsidesError::ObjectNotFound(format!("Unknown body name {:?}", name)))
    }

    /// The `(center, target)` segments leading from the barycenter to `target`
    fn chain(&self, name: &str, target: i32) -> Result<Vec<(i32, i32)>> {
        let mut chain = Vec::new();
        let mut body = target;

        while body != targets::SOLAR_SYSTEM_BARYCENTER {
            if chain.len() == MAX_CHAIN_LENGTH {
                return Err(ApsidesError::DataError(format!(
                    "Segment chain for {} does not reach the solar system barycenter",
                    name
                )));
            }
            let center = self.spk.center_of(body).ok_or_else(|| {
                ApsidesError::ObjectNotFound(format!(
                    "No ephemeris segment for {} ({}) in {}",
                    name,
                    body,
                    self.spk.daf.path.display()
                ))
            })?;
            chain.push((center, body));
            body = center;
        }

        debug!("Segment chain for {}: {:?}", name, chain);
        Ok(chain)
    }

    fn position_along(&self, chain: &[(i32, i32)], time: &Time) -> Result<Vector3<f64>> {
        let (tdb, tdb2) = time.tdb_seconds_from_j2000();
        chain.iter().try_fold(Vector3::zeros(), |position, &(center, target)| {
            Ok(position + self.spk.compute(center, target, tdb, tdb2)?)
        })
    }

    /// Barycentric position of a body in kilometers
    pub fn position(&self, body: &str, time: &Time) -> Result<Vector3<f64>> {
        let chain = self.chain(body, self.body_id(body)?)?;
        self.position_along(&chain, time)
    }

    /// Distance between two bodies in kilometers
    pub fn distance(&self, body1: &str, body2: &str, time: &Time) -> Result<f64> {
        Ok(self
            .distances(body1, body2, std::slice::from_ref(time))?
            .remove(0))
    }
}

impl DistanceProvider for Ephemeris {
    fn distances(&self, body1: &str, body2: &str, times: &[Time]) -> Result<Vec<f64>> {
        let chain1 = self.chain(body1, self.body_id(body1)?)?;
        let chain2 = self.chain(body2, self.body_id(body2)?)?;

        times
            .iter()
            .map(|time| {
                let p1 = self.position_along(&chain1, time)?;
                let p2 = self.position_along(&chain2, time)?;
                Ok((p1 - p2).norm())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jplephem::tests::{write_spk, SyntheticSegment};
    use crate::time::Timescale;
    use approx::assert_relative_eq;

    /// Fixed positions valid from 1968 to 2031
    fn synthetic_ephemeris() -> (tempfile::TempDir, Ephemeris) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("synthetic.bsp");
        let (init, intlen) = (-1.0e9, 2.0e9);
        write_spk(
            &path,
            &[
                SyntheticSegment::linear(0, 10, init, intlen, [1000.0, 0.0], [0.0, 0.0], [0.0, 0.0]),
                SyntheticSegment::linear(0, 3, init, intlen, [0.0, 0.0], [2000.0, 0.0], [0.0, 0.0]),
                SyntheticSegment::linear(3, 399, init, intlen, [0.0, 0.0], [10.0, 0.0], [0.0, 0.0]),
                SyntheticSegment::linear(3, 301, init, intlen, [0.0, 0.0], [-500.0, 0.0], [0.0, 0.0]),
            ],
        );
        let ephemeris = Ephemeris::open(&path).unwrap();
        (dir, ephemeris)
    }

    #[test]
    fn test_position_follows_chain() {
        let (_dir, ephemeris) = synthetic_ephemeris();
        let t = Timescale::default().utc((2019, 5, 1));

        let earth = ephemeris.position("earth", &t).unwrap();
        assert_relative_eq!(earth, Vector3::new(0.0, 2010.0, 0.0), epsilon = 1e-9);

        let moon = ephemeris.position("Moon", &t).unwrap();
        assert_relative_eq!(moon, Vector3::new(0.0, 1500.0, 0.0), epsilon = 1e-9);

        let sun = ephemeris.position("10", &t).unwrap();
        assert_relative_eq!(sun, Vector3::new(1000.0, 0.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_distances() {
        let (_dir, ephemeris) = synthetic_ephemeris();
        let ts = Timescale::default();
        let times = [ts.utc((2019, 5, 1)), ts.utc((2020, 1, 5, 12, 0, 0.0))];

        let distances = ephemeris.distances("earth", "sun", &times).unwrap();
        assert_eq!(distances.len(), 2);
        let expected = (1000.0_f64.powi(2) + 2010.0_f64.powi(2)).sqrt();
        assert_relative_eq!(distances[0], expected, epsilon = 1e-9);
        assert_relative_eq!(distances[1], expected, epsilon = 1e-9);

        let moon = ephemeris.distance("moon", "earth", &times[0]).unwrap();
        assert_relative_eq!(moon, 510.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unknown_bodies() {
        let (_dir, ephemeris) = synthetic_ephemeris();
        let t = Timescale::default().utc((2019, 5, 1));

        assert!(matches!(
            ephemeris.position("vulcan", &t),
            Err(ApsidesError::ObjectNotFound(_))
        ));
        // A real body with no segment in this kernel
        assert!(matches!(
            ephemeris.distances("mars", "sun", &[t]),
            Err(ApsidesError::ObjectNotFound(_))
        ));
    }

    #[test]
    fn test_outside_coverage() {
        let (_dir, ephemeris) = synthetic_ephemeris();
        let t = Timescale::default().utc((2100, 1, 1));

        assert!(matches!(
            ephemeris.position("earth", &t),
            Err(ApsidesError::Ephemeris(_))
        ));
    }
}
