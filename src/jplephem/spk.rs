//! Spacecraft Planet Kernel (SPK) format handling
//!
//! This module provides functionality for reading NASA SPICE SPK files which
//! contain position data for solar system bodies.
//!
//! The SPK format is described in:
//! http://naif.jpl.nasa.gov/pub/naif/toolkit_docs/FORTRAN/req/spk.html
use crate::constants::{DAY_S, J2000};
use crate::jplephem::chebyshev::ChebyshevPolynomial;
use crate::jplephem::daf::DAF;
use crate::jplephem::errors::{JplephemError, Result};
use crate::jplephem::names;
use crate::time::Timescale;
use log::{debug, warn};
use nalgebra::Vector3;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Convert seconds since J2000 to Julian date
pub fn seconds_to_jd(seconds: f64) -> f64 {
    J2000 + seconds / DAY_S
}

/// Spacecraft Planet Kernel (SPK) file reader
pub struct SPK {
    /// The underlying DAF file
    pub daf: DAF,
    /// List of segments in the file
    pub segments: Vec<Segment>,
    /// Map of (center, target) pairs to segment indices
    pairs: HashMap<(i32, i32), Vec<usize>>,
}

/// A segment in an SPK file containing position data for a specific body
pub struct Segment {
    /// Source of the segment (e.g., "DE-0421LE-0421")
    pub source: String,
    /// Initial epoch in seconds since J2000
    pub start_second: f64,
    /// Final epoch in seconds since J2000
    pub end_second: f64,
    /// Target body ID
    pub target: i32,
    /// Center body ID
    pub center: i32,
    /// Reference frame ID
    pub frame: i32,
    /// Data type (2: position only, 3: position and velocity)
    pub data_type: i32,
    /// Start index in the file
    pub start_i: usize,
    /// End index in the file
    pub end_i: usize,
    /// Start Julian date
    pub start_jd: f64,
    /// End Julian date
    pub end_jd: f64,
    /// Coefficients, decoded on first use
    data: OnceLock<SegmentData>,
}

/// Decoded segment data
struct SegmentData {
    /// Initial epoch (TDB seconds past J2000)
    init: f64,
    /// Interval length in seconds (duration of each logical record)
    intlen: f64,
    /// Number of records
    n_records: usize,
    /// Record size in double-precision words
    record_size: usize,
    /// Chebyshev coefficients per component
    n_coeffs: usize,
    /// All records back to back, directory excluded
    coefficients: Vec<f64>,
}

impl SPK {
    /// Open an SPK file at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let daf = DAF::open(path)?;

        let mut spk = SPK {
            daf,
            segments: Vec::new(),
            pairs: HashMap::new(),
        };

        spk.parse_segments()?;
        Ok(spk)
    }

    /// Parse segments from the DAF file
    fn parse_segments(&mut self) -> Result<()> {
        if self.daf.nd != 2 || self.daf.ni != 6 {
            return Err(JplephemError::InvalidFormat(format!(
                "SPK segment descriptors need ND=2, NI=6, found ND={}, NI={}",
                self.daf.nd, self.daf.ni
            )));
        }

        for (name, values) in self.daf.summaries()? {
            // Skip records that are empty padding
            if values.iter().all(|&v| v == 0.0) {
                continue;
            }

            // Two epochs, then target, center, frame, data type, start and end word
            let start_second = values[0];
            let end_second = values[1];
            let target = values[2] as i32;
            let center = values[3] as i32;
            let frame = values[4] as i32;
            let data_type = values[5] as i32;
            let start_i = values[6] as usize;
            let end_i = values[7] as usize;

            if start_i == 0 || end_i < start_i {
                warn!(
                    "Skipping segment {} -> {} with bad word range {}..{}",
                    center, target, start_i, end_i
                );
                continue;
            }

            let source = String::from_utf8_lossy(&name)
                .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
                .to_string();

            let segment = Segment {
                source,
                start_second,
                end_second,
                target,
                center,
                frame,
                data_type,
                start_i,
                end_i,
                start_jd: seconds_to_jd(start_second),
                end_jd: seconds_to_jd(end_second),
                data: OnceLock::new(),
            };

            debug!("Found segment {}", segment);

            let idx = self.segments.len();
            self.segments.push(segment);
            self.pairs.entry((center, target)).or_default().push(idx);
        }

        Ok(())
    }

    /// Return the first segment for the given center and target body IDs
    pub fn get_segment(&self, center: i32, target: i32) -> Result<&Segment> {
        self.pairs
            .get(&(center, target))
            .and_then(|indices| indices.first())
            .map(|&idx| &self.segments[idx])
            .ok_or(JplephemError::BodyNotFound { center, target })
    }

    /// Return the center that the given target is measured from, if any segment has it
    pub fn center_of(&self, target: i32) -> Option<i32> {
        self.segments
            .iter()
            .find(|segment| segment.target == target)
            .map(|segment| segment.center)
    }

    /// Compute the position of `target` relative to `center` in kilometers
    ///
    /// When several segments cover the same pair, the one whose time span
    /// contains the requested epoch is used.
    pub fn compute(&self, center: i32, target: i32, tdb: f64, tdb2: f64) -> Result<Vector3<f64>> {
        let indices = self
            .pairs
            .get(&(center, target))
            .ok_or(JplephemError::BodyNotFound { center, target })?;

        let et = tdb + tdb2;
        let segment = indices
            .iter()
            .map(|&idx| &self.segments[idx])
            .find(|segment| segment.covers(et))
            .unwrap_or(&self.segments[indices[0]]);

        segment.compute(&self.daf, tdb, tdb2)
    }
}

impl Segment {
    /// Whether the segment has data for the given TDB seconds past J2000
    pub fn covers(&self, et: f64) -> bool {
        self.start_second <= et && et <= self.end_second
    }

    /// Compute position at the given time
    ///
    /// The time is TDB seconds past J2000, split in two so that callers can
    /// keep precision; the parts are only ever summed after subtracting the
    /// record epoch.
    pub fn compute(&self, daf: &DAF, tdb: f64, tdb2: f64) -> Result<Vector3<f64>> {
        let et = tdb + tdb2;
        if !self.covers(et) {
            return Err(self.out_of_range(et));
        }

        let data = self.load_data(daf)?;

        let elapsed = (tdb - data.init) + tdb2;
        let mut index = (elapsed / data.intlen).floor();
        let mut offset = elapsed - index * data.intlen;

        // The final epoch belongs to the last record
        if index as usize == data.n_records {
            index -= 1.0;
            offset += data.intlen;
        }
        if index < 0.0 || index as usize >= data.n_records {
            return Err(self.out_of_range(et));
        }

        let start = index as usize * data.record_size;
        // Skip the record midpoint and radius
        let coeffs = &data.coefficients[start + 2..start + data.record_size];
        let n = data.n_coeffs;

        let s = (2.0 * offset / data.intlen - 1.0).clamp(-1.0, 1.0);

        Ok(Vector3::new(
            ChebyshevPolynomial::new(&coeffs[..n]).evaluate(s),
            ChebyshevPolynomial::new(&coeffs[n..2 * n]).evaluate(s),
            ChebyshevPolynomial::new(&coeffs[2 * n..3 * n]).evaluate(s),
        ))
    }

    fn out_of_range(&self, et: f64) -> JplephemError {
        JplephemError::OutOfRangeError {
            jd: seconds_to_jd(et),
            start_jd: self.start_jd,
            end_jd: self.end_jd,
        }
    }

    /// Load the segment data if not already loaded
    fn load_data(&self, daf: &DAF) -> Result<&SegmentData> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }

        let array = daf.read_array(self.start_i, self.end_i)?;
        let data = SegmentData::parse(self.data_type, array)?;

        debug!(
            "Loaded {} records of {} coefficients for {}",
            data.n_records, data.n_coeffs, self
        );

        Ok(self.data.get_or_init(|| data))
    }

    /// Return a textual description of the segment
    pub fn describe(&self, verbose: bool) -> String {
        let ts = Timescale::default();
        let start = ts.jd_to_calendar(self.start_jd, 0.0);
        let end = ts.jd_to_calendar(self.end_jd, 0.0);

        let center_name = names::target_name(self.center)
            .map(names::titlecase)
            .unwrap_or_else(|| "Unknown center".to_string());
        let target_name = names::target_name(self.target)
            .map(names::titlecase)
            .unwrap_or_else(|| "Unknown target".to_string());

        let mut text = format!(
            "{}-{:02}-{:02}..{}-{:02}-{:02}  Type {}  {} ({}) -> {} ({})",
            start.year,
            start.month,
            start.day,
            end.year,
            end.month,
            end.day,
            self.data_type,
            center_name,
            self.center,
            target_name,
            self.target
        );

        if verbose {
            let source = if self.source.is_empty() {
                "Unknown"
            } else {
                &self.source
            };
            text.push_str(&format!("\n  frame={} source={}", self.frame, source));
        }

        text
    }
}

impl SegmentData {
    /// Split a raw segment array into its records and directory
    ///
    /// The last 4 values in the array are the directory:
    /// init, intlen, rsize, n_rec
    fn parse(data_type: i32, mut array: Vec<f64>) -> Result<Self> {
        let components = match data_type {
            2 => 3, // x, y, z
            3 => 6, // x, y, z, dx/dt, dy/dt, dz/dt
            _ => return Err(JplephemError::UnsupportedDataType(data_type)),
        };

        let n = array.len();
        if n < 4 {
            return Err(JplephemError::InvalidFormat(format!(
                "Segment data array too small for Type {}",
                data_type
            )));
        }

        let init = array[n - 4];
        let intlen = array[n - 3];
        let record_size = array[n - 2] as usize;
        let n_records = array[n - 1] as usize;

        if intlen <= 0.0 || record_size < 2 + components || (record_size - 2) % components != 0 {
            return Err(JplephemError::InvalidFormat(format!(
                "Invalid Type {} directory: intlen={}, rsize={}",
                data_type, intlen, record_size
            )));
        }

        let expected_size = n_records * record_size + 4;
        if n != expected_size {
            return Err(JplephemError::InvalidFormat(format!(
                "Inconsistent array size: expected {}, got {}",
                expected_size, n
            )));
        }

        array.truncate(n - 4);

        Ok(SegmentData {
            init,
            intlen,
            n_records,
            record_size,
            n_coeffs: (record_size - 2) / components,
            coefficients: array,
        })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe(false))
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe(true))
    }
}
