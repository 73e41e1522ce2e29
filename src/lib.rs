//! Apsides: find the nearest and farthest points of an orbit from a JPL ephemeris
//!
//! This crate reads JPL SPK ephemeris kernels such as `de421.bsp` and searches
//! the distance between two bodies for its extrema, narrowing the sampling from
//! days to hours, minutes and finally seconds. The time handling and kernel
//! readers follow Python's skyfield.
//!
//! ```no_run
//! use apsides::{almanac, Loader};
//!
//! let loader = Loader::new();
//! let ephemeris = loader.load_ephemeris("de421.bsp")?;
//! let ts = loader.timescale();
//!
//! let report = almanac::find_apsides(&ephemeris, &ts, ts.utc((2019, 5, 1)), "earth", "sun")?;
//! println!("{}", report);
//! # Ok::<(), apsides::ApsidesError>(())
//! ```

use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

pub mod almanac;
pub mod constants;
pub mod data;
pub mod jplephem;
pub mod planetlib;
pub mod time;

// Re-export commonly used types
pub use almanac::{find_apsides, refine, ApsidesReport, Apsis, DistanceProvider, Extremum, Granularity};
pub use planetlib::Ephemeris;
pub use time::{CalendarTuple, Time, Timescale};

/// Main error type for the apsides library
#[derive(Debug, Error)]
pub enum ApsidesError {
    #[error("Invalid granularity: {0}")]
    InvalidGranularity(String),

    #[error("Empty {0} window")]
    EmptyWindow(Granularity),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Ephemeris error: {0}")]
    Ephemeris(#[from] jplephem::JplephemError),

    #[error("Time error: {0}")]
    Time(#[from] time::TimeError),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for apsides operations
pub type Result<T> = std::result::Result<T, ApsidesError>;

/// Entry point for loading ephemeris kernels and time scales
pub struct Loader {
    data_dir: Option<PathBuf>,
}

impl Loader {
    /// Create a new loader with default data directory
    pub fn new() -> Self {
        Self { data_dir: None }
    }

    /// Set a custom data directory
    pub fn with_data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load an SPK ephemeris by file name, downloading it if necessary
    ///
    /// With a data directory set, the kernel must already be present there.
    /// Otherwise the cache directory is consulted and filled from JPL's
    /// kernel archive on a miss.
    pub fn load_ephemeris(&self, name: &str) -> Result<Ephemeris> {
        let path = match &self.data_dir {
            Some(dir) => {
                let path = dir.join(name);
                if !path.is_file() {
                    return Err(ApsidesError::DataError(format!(
                        "{} not found in {}",
                        name,
                        dir.display()
                    )));
                }
                path
            }
            None => data::download_ephemeris(name)?,
        };

        info!("Loading ephemeris from {}", path.display());
        Ephemeris::open(&path)
    }

    /// Load a timescale for time conversions
    pub fn timescale(&self) -> Timescale {
        // Leap seconds come from the built-in table
        Timescale::default()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
