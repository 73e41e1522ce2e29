//! Sampling resolution of a search window

use std::fmt;
use std::str::FromStr;

use crate::ApsidesError;

/// Resolution of a search window, ordered coarse to fine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Granularity {
    Day,
    Hour,
    Minute,
    Second,
}

impl Granularity {
    /// Every level of the refinement ladder, coarsest first
    pub const LADDER: [Granularity; 4] = [
        Granularity::Day,
        Granularity::Hour,
        Granularity::Minute,
        Granularity::Second,
    ];

    /// The next finer level, or `None` at `Second`
    pub fn finer(self) -> Option<Granularity> {
        match self {
            Granularity::Day => Some(Granularity::Hour),
            Granularity::Hour => Some(Granularity::Minute),
            Granularity::Minute => Some(Granularity::Second),
            Granularity::Second => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Hour => "hour",
            Granularity::Minute => "minute",
            Granularity::Second => "second",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ApsidesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "hour" => Ok(Granularity::Hour),
            "minute" => Ok(Granularity::Minute),
            "second" => Ok(Granularity::Second),
            _ => Err(ApsidesError::InvalidGranularity(s.to_string())),
        }
    }
}
