//! Apsis search
//!
//! The distance between two bodies is sampled over a window of days, then
//! resampled by the hour, minute and second around the best sample so far:
//!
//! - `window`: sample times for one level of the ladder
//! - `refine`: the ladder itself, for a minimum or a maximum
//! - `apsides`: both apsides of an orbit and their labels
//! - `periods`: orbital periods that size the first window

pub mod apsides;
pub mod granularity;
pub mod periods;
pub mod refine;
pub mod window;

pub use self::apsides::{apsis_label, find_apsides, ApsidesReport, Apsis};
pub use self::granularity::Granularity;
pub use self::periods::orbital_period;
pub use self::refine::{refine, DistanceProvider, Extremum, Refinement, RefinementStep};
pub use self::window::build_window;
