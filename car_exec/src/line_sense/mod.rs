//! # Line sensing module
//!
//! Interprets reflectance readings. Two independent views are taken of each
//! reading:
//!
//! - [`PosEstimator`] reduces the reading to a single position of the line
//!   under the array, on a 1..=N scale.
//! - [`TurnDetector`] classifies the reading as either a partial line (normal
//!   following) or a near-uniform reading, which is the signature of an
//!   intersection, a perpendicular line, or a gap.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod pos_est;
mod turn_det;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::TurnDetParams;
pub use pos_est::*;
pub use turn_det::*;
