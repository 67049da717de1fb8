//! # Drive control module
//!
//! Drive control keeps the car centred on the line. The error is the
//! distance between the estimated line position and the centre of the
//! sensor array, which a PID controller turns into a differential duty cycle
//! between the two wheels.
//!
//! The differential is split symmetrically about a common-mode speed which
//! is lowered by half the differential magnitude, so the faster wheel never
//! exceeds the requested forward speed. Inside a curve zone the forward
//! speed drops to the turn speed and the proportional and derivative terms
//! are boosted to track the tighter curvature.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod controller;
mod params;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use controller::*;
pub use params::DriveCtrlParams;
