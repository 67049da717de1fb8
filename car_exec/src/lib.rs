//! # Line follower library.
//!
//! The navigation core of a line following car, and the host-side pieces
//! needed to run it against a simulated track.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data store - per-cycle data of the executable
pub mod data_store;

/// Drive control - PID controller turning position error into wheel duty cycles
pub mod drive_ctrl;

/// Hardware interfaces - sensor array and actuator traits, wheel commands
pub mod hw;

/// Line sensing - position estimation and intersection detection
pub mod line_sense;

/// Navigation control - follow / U-turn / park state machine
pub mod nav_ctrl;

/// Odometry - interrupt-safe wheel tick counters
pub mod odom;

/// Simulation - kinematic car and track standing in for the hardware, and
/// closed loop runs against them
pub mod sim;

/// Telemetry - framed JSON cycle summaries
pub mod tm;

/// Executable parameters
pub mod params;
