//! # Navigation control module
//!
//! This module implements the [`NavCtrl`] state machine, which sequences the
//! car's behaviour each cycle. The machine has three states:
//!
//! - `Following` - The car follows the line using the position estimator and
//!   drive controller. Controller gains are boosted inside curve zones, which
//!   are identified from the distance travelled since the last U-turn. When
//!   the turn detector reports an intersection or line loss the machine
//!   enters `Turning`.
//! - `Turning` - The car pivots in place, trusting odometry alone, until the
//!   combined rotation of both wheels reaches the U-turn threshold. It then
//!   returns to `Following`, or parks if enough U-turns have been made.
//! - `Parked` - All wheel commands are neutral. There is no way out of this
//!   state.
//!
//! The U-turn is advanced one step per cycle rather than blocking, so a
//! `Park` command is honoured even mid-turn. If ticks stop arriving the pivot
//! carries on indefinitely; this is reported once the turn has lasted longer
//! than `turn_stall_warn_cycles`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// EXPORTS
// ---------------------------------------------------------------------------

pub use params::{CurveZones, NavCtrlParams, ZoneRange};
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during NavCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum NavCtrlError {
    #[error("Failed to load NavCtrlParams: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid NavCtrl parameters: {0}")]
    InvalidParams(String),
}
