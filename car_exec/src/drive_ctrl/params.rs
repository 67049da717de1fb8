//! Drive control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::line_sense::MAX_DEVIATION;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for drive control
///
/// Gains are given as factors of `pwm_max / max_deviation`, the duty cycle
/// headroom per unit of position error.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DriveCtrlParams {
    /// Top of the legal duty cycle range.
    pub pwm_max: u16,

    /// Largest expected distance of the line from the array centre.
    pub max_deviation: f64,

    /// Proportional gain factor
    pub k_p_factor: f64,

    /// Integral gain factor
    pub k_i_factor: f64,

    /// Derivative gain factor
    pub k_d_factor: f64,

    /// Multiplier applied to the proportional and derivative terms inside a
    /// curve zone.
    pub curve_gain_mult: f64,

    /// Forward duty cycle used inside a curve zone.
    pub turn_speed: u16,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveCtrlParams {
    /// Duty cycle per unit of position error.
    pub fn gain_scale(&self) -> f64 {
        self.pwm_max as f64 / self.max_deviation
    }
}

impl Default for DriveCtrlParams {
    fn default() -> Self {
        Self {
            pwm_max: 255,
            max_deviation: MAX_DEVIATION,
            k_p_factor: 0.7,
            k_i_factor: 0.0,
            k_d_factor: 14.0,
            curve_gain_mult: 32.0,
            turn_speed: 100,
        }
    }
}
