//! # Drive controller
//!
//! This module provides the PID controller used for drive control, including
//! the error calculation and the split into wheel duty cycles.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use serde::Serialize;

use super::DriveCtrlParams;
use crate::{hw::DriveCmd, line_sense::CENTER_POS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A discrete PID controller stepped once per control cycle.
///
/// The terms are returned separately so the caller can weight them.
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Previous error
    prev_error: f64,

    /// The integral accumulation
    integral: f64,
}

/// Individual contributions of each PID term, gains already applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PidTerms {
    pub p: f64,
    pub i: f64,
    pub d: f64,
}

/// The drive controller.
///
/// Owns the PID state, which persists across cycles and is only reset by
/// constructing a new controller.
#[derive(Debug, Serialize, Clone)]
pub struct DriveCtrl {
    #[serde(skip)]
    params: DriveCtrlParams,

    pid: PidController,
}

/// Status report for one drive control update.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DriveReport {
    /// Position error, centre minus estimate.
    pub error: f64,

    /// Weighted PID terms after any curve boost.
    pub terms: PidTerms,

    /// Differential duty cycle, positive steers left wheel faster.
    pub v_diff: f64,

    /// True if the curve zone boost was applied.
    pub curve: bool,

    /// True if a wheel duty cycle had to be clamped to the legal range.
    pub duty_limited: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains.
    pub fn new(k_p: f64, k_i: f64, k_d: f64) -> Self {
        Self {
            k_p,
            k_i,
            k_d,
            prev_error: 0.0,
            integral: 0.0,
        }
    }

    /// Get the weighted terms of the controller for the given error.
    ///
    /// The derivative is the change in error since the previous call.
    pub fn get(&mut self, error: f64) -> PidTerms {
        self.integral += error;
        let deriv = error - self.prev_error;
        self.prev_error = error;

        PidTerms {
            p: self.k_p * error,
            i: self.k_i * self.integral,
            d: self.k_d * deriv,
        }
    }

    /// The accumulated integral of the error.
    pub fn integral(&self) -> f64 {
        self.integral
    }
}

impl DriveCtrl {
    /// Create a new instance of the controller from the parameters
    pub fn new(params: DriveCtrlParams) -> Self {
        let scale = params.gain_scale();

        Self {
            params,
            pid: PidController::new(
                params.k_p_factor * scale,
                params.k_i_factor * scale,
                params.k_d_factor * scale,
            ),
        }
    }

    /// Compute the wheel command for the given position estimate.
    ///
    /// `curve` selects the reduced turn speed and boosted gains. Wheel duty
    /// cycles are clamped to `[0, pwm_max]`, which is flagged in the report.
    pub fn update(&mut self, forward_speed: u16, pos: f64, curve: bool) -> (DriveCmd, DriveReport) {
        let error = CENTER_POS - pos;
        let mut terms = self.pid.get(error);

        let mut v_forward = forward_speed as f64;
        if curve {
            v_forward = self.params.turn_speed as f64;
            terms.p *= self.params.curve_gain_mult;
            terms.d *= self.params.curve_gain_mult;
        }

        let v_diff = terms.p + terms.i + terms.d;

        // Common mode speed, lowered so the faster wheel stays at v_forward
        let v = v_forward - 0.5 * v_diff.abs();
        let left = v + 0.5 * v_diff;
        let right = v - 0.5 * v_diff;

        let pwm_max = self.params.pwm_max as f64;
        let duty_limited = [left, right].iter().any(|&d| d < 0.0 || d > pwm_max);

        let cmd = DriveCmd::forward(left, right, self.params.pwm_max);

        trace!(
            "DriveCtrl: pos {:.3}, err {:.3}, v_diff {:.1}, L {} R {}",
            pos,
            error,
            v_diff,
            cmd.left.duty,
            cmd.right.duty
        );

        (
            cmd,
            DriveReport {
                error,
                terms,
                v_diff,
                curve,
                duty_limited,
            },
        )
    }

    pub fn params(&self) -> &DriveCtrlParams {
        &self.params
    }

    pub fn integral(&self) -> f64 {
        self.pid.integral()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
