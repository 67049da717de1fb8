//! # Hardware interface module
//!
//! The navigation core talks to the car's hardware through two traits:
//!
//! - [`SensorArray`] - provides one reflectance reading per cycle, blocking
//!   until the physically timed acquisition completes.
//! - [`Actuator`] - applies a direction and duty cycle to each wheel.
//!
//! The odometry trigger source is not a trait, instead it is wired directly
//! to [`crate::odom::Odometry::tick`].

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// The number of sensors in the reflectance array.
pub const NUM_SENSORS: usize = 8;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// One reading of the reflectance array, one intensity per sensor position.
///
/// Higher values mean a less reflective (darker) surface.
pub type SensorReading = [u16; NUM_SENSORS];

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Source of reflectance readings.
pub trait SensorArray {
    /// Acquire a new reading from the array.
    fn read(&mut self) -> Result<SensorReading, HwError>;
}

/// Sink for wheel commands.
pub trait Actuator {
    /// Apply the command to both wheels immediately.
    fn apply(&mut self, cmd: &DriveCmd) -> Result<(), HwError>;
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised by the hardware collaborators.
#[derive(Debug, thiserror::Error)]
pub enum HwError {
    #[error("Sensor array read failed: {0}")]
    SensorReadFailed(String),

    #[error("Could not apply the actuator command: {0}")]
    ActuatorFailed(String),
}

/// Rotation direction of a wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Forward,
    Reverse,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command for a single wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WheelCmd {
    pub dir: Direction,

    /// Duty cycle, always in `[0, pwm_max]`.
    pub duty: u16,
}

/// Command for both wheels, produced once per cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriveCmd {
    pub left: WheelCmd,
    pub right: WheelCmd,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelCmd {
    /// Build a wheel command, rounding and clamping the duty cycle into
    /// `[0, pwm_max]`.
    ///
    /// Non-finite duty cycles are treated as zero.
    pub fn new(dir: Direction, duty: f64, pwm_max: u16) -> Self {
        let duty = if duty.is_finite() {
            duty.round().max(0.0).min(pwm_max as f64) as u16
        } else {
            0
        };

        Self { dir, duty }
    }

    /// Signed duty cycle, negative when reversing.
    pub fn signed_duty(&self) -> i32 {
        match self.dir {
            Direction::Forward => self.duty as i32,
            Direction::Reverse => -(self.duty as i32),
        }
    }
}

impl DriveCmd {
    /// Both wheels forward with the given (clamped) duty cycles.
    pub fn forward(left: f64, right: f64, pwm_max: u16) -> Self {
        Self {
            left: WheelCmd::new(Direction::Forward, left, pwm_max),
            right: WheelCmd::new(Direction::Forward, right, pwm_max),
        }
    }

    /// Neutral command, both wheels forward at zero duty.
    pub fn stop() -> Self {
        Self::forward(0.0, 0.0, 0)
    }

    /// In-place pivot, left wheel forward and right wheel reverse at full
    /// duty.
    pub fn pivot(pwm_max: u16) -> Self {
        Self {
            left: WheelCmd::new(Direction::Forward, pwm_max as f64, pwm_max),
            right: WheelCmd::new(Direction::Reverse, pwm_max as f64, pwm_max),
        }
    }

    /// Difference between the left and right signed duty cycles.
    pub fn differential(&self) -> i32 {
        self.left.signed_duty() - self.right.signed_duty()
    }
}

impl Default for DriveCmd {
    fn default() -> Self {
        Self::stop()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_wheel_cmd_clamp() {
        assert_eq!(WheelCmd::new(Direction::Forward, 300.0, 255).duty, 255);
        assert_eq!(WheelCmd::new(Direction::Forward, -40.0, 255).duty, 0);
        assert_eq!(WheelCmd::new(Direction::Forward, 127.9, 255).duty, 128);
        assert_eq!(WheelCmd::new(Direction::Forward, 254.999_999, 255).duty, 255);
        assert_eq!(WheelCmd::new(Direction::Forward, std::f64::NAN, 255).duty, 0);
    }

    #[test]
    fn test_drive_cmds() {
        let p = DriveCmd::pivot(255);
        assert_eq!(p.left, WheelCmd { dir: Direction::Forward, duty: 255 });
        assert_eq!(p.right, WheelCmd { dir: Direction::Reverse, duty: 255 });
        assert_eq!(p.differential(), 510);

        let s = DriveCmd::stop();
        assert_eq!(s.left.duty, 0);
        assert_eq!(s.right.duty, 0);
        assert_eq!(s.left.dir, Direction::Forward);
    }
}
