//! # NavCtrl Parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::NavCtrlError;
use crate::{drive_ctrl::DriveCtrlParams, line_sense::TurnDetParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for navigation control and all its components.
#[derive(Debug, Clone, Deserialize)]
pub struct NavCtrlParams {
    /// Forward duty cycle while following outside a curve zone.
    pub forward_speed: u16,

    /// Odometry ticks making up one revolution.
    pub ticks_per_rev: u32,

    /// Combined revolutions of both wheels which complete the U-turn pivot.
    pub uturn_revs: f64,

    /// Number of completed U-turns after which the car parks.
    pub park_after_turns: u32,

    /// Number of cycles spent pivoting after which a stalled U-turn is
    /// reported. The pivot itself is never abandoned.
    pub turn_stall_warn_cycles: u64,

    pub drive_ctrl: DriveCtrlParams,

    pub turn_det: TurnDetParams,

    pub curve_zones: CurveZones,
}

/// Curve zone tables for each leg of the track.
///
/// The track is different on the way out and on the way back, so the table
/// switches once the first U-turn has been made.
#[derive(Debug, Clone, Deserialize)]
pub struct CurveZones {
    /// Zones used before the first U-turn.
    pub outbound: Vec<ZoneRange>,

    /// Zones used after at least one U-turn.
    #[serde(rename = "return")]
    pub return_leg: Vec<ZoneRange>,
}

/// A range of locations, both bounds exclusive. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ZoneRange {
    #[serde(default)]
    pub above: Option<u64>,

    #[serde(default)]
    pub below: Option<u64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl NavCtrlParams {
    /// Check the parameters describe a usable configuration.
    pub fn validate(&self) -> Result<(), NavCtrlError> {
        if self.ticks_per_rev == 0 {
            return Err(NavCtrlError::InvalidParams(
                "ticks_per_rev must be non-zero".into(),
            ));
        }
        if !(self.uturn_revs > 0.0) {
            return Err(NavCtrlError::InvalidParams(format!(
                "uturn_revs must be positive, found {}",
                self.uturn_revs
            )));
        }
        if self.forward_speed > self.drive_ctrl.pwm_max {
            return Err(NavCtrlError::InvalidParams(format!(
                "forward_speed ({}) exceeds pwm_max ({})",
                self.forward_speed, self.drive_ctrl.pwm_max
            )));
        }
        if !(self.drive_ctrl.max_deviation > 0.0) {
            return Err(NavCtrlError::InvalidParams(
                "drive_ctrl.max_deviation must be positive".into(),
            ));
        }

        Ok(())
    }
}

impl Default for NavCtrlParams {
    fn default() -> Self {
        Self {
            forward_speed: 255,
            ticks_per_rev: 360,
            uturn_revs: 1.5,
            park_after_turns: 2,
            turn_stall_warn_cycles: 2000,
            drive_ctrl: DriveCtrlParams::default(),
            turn_det: TurnDetParams::default(),
            curve_zones: CurveZones::default(),
        }
    }
}

impl CurveZones {
    /// True if `location` lies in a curve zone for the given number of
    /// completed U-turns.
    pub fn is_curve(&self, location: u64, turn_count: u32) -> bool {
        let table = if turn_count < 1 {
            &self.outbound
        } else {
            &self.return_leg
        };

        table.iter().any(|z| z.contains(location))
    }
}

impl Default for CurveZones {
    fn default() -> Self {
        Self {
            outbound: vec![
                ZoneRange::below(2),
                ZoneRange::between(13, 20),
                ZoneRange::above(24),
            ],
            return_leg: vec![
                ZoneRange::below(3),
                ZoneRange::between(7, 14),
                ZoneRange::above(24),
            ],
        }
    }
}

impl ZoneRange {
    pub fn below(below: u64) -> Self {
        Self {
            above: None,
            below: Some(below),
        }
    }

    pub fn above(above: u64) -> Self {
        Self {
            above: Some(above),
            below: None,
        }
    }

    pub fn between(above: u64, below: u64) -> Self {
        Self {
            above: Some(above),
            below: Some(below),
        }
    }

    pub fn contains(&self, location: u64) -> bool {
        self.above.map_or(true, |a| location > a) && self.below.map_or(true, |b| location < b)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_outbound_zones() {
        let zones = CurveZones::default();

        let curves: Vec<u64> = (0..30).filter(|&l| zones.is_curve(l, 0)).collect();
        assert_eq!(
            curves,
            vec![0, 1, 14, 15, 16, 17, 18, 19, 25, 26, 27, 28, 29]
        );
    }

    #[test]
    fn test_return_zones() {
        let zones = CurveZones::default();

        for turns in 1..3 {
            let curves: Vec<u64> = (0..30).filter(|&l| zones.is_curve(l, turns)).collect();
            assert_eq!(
                curves,
                vec![0, 1, 2, 8, 9, 10, 11, 12, 13, 25, 26, 27, 28, 29]
            );
        }
    }

    #[test]
    fn test_params_file() -> Result<(), util::params::LoadError> {
        let params: NavCtrlParams =
            util::params::parse(include_str!("../../../params/nav_ctrl.toml"))?;
        let default = NavCtrlParams::default();

        assert!(params.validate().is_ok());
        assert_eq!(params.forward_speed, default.forward_speed);
        assert_eq!(params.ticks_per_rev, default.ticks_per_rev);
        assert_eq!(params.uturn_revs, default.uturn_revs);
        assert_eq!(params.park_after_turns, default.park_after_turns);
        assert_eq!(params.drive_ctrl.turn_speed, default.drive_ctrl.turn_speed);
        assert_eq!(params.turn_det.min_deviation, default.turn_det.min_deviation);
        assert_eq!(params.curve_zones.outbound, default.curve_zones.outbound);
        assert_eq!(params.curve_zones.return_leg, default.curve_zones.return_leg);

        Ok(())
    }

    #[test]
    fn test_validate() {
        let mut params = NavCtrlParams::default();
        params.ticks_per_rev = 0;
        assert!(matches!(
            params.validate(),
            Err(NavCtrlError::InvalidParams(_))
        ));

        let mut params = NavCtrlParams::default();
        params.forward_speed = 300;
        assert!(params.validate().is_err());
    }
}
