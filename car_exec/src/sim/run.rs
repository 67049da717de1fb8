//! Closed loop runs of navigation control against the simulated car

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::debug;
use serde::Serialize;
use std::sync::Arc;

use super::{SimCar, SimParams};
use crate::{
    drive_ctrl::DriveCtrlParams,
    hw::{Actuator, DriveCmd, HwError, SensorArray, NUM_SENSORS},
    nav_ctrl::{InputData, NavCtrl, NavCtrlError, NavCtrlParams, NavState},
    odom::Odometry,
};
use util::module::State;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Outcome of a closed loop run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    /// Number of cycles executed
    pub cycles: u64,

    /// Navigation state at the end of the run
    pub state: NavState,

    pub turn_count: u32,

    /// Sum over following cycles of the absolute lateral offset, each
    /// limited to the width of the sensor array.
    ///
    /// Units: meters
    pub abs_err_m: f64,

    /// Largest absolute lateral offset seen while following.
    ///
    /// Units: meters
    pub max_offset_m: f64,

    /// Number of cycles driven in curve mode
    pub curve_cycles: u64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can end a closed loop run.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("Hardware error: {0}")]
    HwError(HwError),

    #[error("NavCtrl error: {0}")]
    NavCtrlError(NavCtrlError),
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Run navigation control against the car for up to `max_cycles` cycles.
///
/// The run ends early once the car parks. Either way the wheels are stopped
/// before returning, so the last command the car sees is always neutral.
pub fn run(nav: &mut NavCtrl, car: &mut SimCar, max_cycles: u64) -> Result<RunSummary, SimError> {
    let err_limit_m = (NUM_SENSORS - 1) as f64 * car.params.sensor_pitch_m;

    let mut summary = RunSummary {
        cycles: 0,
        state: nav.state(),
        turn_count: nav.turn_count(),
        abs_err_m: 0.0,
        max_offset_m: 0.0,
        curve_cycles: 0,
    };

    while summary.cycles < max_cycles {
        let reading = car.read().map_err(SimError::HwError)?;
        let (cmd, report) = nav
            .proc(&InputData::new(reading))
            .map_err(SimError::NavCtrlError)?;
        car.apply(&cmd).map_err(SimError::HwError)?;
        car.step();

        summary.cycles += 1;

        if report.drive.map_or(false, |d| d.curve) {
            summary.curve_cycles += 1;
        }

        match nav.state() {
            NavState::Following => {
                let offset_m = car.lateral_offset_m().abs();
                summary.abs_err_m += offset_m.min(err_limit_m);
                summary.max_offset_m = summary.max_offset_m.max(offset_m);
            }
            NavState::Parked => break,
            NavState::Turning => (),
        }
    }

    car.apply(&DriveCmd::stop()).map_err(SimError::HwError)?;

    summary.state = nav.state();
    summary.turn_count = nav.turn_count();

    debug!(
        "Sim run: {} cycles, {:?} after {} U-turns, abs err {:.4} m",
        summary.cycles, summary.state, summary.turn_count, summary.abs_err_m
    );

    Ok(summary)
}

/// Score a set of drive controller gains over the simulated track.
///
/// A fresh controller and car are built from the parameters, with
/// `drive_ctrl` replacing the drive control parameters in `nav_params`.
/// Lower [`RunSummary::abs_err_m`] means closer line following.
pub fn gain_cost(
    drive_ctrl: DriveCtrlParams,
    nav_params: NavCtrlParams,
    sim_params: SimParams,
    max_cycles: u64,
) -> Result<RunSummary, SimError> {
    let nav_params = NavCtrlParams {
        drive_ctrl,
        ..nav_params
    };

    let mut nav =
        NavCtrl::new(nav_params, Arc::new(Odometry::new())).map_err(SimError::NavCtrlError)?;
    let mut car = SimCar::new(sim_params, nav.odometry());

    run(&mut nav, &mut car, max_cycles)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::nav_ctrl::CurveZones;

    /// Straight, then a bend of about 31 degrees to the left inside the
    /// second outbound curve zone.
    const BEND: [[f64; 2]; 3] = [[-1.0, 0.0], [1.6, 0.0], [2.6, 0.6]];

    fn no_zones() -> NavCtrlParams {
        NavCtrlParams {
            curve_zones: CurveZones {
                outbound: vec![],
                return_leg: vec![],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_run_stops_wheels() -> Result<(), SimError> {
        // Run ends at the cycle limit while still following
        let mut nav = NavCtrl::default();
        let mut car = SimCar::new(SimParams::default(), nav.odometry());

        let summary = run(&mut nav, &mut car, 50)?;
        assert_eq!(summary.cycles, 50);
        assert_eq!(summary.state, NavState::Following);
        assert_eq!(car.last_cmd(), DriveCmd::stop());

        Ok(())
    }

    #[test]
    fn test_centred_run_costs_nothing() -> Result<(), SimError> {
        let summary = gain_cost(
            DriveCtrlParams::default(),
            no_zones(),
            SimParams::default(),
            200,
        )?;

        assert_eq!(summary.abs_err_m, 0.0);
        assert_eq!(summary.max_offset_m, 0.0);
        assert_eq!(summary.curve_cycles, 0);

        Ok(())
    }

    #[test]
    fn test_stiffer_gain_costs_less() -> Result<(), SimError> {
        let sim_params = SimParams {
            initial_offset_m: 0.01,
            ..Default::default()
        };

        let cost = |k_p_factor: f64| -> Result<f64, SimError> {
            let drive_ctrl = DriveCtrlParams {
                k_p_factor,
                ..Default::default()
            };
            Ok(gain_cost(drive_ctrl, no_zones(), sim_params.clone(), 300)?.abs_err_m)
        };

        let soft = cost(0.2)?;
        let nominal = cost(0.7)?;
        let stiff = cost(3.0)?;

        assert!(soft > nominal, "{} <= {}", soft, nominal);
        assert!(nominal > stiff, "{} <= {}", nominal, stiff);

        Ok(())
    }

    #[test]
    fn test_follows_bend_in_curve_zone() -> Result<(), SimError> {
        let sim_params = SimParams {
            track_nodes_m: BEND.to_vec(),
            ..Default::default()
        };

        let mut nav = NavCtrl::default();
        let mut car = SimCar::new(sim_params.clone(), nav.odometry());
        let boosted = run(&mut nav, &mut car, 600)?;

        assert_eq!(boosted.state, NavState::Following);
        assert!(boosted.curve_cycles > 0);
        assert!(boosted.max_offset_m < 0.01, "{:?}", boosted);

        // Heading settles along the last path
        let heading_rad = car.pose().heading_rad;
        assert!((heading_rad - 0.6f64.atan()).abs() < 0.05, "{}", heading_rad);

        // Taking the bend at full speed without the boost tracks worse
        let plain = gain_cost(DriveCtrlParams::default(), no_zones(), sim_params, 600)?;
        assert_eq!(plain.curve_cycles, 0);
        assert!(plain.abs_err_m > boosted.abs_err_m, "{:?} {:?}", plain, boosted);
        assert!(plain.max_offset_m > boosted.max_offset_m);

        Ok(())
    }
}
