//! # Simulation module
//!
//! A kinematic model of the car on a line track, used in place of the real
//! sensor array, motors and encoders when running on the host.
//!
//! The track is a chain of straight paths between nodes (the X axis if no
//! nodes are given) with perpendicular stripes at given distances along it,
//! which the turn detector sees as intersections. The car is a differential
//! drive with the sensor array mounted ahead of the axle, perpendicular to
//! the heading. Sensor 0 is on the car's right.
//!
//! The car's wheel travel is converted into encoder ticks which are fed into
//! the shared [`Odometry`], standing in for the encoder interrupts.
//!
//! [`run`] closes the loop between [`NavCtrl`](crate::nav_ctrl::NavCtrl) and
//! the car, scoring how well the line was followed. [`gain_cost`] uses it to
//! evaluate a set of drive controller gains.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod run;
mod track;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::Arc;

use serde::Serialize;
use util::maths::{gaussian, lin_map};

use crate::{
    hw::{Actuator, DriveCmd, HwError, SensorArray, SensorReading, NUM_SENSORS},
    odom::{Odometry, Side},
};

pub use params::SimParams;
pub use run::*;
pub use track::{Track, TrackPoint};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Simulated car.
pub struct SimCar {
    params: SimParams,

    track: Track,

    odom: Arc<Odometry>,

    pose: SimPose,

    /// Command most recently given to the actuator
    last_cmd: DriveCmd,

    /// Left and right wheel speeds in m/s
    wheel_speeds_ms: [f64; 2],

    /// Wheel travel not yet converted to a whole tick
    tick_accum: [f64; 2],

    time_s: f64,
}

/// Pose of the car's axle centre in the track frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SimPose {
    /// Distance along the track
    pub x_m: f64,

    /// Lateral offset from the line, positive to the left
    pub y_m: f64,

    /// Heading, anticlockwise from the +X axis
    pub heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimCar {
    pub fn new(params: SimParams, odom: Arc<Odometry>) -> Self {
        let pose = SimPose {
            x_m: 0.0,
            y_m: params.initial_offset_m,
            heading_rad: params.initial_heading_rad,
        };

        Self {
            track: Track::new(&params.track_nodes_m),
            params,
            odom,
            pose,
            last_cmd: DriveCmd::stop(),
            wheel_speeds_ms: [0.0; 2],
            tick_accum: [0.0; 2],
            time_s: 0.0,
        }
    }

    /// Advance the simulation by one time step.
    pub fn step(&mut self) {
        let dt = self.params.dt_s;
        let [v_l, v_r] = self.wheel_speeds_ms;

        let v = 0.5 * (v_l + v_r);
        let omega = (v_r - v_l) / self.params.wheel_base_m;

        self.pose.heading_rad += omega * dt;
        self.pose.x_m += v * self.pose.heading_rad.cos() * dt;
        self.pose.y_m += v * self.pose.heading_rad.sin() * dt;

        // Encoders count edges regardless of direction
        for (i, side) in [Side::Left, Side::Right].iter().enumerate() {
            self.tick_accum[i] += self.wheel_speeds_ms[i].abs() * dt * self.params.ticks_per_m;
            while self.tick_accum[i] >= 1.0 {
                self.odom.tick(*side);
                self.tick_accum[i] -= 1.0;
            }
        }

        self.time_s += dt;
    }

    pub fn pose(&self) -> SimPose {
        self.pose
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    /// Signed distance of the axle centre from the line, positive to the
    /// left.
    pub fn lateral_offset_m(&self) -> f64 {
        self.track.project(self.pose.x_m, self.pose.y_m).offset_m
    }

    pub fn last_cmd(&self) -> DriveCmd {
        self.last_cmd
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Track-frame position of the given sensor.
    fn sensor_position(&self, index: usize) -> (f64, f64) {
        let offset_m = (index as f64 - (NUM_SENSORS as f64 - 1.0) / 2.0) * self.params.sensor_pitch_m;
        let (sin_h, cos_h) = self.pose.heading_rad.sin_cos();

        (
            self.pose.x_m + self.params.sensor_offset_m * cos_h - offset_m * sin_h,
            self.pose.y_m + self.params.sensor_offset_m * sin_h + offset_m * cos_h,
        )
    }

    /// Darkness under a point on the track, between 0 and 1.
    fn darkness(&self, x_m: f64, y_m: f64) -> f64 {
        let p = self.track.project(x_m, y_m);

        let on_stripe = self
            .params
            .stripes_m
            .iter()
            .any(|s| (p.dist_m - s).abs() < 0.5 * self.params.stripe_width_m);

        if on_stripe {
            1.0
        } else {
            gaussian(p.offset_m, 0.0, self.params.line_sigma_m)
        }
    }
}

impl SensorArray for SimCar {
    fn read(&mut self) -> Result<SensorReading, HwError> {
        let floor = self.params.floor_intensity as f64;
        let line = self.params.line_intensity as f64;

        let mut reading = [0u16; NUM_SENSORS];
        for (i, r) in reading.iter_mut().enumerate() {
            let (x_m, y_m) = self.sensor_position(i);
            *r = (floor + (line - floor) * self.darkness(x_m, y_m)).round() as u16;
        }

        Ok(reading)
    }
}

impl Actuator for SimCar {
    fn apply(&mut self, cmd: &DriveCmd) -> Result<(), HwError> {
        let pwm_max = self.params.pwm_max as f64;
        let max_speed_ms = self.params.max_wheel_speed_ms;

        let to_speed = |duty: i32| {
            lin_map(
                (0.0, pwm_max),
                (0.0, max_speed_ms),
                duty as f64,
            )
        };

        self.wheel_speeds_ms = [
            to_speed(cmd.left.signed_duty()),
            to_speed(cmd.right.signed_duty()),
        ];
        self.last_cmd = *cmd;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        line_sense::{centroid, TurnDetParams, TurnDetector, CENTER_POS},
        nav_ctrl::{CurveZones, NavCtrl, NavCtrlParams, NavState},
    };

    fn sim_with(params: SimParams) -> (SimCar, Arc<Odometry>) {
        let odom = Arc::new(Odometry::new());
        (SimCar::new(params, odom.clone()), odom)
    }

    #[test]
    fn test_reading_follows_line() -> Result<(), HwError> {
        let detector = TurnDetector::new(TurnDetParams::default());

        let (mut car, _) = sim_with(SimParams::default());
        let reading = car.read()?;
        assert!((centroid(&reading).unwrap() - CENTER_POS).abs() < 1e-9);
        assert!(!detector.is_turn(&reading));

        // Car to the left of the line sees it on its right, the low indices
        let mut params = SimParams::default();
        params.initial_offset_m = 0.01;
        let (mut car, _) = sim_with(params);
        let reading = car.read()?;
        assert!(centroid(&reading).unwrap() < CENTER_POS);
        assert!(!detector.is_turn(&reading));

        // Array over a stripe sees a uniform dark reading
        let mut params = SimParams::default();
        params.stripes_m = vec![params.sensor_offset_m];
        let (mut car, _) = sim_with(params);
        let reading = car.read()?;
        assert!(reading.iter().all(|&r| r == 2400));
        assert!(detector.is_turn(&reading));

        Ok(())
    }

    #[test]
    fn test_drive_and_ticks() -> Result<(), HwError> {
        let (mut car, odom) = sim_with(SimParams::default());

        // Full speed straight ahead for one second
        car.apply(&DriveCmd::forward(255.0, 255.0, 255))?;
        for _ in 0..100 {
            car.step();
        }

        let pose = car.pose();
        assert!((pose.x_m - 0.6).abs() < 1e-6);
        assert_eq!(pose.heading_rad, 0.0);

        // 0.6 m at 1600 ticks/m, allowing for accumulated rounding
        let snap = odom.snapshot();
        assert_eq!(snap.left, snap.right);
        assert!((snap.left as i64 - 960).abs() <= 1);

        // Pivot turns clockwise in place
        car.apply(&DriveCmd::pivot(255))?;
        car.step();
        assert!(car.pose().heading_rad < 0.0);
        assert!((car.pose().x_m - pose.x_m).abs() < 1e-12);

        Ok(())
    }

    #[test]
    fn test_follows_straight_line() -> Result<(), SimError> {
        let mut params = NavCtrlParams::default();
        params.curve_zones = CurveZones {
            outbound: vec![],
            return_leg: vec![],
        };
        let mut nav = NavCtrl::new(params, Arc::new(Odometry::new())).unwrap();

        let mut sim_params = SimParams::default();
        sim_params.initial_offset_m = 0.003;
        let mut car = SimCar::new(sim_params, nav.odometry());

        let summary = run(&mut nav, &mut car, 300)?;

        assert_eq!(summary.state, NavState::Following);
        assert_eq!(summary.turn_count, 0);
        assert!(summary.max_offset_m < 0.01);
        assert!(car.lateral_offset_m().abs() < 0.002);
        assert!(car.pose().x_m > 1.0);

        Ok(())
    }

    #[test]
    fn test_out_and_back() -> Result<(), SimError> {
        let mut nav = NavCtrl::default();

        let mut sim_params = SimParams::default();
        sim_params.stripes_m = vec![1.0, -0.6];
        let mut car = SimCar::new(sim_params, nav.odometry());

        let summary = run(&mut nav, &mut car, 1500)?;

        assert_eq!(summary.state, NavState::Parked);
        assert_eq!(summary.turn_count, 2);
        assert!(summary.cycles < 1500);
        assert!(summary.max_offset_m < 0.02);

        // The cycle completing the last U-turn commands the settle, the
        // wheels must still end up stopped.
        assert_eq!(car.last_cmd(), DriveCmd::stop());

        // Parked just past the return stripe, heading roughly back along +X
        let pose = car.pose();
        assert!(pose.x_m < -0.4 && pose.x_m > -0.7);
        assert!(pose.heading_rad.cos() > 0.9);

        Ok(())
    }

    #[test]
    fn test_stripes_follow_track() -> Result<(), HwError> {
        let detector = TurnDetector::new(TurnDetParams::default());

        // Car pointing up a track along +Y, stripe half way along it
        let params = SimParams {
            track_nodes_m: vec![[0.0, -1.0], [0.0, 1.0]],
            stripes_m: vec![1.0],
            initial_heading_rad: std::f64::consts::FRAC_PI_2,
            ..Default::default()
        };
        let (mut car, _) = sim_with(params.clone());

        // Array is over the stripe, 1 m along the track
        car.pose.y_m = -params.sensor_offset_m;
        assert!(detector.is_turn(&car.read()?));

        // Moved off the stripe the line is centred under the array
        car.pose.y_m = -0.5;
        let reading = car.read()?;
        assert!(!detector.is_turn(&reading));
        assert!((centroid(&reading).unwrap() - CENTER_POS).abs() < 1e-6);
        assert!(car.lateral_offset_m().abs() < 1e-12);

        Ok(())
    }
}
