//! Implementations for the NavCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Internal
use super::{NavCtrlError, NavCtrlParams};
use crate::{
    drive_ctrl::{DriveCtrl, DriveReport},
    hw::{DriveCmd, SensorReading, NUM_SENSORS},
    line_sense::{PosEstimator, TurnDetector},
    odom::{OdomSnapshot, Odometry},
};
use util::{module::State, session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Navigation control module state
pub struct NavCtrl {
    params: NavCtrlParams,

    odom: Arc<Odometry>,

    pos_est: PosEstimator,
    turn_det: TurnDetector,
    drive_ctrl: DriveCtrl,

    state: NavState,

    /// Number of U-turns started
    turn_count: u32,

    /// Number of cycles spent in the current U-turn
    turn_cycles: u64,

    report: StatusReport,
}

/// Input data to navigation control.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// This cycle's sensor reading
    pub reading: SensorReading,

    /// An external command, or `None` if there is no command this cycle.
    pub cmd: Option<NavCmd>,
}

/// Status report for NavCtrl processing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusReport {
    /// State at the end of the cycle
    pub state: NavState,

    pub turn_count: u32,

    /// Odometry as read at the start of the cycle
    pub odom: OdomSnapshot,

    /// Location bucket used for the curve zone lookup
    pub location: u64,

    /// True if the turn detector fired this cycle
    pub turn_detected: bool,

    /// Position estimate, if one was made this cycle
    pub pos: Option<f64>,

    /// True if the position estimate was held from a previous cycle
    pub pos_held: bool,

    /// Drive controller report, if the controller ran this cycle
    pub drive: Option<DriveReport>,

    /// Combined revolutions of the current U-turn
    pub turn_revs: Option<f64>,

    /// True if the current U-turn has exceeded the stall warning limit
    pub turn_stalled: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The states of the navigation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavState {
    Following,
    Turning,
    Parked,
}

/// Commands which can be given to navigation control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCmd {
    /// Stop the car and park, from any state.
    Park,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for NavCtrl {
    type InitData = &'static str;
    type InitError = NavCtrlError;

    type InputData = InputData;
    type OutputData = DriveCmd;
    type StatusReport = StatusReport;
    type ProcError = NavCtrlError;

    /// Initialise the NavCtrl module.
    ///
    /// Expected init data is the path to the parameter file. The odometry
    /// counters are kept, so any trigger source already wired to them stays
    /// connected.
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let params: NavCtrlParams =
            util::params::load(init_data).map_err(NavCtrlError::ParamLoadError)?;

        *self = Self::new(params, self.odom.clone())?;

        info!(
            "NavCtrl initialised from {:?} (session {:?})",
            init_data, session.session_root
        );

        Ok(())
    }

    /// Perform one control cycle.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Read odometry once per cycle
        let odom = self.odom.snapshot();

        self.report = StatusReport::new(self.state, self.turn_count, odom);

        if let Some(NavCmd::Park) = input_data.cmd {
            self.park("park command");
        }

        let output = match self.state {
            NavState::Following => self.step_following(&input_data.reading, odom),
            NavState::Turning => self.step_turning(odom),
            NavState::Parked => DriveCmd::stop(),
        };

        self.report.state = self.state;
        self.report.turn_count = self.turn_count;

        trace!(
            "NavCtrl {:?}: L {:?} {} R {:?} {}",
            self.state,
            output.left.dir,
            output.left.duty,
            output.right.dir,
            output.right.duty
        );

        Ok((output, self.report))
    }
}

impl NavCtrl {
    /// Create a new navigation controller using the given odometry counters.
    pub fn new(params: NavCtrlParams, odom: Arc<Odometry>) -> Result<Self, NavCtrlError> {
        params.validate()?;

        Ok(Self {
            pos_est: PosEstimator::new(),
            turn_det: TurnDetector::new(params.turn_det),
            drive_ctrl: DriveCtrl::new(params.drive_ctrl),
            state: NavState::Following,
            turn_count: 0,
            turn_cycles: 0,
            report: StatusReport::new(NavState::Following, 0, OdomSnapshot::default()),
            odom,
            params,
        })
    }

    /// Handle to the odometry counters, for wiring to the trigger source.
    pub fn odometry(&self) -> Arc<Odometry> {
        self.odom.clone()
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn params(&self) -> &NavCtrlParams {
        &self.params
    }

    /// Follow the line, or start a U-turn if the detector fires.
    fn step_following(&mut self, reading: &SensorReading, odom: OdomSnapshot) -> DriveCmd {
        if self.turn_det.is_turn(reading) {
            self.report.turn_detected = true;
            return self.begin_turn(reading);
        }

        let location = odom.location(self.params.ticks_per_rev);
        let curve = self
            .params
            .curve_zones
            .is_curve(location, self.turn_count);

        let pos = self.pos_est.estimate(reading);
        let (cmd, drive_report) = self
            .drive_ctrl
            .update(self.params.forward_speed, pos, curve);

        self.report.location = location;
        self.report.pos = Some(pos);
        self.report.pos_held = self.pos_est.is_held();
        self.report.drive = Some(drive_report);

        cmd
    }

    /// Enter the turning state and command the pivot.
    fn begin_turn(&mut self, reading: &SensorReading) -> DriveCmd {
        self.turn_count += 1;
        self.turn_cycles = 0;
        self.odom.reset_all();
        self.state = NavState::Turning;

        info!("Intersection detected, starting U-turn {}", self.turn_count);
        debug!("Reading at intersection: {:?}", reading);

        self.report.turn_revs = Some(0.0);

        DriveCmd::pivot(self.params.drive_ctrl.pwm_max)
    }

    /// Advance the U-turn by one cycle.
    fn step_turning(&mut self, odom: OdomSnapshot) -> DriveCmd {
        let pwm_max = self.params.drive_ctrl.pwm_max;
        let revs = odom.revs(self.params.ticks_per_rev);
        self.report.turn_revs = Some(revs);
        self.turn_cycles += 1;

        if revs < self.params.uturn_revs {
            if self.turn_cycles > self.params.turn_stall_warn_cycles {
                if self.turn_cycles == self.params.turn_stall_warn_cycles + 1 {
                    warn!(
                        "U-turn {} has not completed after {} cycles ({:.2} of {:.2} revs), \
                         wheels may be stalled",
                        self.turn_count,
                        self.params.turn_stall_warn_cycles,
                        revs,
                        self.params.uturn_revs
                    );
                }
                self.report.turn_stalled = true;
            }

            return DriveCmd::pivot(pwm_max);
        }

        // Pivot complete, settle forward and start counting the new leg
        self.odom.reset_all();

        info!(
            "U-turn {} complete after {} cycles ({:.2} revs)",
            self.turn_count, self.turn_cycles, revs
        );

        if self.turn_count >= self.params.park_after_turns {
            self.park("U-turn limit reached");
        } else {
            self.state = NavState::Following;
        }

        DriveCmd::forward(pwm_max as f64, pwm_max as f64, pwm_max)
    }

    fn park(&mut self, reason: &str) {
        if self.state != NavState::Parked {
            info!("Parking: {}", reason);
            self.state = NavState::Parked;
        }
    }
}

impl Default for NavCtrl {
    fn default() -> Self {
        Self {
            params: NavCtrlParams::default(),
            odom: Arc::new(Odometry::new()),
            pos_est: PosEstimator::new(),
            turn_det: TurnDetector::new(Default::default()),
            drive_ctrl: DriveCtrl::new(Default::default()),
            state: NavState::Following,
            turn_count: 0,
            turn_cycles: 0,
            report: StatusReport::new(NavState::Following, 0, OdomSnapshot::default()),
        }
    }
}

impl InputData {
    pub fn new(reading: SensorReading) -> Self {
        Self { reading, cmd: None }
    }
}

impl Default for InputData {
    fn default() -> Self {
        Self::new([0; NUM_SENSORS])
    }
}

impl StatusReport {
    fn new(state: NavState, turn_count: u32, odom: OdomSnapshot) -> Self {
        Self {
            state,
            turn_count,
            odom,
            location: 0,
            turn_detected: false,
            pos: None,
            pos_held: false,
            drive: None,
            turn_revs: None,
            turn_stalled: false,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        hw::Direction,
        line_sense::CENTER_POS,
        odom::Side,
    };

    const ON_LINE: SensorReading = [40, 30, 60, 1800, 1800, 90, 40, 35];
    const INTERSECTION: SensorReading = [500; NUM_SENSORS];

    fn tick_n(odom: &Odometry, side: Side, n: u32) {
        for _ in 0..n {
            odom.tick(side);
        }
    }

    fn step(nav: &mut NavCtrl, reading: SensorReading) -> (DriveCmd, StatusReport) {
        nav.proc(&InputData::new(reading)).unwrap()
    }

    /// Run a full U-turn starting from `Following`, returning the settle
    /// command.
    fn run_uturn(nav: &mut NavCtrl) -> DriveCmd {
        let odom = nav.odometry();
        let (cmd, _) = step(nav, INTERSECTION);
        assert_eq!(cmd, DriveCmd::pivot(255));

        tick_n(&odom, Side::Left, 270);
        tick_n(&odom, Side::Right, 270);

        let (cmd, _) = step(nav, INTERSECTION);
        cmd
    }

    #[test]
    fn test_following_centred() {
        let mut nav = NavCtrl::default();
        let odom = nav.odometry();

        // Move out of the first outbound curve zone (location 5)
        tick_n(&odom, Side::Left, 900);
        tick_n(&odom, Side::Right, 900);

        let (cmd, report) = step(&mut nav, ON_LINE);

        assert_eq!(nav.state(), NavState::Following);
        assert_eq!(report.location, 5);
        assert_eq!(report.pos, Some(CENTER_POS));
        assert!(!report.turn_detected);
        assert!(!report.drive.unwrap().curve);
        assert_eq!(cmd, DriveCmd::forward(255.0, 255.0, 255));
    }

    #[test]
    fn test_curve_zone_at_start() {
        let mut nav = NavCtrl::default();

        let (cmd, report) = step(&mut nav, ON_LINE);

        assert_eq!(report.location, 0);
        assert!(report.drive.unwrap().curve);
        assert_eq!(cmd.left.duty, nav.params().drive_ctrl.turn_speed);
        assert_eq!(cmd.right.duty, nav.params().drive_ctrl.turn_speed);
    }

    #[test]
    fn test_uturn_sequence() {
        let mut nav = NavCtrl::default();
        let odom = nav.odometry();

        // Some distance along the track before the intersection
        tick_n(&odom, Side::Left, 1000);
        tick_n(&odom, Side::Right, 1000);
        step(&mut nav, ON_LINE);

        // Intersection seen: turn count up, odometry reset, pivot commanded
        let (cmd, report) = step(&mut nav, INTERSECTION);
        assert!(report.turn_detected);
        assert_eq!(report.state, NavState::Turning);
        assert_eq!(nav.turn_count(), 1);
        assert_eq!(odom.snapshot(), OdomSnapshot::default());
        assert_eq!(cmd.left, crate::hw::WheelCmd { dir: Direction::Forward, duty: 255 });
        assert_eq!(cmd.right, crate::hw::WheelCmd { dir: Direction::Reverse, duty: 255 });

        // Pivot continues regardless of readings until 1.5 revs (540 ticks)
        let mut total = 0;
        while total < 538 {
            odom.tick(Side::Left);
            odom.tick(Side::Right);
            total += 2;

            let (cmd, report) = step(&mut nav, ON_LINE);
            assert_eq!(nav.state(), NavState::Turning);
            assert_eq!(cmd, DriveCmd::pivot(255));
            assert!(report.pos.is_none());
        }

        odom.tick(Side::Left);
        odom.tick(Side::Right);

        // Threshold reached: settle forward, odometry reset, back to following
        let (cmd, report) = step(&mut nav, ON_LINE);
        assert_eq!(cmd, DriveCmd::forward(255.0, 255.0, 255));
        assert_eq!(report.turn_revs, Some(1.5));
        assert_eq!(nav.state(), NavState::Following);
        assert_eq!(nav.turn_count(), 1);
        assert_eq!(odom.snapshot(), OdomSnapshot::default());
        assert!(!report.turn_stalled);
    }

    #[test]
    fn test_return_leg_zones() {
        let mut nav = NavCtrl::default();
        let odom = nav.odometry();

        run_uturn(&mut nav);
        assert_eq!(nav.state(), NavState::Following);

        // Location 2 is a curve on the way back but not on the way out
        tick_n(&odom, Side::Left, 400);
        tick_n(&odom, Side::Right, 400);
        let (_, report) = step(&mut nav, ON_LINE);
        assert_eq!(report.location, 2);
        assert!(report.drive.unwrap().curve);
    }

    #[test]
    fn test_parks_after_second_uturn() {
        let mut nav = NavCtrl::default();

        run_uturn(&mut nav);
        assert_eq!(nav.state(), NavState::Following);

        let settle = run_uturn(&mut nav);
        assert_eq!(settle, DriveCmd::forward(255.0, 255.0, 255));
        assert_eq!(nav.turn_count(), 2);
        assert_eq!(nav.state(), NavState::Parked);

        // Parked forever, whatever the readings
        for reading in [ON_LINE, INTERSECTION, [0; NUM_SENSORS]].iter() {
            let (cmd, report) = step(&mut nav, *reading);
            assert_eq!(cmd, DriveCmd::stop());
            assert_eq!(report.state, NavState::Parked);
            assert!(!report.turn_detected);
        }
        assert_eq!(nav.turn_count(), 2);
    }

    #[test]
    fn test_park_command_mid_turn() {
        let mut nav = NavCtrl::default();
        step(&mut nav, INTERSECTION);
        assert_eq!(nav.state(), NavState::Turning);

        let (cmd, report) = nav
            .proc(&InputData {
                reading: ON_LINE,
                cmd: Some(NavCmd::Park),
            })
            .unwrap();

        assert_eq!(cmd, DriveCmd::stop());
        assert_eq!(report.state, NavState::Parked);
    }

    #[test]
    fn test_stalled_turn_reported() {
        let mut params = NavCtrlParams::default();
        params.turn_stall_warn_cycles = 5;
        let mut nav = NavCtrl::new(params, Arc::new(Odometry::new())).unwrap();

        step(&mut nav, INTERSECTION);

        for i in 1..=10 {
            let (cmd, report) = step(&mut nav, ON_LINE);
            assert_eq!(cmd, DriveCmd::pivot(255));
            assert_eq!(report.turn_stalled, i > 5);
        }
        assert_eq!(nav.state(), NavState::Turning);
    }

    #[test]
    fn test_line_lost_starts_turn() {
        let mut nav = NavCtrl::default();

        let (cmd, report) = step(&mut nav, [3; NUM_SENSORS]);
        assert!(report.turn_detected);
        assert_eq!(nav.state(), NavState::Turning);
        assert_eq!(cmd, DriveCmd::pivot(255));
    }
}
