//! # Data Store

use crate::{
    hw::DriveCmd,
    nav_ctrl::{self, NavCtrl},
    odom::TickRate,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    // NavCtrl
    pub nav_ctrl: NavCtrl,
    pub nav_ctrl_input: nav_ctrl::InputData,
    pub nav_ctrl_output: DriveCmd,
    pub nav_ctrl_status_rpt: Option<nav_ctrl::StatusReport>,

    // Odometry
    pub tick_rate: TickRate,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears those items that need clearing at the start of a cycle. If no
    /// new command is produced this cycle the wheels are stopped.
    pub fn cycle_start(&mut self) {
        self.nav_ctrl_input = nav_ctrl::InputData::default();
        self.nav_ctrl_output = DriveCmd::stop();
        self.nav_ctrl_status_rpt = None;
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
