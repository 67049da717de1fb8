//! Executable parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the car executable.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecParams {
    /// Target period of one cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Number of cycles to run before parking and exiting.
    pub max_cycles: u64,

    /// Length of the odometry bins used to estimate wheel rates.
    ///
    /// Units: seconds
    pub rate_bin_s: f64,

    /// Write telemetry frames into the session archive.
    pub tm_enabled: bool,

    /// Number of start markers before each telemetry frame.
    pub tm_start_len: usize,

    /// Number of end markers after each telemetry frame.
    pub tm_end_len: usize,
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimParams;

    #[test]
    fn test_params_files() -> Result<(), util::params::LoadError> {
        let exec: ExecParams = util::params::parse(include_str!("../../params/car_exec.toml"))?;
        assert!(exec.cycle_period_s > 0.0);
        assert!(exec.tm_start_len > 0 && exec.tm_end_len > 0);

        let sim: SimParams = util::params::parse(include_str!("../../params/sim.toml"))?;
        assert_eq!(sim.stripes_m, vec![1.0, -0.6]);
        assert_eq!(sim.pwm_max, 255);

        Ok(())
    }
}
