//! Simulation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the simulated car and track.
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    /// Simulation time step.
    ///
    /// Units: seconds
    pub dt_s: f64,

    // ---- CAR ----

    /// Distance between the wheels.
    ///
    /// Units: meters
    pub wheel_base_m: f64,

    /// Wheel speed at full duty.
    ///
    /// Units: meters/second
    pub max_wheel_speed_ms: f64,

    /// Duty cycle giving full speed.
    pub pwm_max: u16,

    /// Encoder ticks per meter of wheel travel.
    pub ticks_per_m: f64,

    /// Spacing between neighbouring sensors.
    ///
    /// Units: meters
    pub sensor_pitch_m: f64,

    /// Distance of the sensor array ahead of the axle.
    ///
    /// Units: meters
    pub sensor_offset_m: f64,

    // ---- TRACK ----

    /// `[x, y]` nodes the line runs through, in order. Fewer than two nodes
    /// gives a straight line along the X axis.
    ///
    /// Units: meters
    #[serde(default)]
    pub track_nodes_m: Vec<[f64; 2]>,

    /// Width (standard deviation) of the line's darkness profile.
    ///
    /// Units: meters
    pub line_sigma_m: f64,

    /// Reading over the centre of the line or a stripe.
    pub line_intensity: u16,

    /// Reading over bare floor.
    pub floor_intensity: u16,

    /// Distances along the track of the perpendicular stripes.
    ///
    /// Units: meters
    pub stripes_m: Vec<f64>,

    /// Width of each stripe.
    ///
    /// Units: meters
    pub stripe_width_m: f64,

    // ---- INITIAL CONDITIONS ----

    /// Units: meters
    pub initial_offset_m: f64,

    /// Units: radians
    pub initial_heading_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for SimParams {
    fn default() -> Self {
        Self {
            dt_s: 0.01,
            wheel_base_m: 0.107,
            max_wheel_speed_ms: 0.6,
            pwm_max: 255,
            ticks_per_m: 1600.0,
            sensor_pitch_m: 0.008,
            sensor_offset_m: 0.05,
            track_nodes_m: Vec::new(),
            line_sigma_m: 0.01,
            line_intensity: 2400,
            floor_intensity: 60,
            stripes_m: Vec::new(),
            stripe_width_m: 0.02,
            initial_offset_m: 0.0,
            initial_heading_rad: 0.0,
        }
    }
}
