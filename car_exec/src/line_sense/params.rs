//! Line sensing parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the turn detector
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TurnDetParams {
    /// If the largest reading is below this floor no line is seen under any
    /// sensor.
    pub no_line_floor: u16,

    /// Relative deviation of the peak from the mean below which the reading
    /// is considered uniform.
    pub min_deviation: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TurnDetParams {
    fn default() -> Self {
        Self {
            no_line_floor: 10,
            min_deviation: 0.15,
        }
    }
}
