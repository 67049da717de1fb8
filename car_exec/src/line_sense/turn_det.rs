//! Turn and intersection detection

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::TurnDetParams;
use crate::hw::{SensorReading, NUM_SENSORS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Binary classifier for intersections and line loss.
///
/// No hysteresis is applied, noisy readings near the threshold may flicker
/// between cycles.
#[derive(Debug, Clone, Copy)]
pub struct TurnDetector {
    params: TurnDetParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TurnDetector {
    pub fn new(params: TurnDetParams) -> Self {
        Self { params }
    }

    /// True if the reading shows an intersection or no line at all.
    pub fn is_turn(&self, reading: &SensorReading) -> bool {
        let outlier = reading.iter().copied().max().unwrap_or(0);

        // Nothing under any sensor
        if outlier < self.params.no_line_floor {
            return true;
        }

        match deviation(reading) {
            Some(d) => d < self.params.min_deviation,
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Relative deviation of the largest value from the mean of the reading.
///
/// Returns `None` for an all-zero reading.
pub fn deviation(reading: &SensorReading) -> Option<f64> {
    let avg = reading.iter().map(|&v| v as f64).sum::<f64>() / NUM_SENSORS as f64;
    let outlier = reading.iter().copied().max().unwrap_or(0) as f64;

    if avg == 0.0 {
        return None;
    }

    Some((avg - outlier).abs() / avg)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
