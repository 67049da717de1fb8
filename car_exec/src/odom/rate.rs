//! Wheel rate estimation from odometry bins

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::OdomSnapshot;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Estimates wheel rates by counting ticks over fixed-length time bins.
///
/// The number of ticks seen in one bin is proportional to wheel speed.
#[derive(Debug, Clone)]
pub struct TickRate {
    bin_len_s: f64,

    /// Snapshot and time at the start of the current bin
    bin_start: Option<(OdomSnapshot, f64)>,

    rates: WheelRates,
}

/// Wheel rates in ticks per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelRates {
    pub left_tps: f64,
    pub right_tps: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TickRate {
    pub fn new(bin_len_s: f64) -> Self {
        Self {
            bin_len_s,
            bin_start: None,
            rates: WheelRates::default(),
        }
    }

    /// Feed the latest snapshot taken at `time_s`.
    ///
    /// Returns the new rates if a bin closed on this update.
    pub fn update(&mut self, snap: OdomSnapshot, time_s: f64) -> Option<WheelRates> {
        let (start, start_time_s) = match self.bin_start {
            Some(s) => s,
            None => {
                self.bin_start = Some((snap, time_s));
                return None;
            }
        };

        let dt = time_s - start_time_s;
        if dt < self.bin_len_s {
            return None;
        }

        self.rates = WheelRates {
            left_tps: bin_delta(start.left, snap.left) as f64 / dt,
            right_tps: bin_delta(start.right, snap.right) as f64 / dt,
        };
        self.bin_start = Some((snap, time_s));

        Some(self.rates)
    }

    /// Rates measured over the last closed bin.
    pub fn rates(&self) -> WheelRates {
        self.rates
    }
}

impl Default for TickRate {
    /// 50 ms bins
    fn default() -> Self {
        Self::new(0.05)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Ticks counted within a bin.
///
/// A count lower than at the start of the bin means the counter was reset
/// part way through, in which case only the ticks since the reset are known.
fn bin_delta(start: u32, end: u32) -> u32 {
    if end >= start {
        end - start
    } else {
        end
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
