//! Position estimation from a reflectance reading

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::warn;

use crate::hw::{SensorReading, NUM_SENSORS};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Position estimate of a line centred under the array, the mean of 1..=N.
pub const CENTER_POS: f64 = (NUM_SENSORS as f64 + 1.0) / 2.0;

/// Largest distance an estimate can be from [`CENTER_POS`].
pub const MAX_DEVIATION: f64 = NUM_SENSORS as f64 - CENTER_POS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Estimates where the line is under the array.
///
/// Keeps the last valid estimate so that an all-zero reading, which has no
/// defined centroid, holds the previous position.
#[derive(Debug, Clone)]
pub struct PosEstimator {
    last: f64,
    held: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PosEstimator {
    pub fn new() -> Self {
        Self {
            last: CENTER_POS,
            held: false,
        }
    }

    /// Estimate the line position for this reading.
    ///
    /// The result is always within `[1, N]`.
    pub fn estimate(&mut self, reading: &SensorReading) -> f64 {
        match centroid(reading) {
            Some(p) => {
                self.last = p;
                self.held = false;
            }
            None => {
                if !self.held {
                    warn!(
                        "All-zero sensor reading, holding position estimate at {:.3}",
                        self.last
                    );
                }
                self.held = true;
            }
        }

        self.last
    }

    /// True if the last estimate was held from a previous cycle.
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// The most recent estimate.
    pub fn last(&self) -> f64 {
        self.last
    }
}

impl Default for PosEstimator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Intensity-weighted average of the two strongest sensor positions.
///
/// Positions are 1-based. Ties go to the lowest index, for both the largest
/// and second largest values. Returns `None` if every value is zero.
pub fn centroid(reading: &SensorReading) -> Option<f64> {
    let (pos_1, max_1) = peak(reading, None);
    let (pos_2, max_2) = peak(reading, Some(pos_1));

    let norm = max_1 as f64 + max_2 as f64;
    if norm == 0.0 {
        return None;
    }

    let weighted = max_1 as f64 * (pos_1 + 1) as f64 + max_2 as f64 * (pos_2 + 1) as f64;

    Some(weighted / norm)
}

/// Index and value of the first strictly-largest value, skipping `exclude`.
///
/// If nothing beats zero the index is 0 with a value of 0.
fn peak(reading: &SensorReading, exclude: Option<usize>) -> (usize, u16) {
    let mut best = (0, 0);

    for (i, &v) in reading.iter().enumerate() {
        if Some(i) == exclude {
            continue;
        }
        if v > best.1 {
            best = (i, v);
        }
    }

    best
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_single_peak() {
        for i in 0..NUM_SENSORS {
            let mut reading = [0u16; NUM_SENSORS];
            reading[i] = 700;
            assert_eq!(centroid(&reading), Some((i + 1) as f64));
        }
    }

    #[test]
    fn test_two_peaks() {
        let reading = [0, 0, 0, 300, 900, 0, 0, 0];
        // (900 * 5 + 300 * 4) / 1200
        assert!((centroid(&reading).unwrap() - 4.75).abs() < 1e-12);

        let reading = [0, 0, 0, 600, 600, 0, 0, 0];
        assert_eq!(centroid(&reading), Some(CENTER_POS));
    }

    #[test]
    fn test_tie_breaking() {
        // Three equal maxima: the first two by index win
        let reading = [0, 500, 0, 0, 0, 500, 0, 500];
        assert_eq!(centroid(&reading), Some(4.0));

        // Equal second maxima either side of the peak: the lower index wins
        let reading = [0, 0, 200, 800, 200, 0, 0, 0];
        assert!((centroid(&reading).unwrap() - 3.8).abs() < 1e-12);
    }

    #[test]
    fn test_range() {
        let readings: [SensorReading; 5] = [
            [2500, 2500, 2500, 2500, 2500, 2500, 2500, 2500],
            [2500, 0, 0, 0, 0, 0, 0, 2500],
            [1, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0, 1],
            [13, 890, 44, 1200, 7, 2400, 3, 600],
        ];

        for r in readings.iter() {
            let p = centroid(r).unwrap();
            assert!(p >= 1.0 && p <= NUM_SENSORS as f64, "{} out of range", p);
        }
    }

    #[test]
    fn test_range_sweep() {
        // Fixed seed linear congruential generator
        let mut state: u64 = 0x5eed;
        let mut next = || {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            state >> 33
        };

        let mut est = PosEstimator::new();

        for _ in 0..20_000 {
            let mut reading = [0u16; NUM_SENSORS];
            for r in reading.iter_mut() {
                let v = next();
                // About a quarter of the values are zero
                *r = if v & 3 == 0 { 0 } else { ((v >> 2) % 2501) as u16 };
            }

            match centroid(&reading) {
                Some(p) => {
                    assert!(p >= 1.0 && p <= NUM_SENSORS as f64, "{} from {:?}", p, reading);
                    assert_eq!(est.estimate(&reading), p);
                }
                None => {
                    assert!(reading.iter().all(|&v| v == 0));
                    let last = est.last();
                    assert_eq!(est.estimate(&reading), last);
                }
            }
        }
    }

    #[test]
    fn test_all_zero_holds() {
        let mut est = PosEstimator::new();

        // Nothing seen yet, hold the centre
        assert_eq!(est.estimate(&[0; NUM_SENSORS]), CENTER_POS);
        assert!(est.is_held());

        assert_eq!(est.estimate(&[0, 0, 0, 0, 0, 0, 900, 0]), 7.0);
        assert!(!est.is_held());

        assert_eq!(est.estimate(&[0; NUM_SENSORS]), 7.0);
        assert!(est.is_held());
        assert_eq!(est.last(), 7.0);
    }
}
