//! # Odometry module
//!
//! Two independent tick counters, one per wheel. Each counter is incremented
//! by its own wheel encoder trigger (an interrupt on real hardware, the
//! simulation on the host) and read or reset by the control loop.
//!
//! Counters are lock-free atomics so that an increment racing a read is
//! observed either entirely or not at all. Counts wrap at `u32::MAX`, which
//! is treated as acceptable drift.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod rate;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

pub use rate::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Side of the car a wheel is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Left,
    Right,
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Shared wheel tick counters.
///
/// Share between the trigger source and the control loop with an `Arc`.
#[derive(Debug, Default)]
pub struct Odometry {
    left: AtomicU32,
    right: AtomicU32,
}

/// Both counters read back-to-back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdomSnapshot {
    pub left: u32,
    pub right: u32,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Odometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one encoder trigger on the given side.
    ///
    /// Safe to call from any thread at any time.
    pub fn tick(&self, side: Side) {
        self.counter(side).fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current count on the given side.
    pub fn get(&self, side: Side) -> u32 {
        self.counter(side).load(Ordering::Relaxed)
    }

    /// Reset the given side's count to zero.
    pub fn reset(&self, side: Side) {
        self.counter(side).store(0, Ordering::Relaxed);
    }

    /// Reset both counters.
    pub fn reset_all(&self) {
        self.reset(Side::Left);
        self.reset(Side::Right);
    }

    /// Read both counters as close together as possible.
    pub fn snapshot(&self) -> OdomSnapshot {
        OdomSnapshot {
            left: self.get(Side::Left),
            right: self.get(Side::Right),
        }
    }

    fn counter(&self, side: Side) -> &AtomicU32 {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

impl OdomSnapshot {
    /// Sum of both counters.
    ///
    /// Widened so the sum itself never wraps.
    pub fn total(&self) -> u64 {
        self.left as u64 + self.right as u64
    }

    /// Combined rotation of both wheels in revolutions.
    pub fn revs(&self, ticks_per_rev: u32) -> f64 {
        self.total() as f64 / ticks_per_rev as f64
    }

    /// Whole revolutions of combined rotation, used to bucket the car's
    /// location along the track.
    pub fn location(&self, ticks_per_rev: u32) -> u64 {
        self.total() / ticks_per_rev as u64
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
