//! Simulation Timestamp Types
//!
//! Ticks are the unit of simulation progress. Each tick covers a fixed number
//! of simulated seconds, so biological durations given in days (gestation,
//! for instance) convert to tick counts through the run's seconds-per-tick.
//!
//! # Example
//!
//! ```
//! use eco_events::{SimTimestamp, ticks_from_days};
//!
//! let ts = SimTimestamp::new(48, 3600.0);
//! assert_eq!(ts.day(), 2);
//! assert_eq!(ts.to_string(), "tick_48.day_2");
//! assert_eq!(ticks_from_days(2.0, 86_400.0), 2.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of simulated seconds in a day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Converts a duration in days to a (fractional) number of ticks.
pub fn ticks_from_days(days: f64, seconds_per_tick: f64) -> f64 {
    days * SECONDS_PER_DAY / seconds_per_tick
}

/// A point in simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimTimestamp {
    /// Number of completed ticks.
    pub tick: u64,
    /// Simulated seconds since the start of the run.
    pub elapsed_seconds: f64,
}

impl SimTimestamp {
    pub fn new(tick: u64, seconds_per_tick: f64) -> Self {
        Self {
            tick,
            elapsed_seconds: tick as f64 * seconds_per_tick,
        }
    }

    /// Whole simulated days elapsed.
    pub fn day(&self) -> u64 {
        (self.elapsed_seconds / SECONDS_PER_DAY).floor() as u64
    }
}

impl fmt::Display for SimTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick_{}.day_{}", self.tick, self.day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_rollover() {
        assert_eq!(SimTimestamp::new(23, 3600.0).day(), 0);
        assert_eq!(SimTimestamp::new(24, 3600.0).day(), 1);
    }

    #[test]
    fn test_ticks_from_days() {
        assert_eq!(ticks_from_days(1.0, 3600.0), 24.0);
        assert_eq!(ticks_from_days(0.5, SECONDS_PER_DAY), 0.5);
    }
}
