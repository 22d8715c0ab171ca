//! Loop Pacing
//!
//! Runs loop phases at fixed wall-clock rates. A driver loop calls
//! [`PhasedLoop::limit`] on its fastest phase once per iteration and asks each
//! phase [`should_run`](PhasedLoop::should_run) before running it.

use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PhasedLoop {
    period: Duration,
    last_run: Option<Instant>,
}

impl PhasedLoop {
    /// `rate` is the target number of runs per second and must be positive.
    pub fn new(rate: f64) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / rate),
            last_run: None,
        }
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.period = Duration::from_secs_f64(1.0 / rate);
    }

    pub fn rate(&self) -> f64 {
        1.0 / self.period.as_secs_f64()
    }

    /// Sleeps until a full period has passed since the last run, then marks
    /// a new run.
    pub fn limit(&mut self) {
        if let Some(last) = self.last_run {
            let elapsed = last.elapsed();
            if elapsed < self.period {
                thread::sleep(self.period - elapsed);
            }
        }
        self.last_run = Some(Instant::now());
    }

    /// True, and marks a run, if a full period has passed since the last run.
    pub fn should_run(&mut self) -> bool {
        let now = Instant::now();
        match self.last_run {
            Some(last) if now.duration_since(last) < self.period => false,
            _ => {
                self.last_run = Some(now);
                true
            }
        }
    }
}
