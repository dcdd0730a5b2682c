//! [`CycleWatchdog`] – control cycle overrun detection.
//!
//! The control loop calls [`CycleWatchdog::begin`] at the top of every cycle
//! and [`CycleWatchdog::finish`] at the bottom.  A cycle whose body takes
//! longer than the configured period is reported as an overrun and logged at
//! `warn`.  Time is passed in by the caller so the watchdog works with an
//! injected clock.

use std::time::{Duration, Instant};

/// Outcome of a single finished cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleHealth {
    /// The cycle finished within its period.
    OnTime,
    /// The cycle took longer than its period.
    Overrun(Duration),
    /// `finish` was called without a matching `begin`.
    Unstarted,
}

/// Measures each control cycle against a fixed period.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use deepspace_kernel::{CycleHealth, CycleWatchdog};
///
/// let mut wd = CycleWatchdog::new(Duration::from_millis(5));
/// let t0 = Instant::now();
/// wd.begin(t0);
/// assert_eq!(wd.finish(t0 + Duration::from_millis(2)), CycleHealth::OnTime);
/// ```
#[derive(Debug, Clone)]
pub struct CycleWatchdog {
    period: Duration,
    started: Option<Instant>,
    cycles: u64,
    overruns: u64,
    worst: Duration,
}

impl CycleWatchdog {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            started: None,
            cycles: 0,
            overruns: 0,
            worst: Duration::ZERO,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Mark the start of a cycle at `now`.
    pub fn begin(&mut self, now: Instant) {
        self.started = Some(now);
    }

    /// Mark the end of the current cycle at `now` and classify it.
    pub fn finish(&mut self, now: Instant) -> CycleHealth {
        let Some(started) = self.started.take() else {
            return CycleHealth::Unstarted;
        };
        let elapsed = now.saturating_duration_since(started);
        self.cycles += 1;
        self.worst = self.worst.max(elapsed);
        if elapsed > self.period {
            self.overruns += 1;
            tracing::warn!(
                elapsed_us = elapsed.as_micros() as u64,
                period_us = self.period.as_micros() as u64,
                overruns = self.overruns,
                "control cycle overran its period"
            );
            CycleHealth::Overrun(elapsed)
        } else {
            CycleHealth::OnTime
        }
    }

    /// Number of finished cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Longest cycle seen so far.
    pub fn worst(&self) -> Duration {
        self.worst
    }
}
