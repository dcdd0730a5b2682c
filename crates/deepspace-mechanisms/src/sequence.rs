//! [`StepSequence`] – time-driven posture sequence.
//!
//! Pneumatic pistons have no position feedback, so multi-step moves are
//! sequenced by elapsed time since the sequence was (re)started.  Each step
//! begins at a fixed offset; the sequence is complete once the last step has
//! begun.

use std::sync::Arc;
use std::time::{Duration, Instant};

use deepspace_hal::Clock;

/// An ordered list of `(start offset, step)` pairs.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use deepspace_hal::sim::ManualClock;
/// use deepspace_mechanisms::StepSequence;
///
/// let clock = ManualClock::new();
/// let mut seq = StepSequence::new(Arc::new(clock.clone()), "extend")
///     .then(Duration::from_millis(500), "release");
///
/// seq.restart();
/// assert_eq!(seq.current(), "extend");
/// clock.advance(Duration::from_millis(500));
/// assert_eq!(seq.current(), "release");
/// assert!(seq.is_complete());
/// ```
pub struct StepSequence<S> {
    clock: Arc<dyn Clock>,
    steps: Vec<(Duration, S)>,
    started: Option<Instant>,
}

impl<S: Copy> StepSequence<S> {
    /// A sequence whose first step begins immediately.
    pub fn new(clock: Arc<dyn Clock>, first: S) -> Self {
        Self {
            clock,
            steps: vec![(Duration::ZERO, first)],
            started: None,
        }
    }

    /// Append a step that begins `at` after the start.  Offsets must not
    /// decrease; a smaller offset is raised to the previous one.
    pub fn then(mut self, at: Duration, step: S) -> Self {
        let floor = self.steps.last().map_or(Duration::ZERO, |(t, _)| *t);
        self.steps.push((at.max(floor), step));
        self
    }

    /// Start (or start again) from the first step.
    pub fn restart(&mut self) {
        self.started = Some(self.clock.now());
    }

    /// Time since the last restart, zero if never started.
    pub fn elapsed(&self) -> Duration {
        self.started
            .map_or(Duration::ZERO, |t| self.clock.now().saturating_duration_since(t))
    }

    /// Index of the active step.
    pub fn step_index(&self) -> usize {
        let elapsed = self.elapsed();
        self.steps
            .iter()
            .rposition(|(at, _)| *at <= elapsed)
            .unwrap_or(0)
    }

    /// The active step.
    pub fn current(&self) -> S {
        self.steps[self.step_index()].1
    }

    /// `true` once started and the last step has begun.
    pub fn is_complete(&self) -> bool {
        self.started.is_some() && self.step_index() + 1 == self.steps.len()
    }
}
