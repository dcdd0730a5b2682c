//! Monotonic time source.

use std::time::Instant;

/// Source of monotonic timestamps.  Injected wherever control logic measures
/// elapsed time so tests can step time explicitly.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock [`Clock`] backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
