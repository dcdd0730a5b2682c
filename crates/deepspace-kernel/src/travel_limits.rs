//! [`TravelLimits`] – safety envelope for a linear axis.
//!
//! Every open-loop speed request passes through [`TravelLimits::clamp_speed`]
//! and every closed-loop target through [`TravelLimits::clamp_position`]
//! before it reaches the motor controller.  Positions are in inches from the
//! home end of travel.

use deepspace_types::MechError;

// ────────────────────────────────────────────────────────────────────────────
// TravelLimits
// ────────────────────────────────────────────────────────────────────────────

/// Length of travel plus the soft-limit zone at each end.
///
/// # Example
///
/// ```
/// use deepspace_kernel::TravelLimits;
///
/// let limits = TravelLimits::new(20.0, 2.0, 0.2).unwrap();
/// assert!(limits.in_soft_zone(1.0));
/// assert!((limits.clamp_speed(1.0, -0.9) + 0.2).abs() < 1e-9);
/// assert_eq!(limits.clamp_position(25.0), 20.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelLimits {
    length: f64,
    soft_limit: f64,
    soft_speed: f64,
}

impl TravelLimits {
    /// Build limits for an axis `length` inches long with a `soft_limit`-inch
    /// slow zone at each end where speed magnitude is capped at `soft_speed`.
    ///
    /// # Errors
    ///
    /// [`MechError::Config`] when the length is not positive, the soft zones
    /// overlap, or the soft speed is outside `[0, 1]`.
    pub fn new(length: f64, soft_limit: f64, soft_speed: f64) -> Result<Self, MechError> {
        if length.is_nan() || length <= 0.0 {
            return Err(MechError::Config(format!(
                "travel length must be positive, got {length}"
            )));
        }
        if soft_limit.is_nan() || soft_limit < 0.0 || soft_limit * 2.0 > length {
            return Err(MechError::Config(format!(
                "soft limit {soft_limit} does not fit in travel length {length}"
            )));
        }
        if !(0.0..=1.0).contains(&soft_speed) {
            return Err(MechError::Config(format!(
                "soft limit speed must be within [0, 1], got {soft_speed}"
            )));
        }
        Ok(Self {
            length,
            soft_limit,
            soft_speed,
        })
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn soft_limit(&self) -> f64 {
        self.soft_limit
    }

    pub fn soft_speed(&self) -> f64 {
        self.soft_speed
    }

    /// Midpoint of travel.
    pub fn center(&self) -> f64 {
        self.length / 2.0
    }

    /// `true` when `position` is strictly within `soft_limit` of either end.
    pub fn in_soft_zone(&self, position: f64) -> bool {
        position < self.soft_limit || position > self.length - self.soft_limit
    }

    /// Cap the magnitude of `speed` at the soft speed while in the soft zone,
    /// keeping its sign.  Outside the zone `speed` passes through unchanged.
    pub fn clamp_speed(&self, position: f64, speed: f64) -> f64 {
        if self.in_soft_zone(position) {
            speed.signum() * speed.abs().min(self.soft_speed)
        } else {
            speed
        }
    }

    /// Clamp a position target into `[0, length]`.  NaN maps to home.
    pub fn clamp_position(&self, inches: f64) -> f64 {
        if inches.is_nan() {
            return 0.0;
        }
        inches.clamp(0.0, self.length)
    }
}
