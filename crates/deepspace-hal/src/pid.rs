//! Closed-loop gains and a software PID controller.
//!
//! [`ClosedLoopGains`] is what the robot pushes to a smart motor controller
//! (P, I, D, integral zone, allowable error).  [`PidController`] runs the same
//! law in software for loops that have no smart controller behind them, such
//! as the drivetrain's heading hold.
//!
//! # Example
//!
//! ```rust
//! use deepspace_hal::pid::PidController;
//!
//! let mut pid = PidController::new(0.02, 0.0, 0.0);
//! pid.set_set_point(90.0);
//!
//! let output = pid.update(0.0, 0.005);
//! assert!(output > 0.0);
//! ```

use serde::{Deserialize, Serialize};

/// Gains for one closed-loop slot.
///
/// `integral_zone` and `tolerance` are expressed in the same unit as the
/// measured value (native ticks for motor controllers).  An `integral_zone`
/// of zero disables the zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosedLoopGains {
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub integral_zone: f64,
    pub tolerance: f64,
}

impl Default for ClosedLoopGains {
    fn default() -> Self {
        Self {
            p: 0.0,
            i: 0.0,
            d: 0.0,
            integral_zone: 0.0,
            tolerance: 0.0,
        }
    }
}

/// A tunable PID controller for closed-loop feedback control.
#[derive(Debug, Clone)]
pub struct PidController {
    gains: ClosedLoopGains,
    set_point: f64,
    integral: f64,
    last_error: Option<f64>,
    output_min: f64,
    output_max: f64,
    /// Input range treated as a circle, e.g. `(-180, 180)` for headings.
    continuous: Option<(f64, f64)>,
}

impl PidController {
    /// Create a controller with P, I and D only.  Output is unclamped.
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self::from_gains(ClosedLoopGains {
            p: kp,
            i: ki,
            d: kd,
            ..ClosedLoopGains::default()
        })
    }

    /// Create a controller from a full gain set.
    pub fn from_gains(gains: ClosedLoopGains) -> Self {
        Self {
            gains,
            set_point: 0.0,
            integral: 0.0,
            last_error: None,
            output_min: f64::NEG_INFINITY,
            output_max: f64::INFINITY,
            continuous: None,
        }
    }

    pub fn gains(&self) -> &ClosedLoopGains {
        &self.gains
    }

    pub fn set_gains(&mut self, gains: ClosedLoopGains) {
        self.gains = gains;
    }

    pub fn set_set_point(&mut self, set_point: f64) {
        self.set_point = set_point;
    }

    pub fn set_point(&self) -> f64 {
        self.set_point
    }

    /// Clamp the controller output (and integral wind-up) to `[min, max]`.
    pub fn set_output_limits(&mut self, min: f64, max: f64) {
        self.output_min = min;
        self.output_max = max;
    }

    /// Treat `[min, max)` as a wrapping input so the error always takes the
    /// short way round.
    pub fn enable_continuous_input(&mut self, min: f64, max: f64) {
        self.continuous = Some((min, max));
    }

    /// Error between the set-point and `measurement`, wrapped when continuous
    /// input is enabled.
    pub fn error(&self, measurement: f64) -> f64 {
        let raw = self.set_point - measurement;
        match self.continuous {
            Some((min, max)) => {
                let span = max - min;
                let half = span / 2.0;
                (raw + half).rem_euclid(span) - half
            }
            None => raw,
        }
    }

    /// Whether `measurement` is within the configured tolerance.
    pub fn at_set_point(&self, measurement: f64) -> bool {
        self.error(measurement).abs() <= self.gains.tolerance
    }

    /// Compute the next controller output.
    ///
    /// Returns `0.0` without touching internal state if `dt` is not positive,
    /// and `0.0` (with the integral cleared) while the error is within
    /// tolerance.
    pub fn update(&mut self, measurement: f64, dt: f64) -> f64 {
        if dt <= 0.0 {
            return 0.0;
        }

        let error = self.error(measurement);
        if self.gains.tolerance > 0.0 && error.abs() <= self.gains.tolerance {
            self.integral = 0.0;
            self.last_error = Some(error);
            return 0.0;
        }

        let p = self.gains.p * error;

        let in_zone = self.gains.integral_zone <= 0.0 || error.abs() < self.gains.integral_zone;
        if in_zone {
            self.integral += error * dt;
        } else {
            self.integral = 0.0;
        }
        let i = (self.gains.i * self.integral).clamp(self.output_min, self.output_max);
        if self.gains.i.abs() > f64::EPSILON {
            self.integral = i / self.gains.i;
        }

        let d = match self.last_error {
            Some(prev) => self.gains.d * (error - prev) / dt,
            None => 0.0,
        };
        self.last_error = Some(error);

        (p + i + d).clamp(self.output_min, self.output_max)
    }

    /// Clear the integral accumulator and derivative memory.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = None;
    }
}
