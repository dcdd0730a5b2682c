//! Tunables for every mechanism.
//!
//! All structs deserialize from partial TOML: any field left out takes the
//! value from the type's [`Default`] impl.

use std::time::Duration;

use deepspace_hal::ClosedLoopGains;
use deepspace_kernel::TravelLimits;
use deepspace_types::MechError;
use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Leadscrew
// ────────────────────────────────────────────────────────────────────────────

/// Geometry, gains and operator tuning of the hatch leadscrew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadscrewConfig {
    /// Usable travel in inches, measured from the home end.
    pub length_in: f64,
    /// Width of the slow zone at each end of travel.
    pub soft_limit_in: f64,
    /// Speed magnitude cap inside the slow zone.
    pub soft_limit_speed: f64,
    /// Encoder ticks per inch of travel.
    pub ticks_per_inch: f64,
    /// Closed-loop slot pushed to the motor controller; `tolerance` is in
    /// ticks.
    pub gains: ClosedLoopGains,
    /// Vision corrections smaller than this (inches) are not commanded.
    pub camera_tolerance_in: f64,
    /// Distance from the camera to the target plane, used to turn the
    /// camera's angle into a lateral offset.
    pub target_distance_in: f64,
    pub vision_pipeline: u8,
    /// Manual axis values at or below this magnitude are ignored.
    pub manual_deadband: f64,
    pub manual_scale: f64,
    /// Homing speed magnitude outside the slow zone.
    pub homing_speed: f64,
    /// Homing speed magnitude inside the slow zone.
    pub homing_soft_speed: f64,
}

impl Default for LeadscrewConfig {
    fn default() -> Self {
        Self {
            length_in: 20.0,
            soft_limit_in: 2.0,
            soft_limit_speed: 0.2,
            ticks_per_inch: 4096.0,
            gains: ClosedLoopGains {
                p: 0.4,
                i: 0.0,
                d: 0.0,
                integral_zone: 0.0,
                tolerance: 200.0,
            },
            camera_tolerance_in: 0.5,
            target_distance_in: 24.0,
            vision_pipeline: 0,
            manual_deadband: 0.25,
            manual_scale: 0.8,
            homing_speed: 0.7,
            homing_soft_speed: 0.2,
        }
    }
}

impl LeadscrewConfig {
    /// Build and validate the travel envelope.
    ///
    /// # Errors
    ///
    /// [`MechError::Config`] when the geometry is inconsistent.
    pub fn travel_limits(&self) -> Result<TravelLimits, MechError> {
        TravelLimits::new(self.length_in, self.soft_limit_in, self.soft_limit_speed)
    }

    /// Check every field that would otherwise produce nonsense commands.
    ///
    /// # Errors
    ///
    /// [`MechError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), MechError> {
        self.travel_limits()?;
        if self.ticks_per_inch.is_nan() || self.ticks_per_inch <= 0.0 {
            return Err(MechError::Config(format!(
                "leadscrew.ticks_per_inch must be positive, got {}",
                self.ticks_per_inch
            )));
        }
        for (name, speed) in [
            ("homing_speed", self.homing_speed),
            ("homing_soft_speed", self.homing_soft_speed),
            ("manual_scale", self.manual_scale),
        ] {
            if !(0.0..=1.0).contains(&speed) {
                return Err(MechError::Config(format!(
                    "leadscrew.{name} must be within [0, 1], got {speed}"
                )));
            }
        }
        Ok(())
    }

    /// Total travel in encoder ticks.
    pub fn travel_ticks(&self) -> f64 {
        self.length_in * self.ticks_per_inch
    }
}

/// Bounds on the homing routine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomingLimits {
    /// Give up after this many homing steps.
    pub max_cycles: u32,
    /// Pause between steps of the blocking routine.  The control loop's own
    /// period paces homing when it runs as a loop phase.
    pub step_period_ms: u64,
}

impl Default for HomingLimits {
    fn default() -> Self {
        Self {
            max_cycles: 4000,
            step_period_ms: 5,
        }
    }
}

impl HomingLimits {
    pub fn step_period(&self) -> Duration {
        Duration::from_millis(self.step_period_ms)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pneumatic timings
// ────────────────────────────────────────────────────────────────────────────

/// Piston travel times of the hatch intake, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HatchTimings {
    pub linear_out_ms: u64,
    pub rotary_contract_ms: u64,
    pub rotary_expand_ms: u64,
}

impl Default for HatchTimings {
    fn default() -> Self {
        Self {
            linear_out_ms: 500,
            rotary_contract_ms: 300,
            rotary_expand_ms: 300,
        }
    }
}

impl HatchTimings {
    pub fn linear_out(&self) -> Duration {
        Duration::from_millis(self.linear_out_ms)
    }

    pub fn rotary_contract(&self) -> Duration {
        Duration::from_millis(self.rotary_contract_ms)
    }

    pub fn rotary_expand(&self) -> Duration {
        Duration::from_millis(self.rotary_expand_ms)
    }
}

/// Piston travel times of the ball intake, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallTimings {
    pub lock_close_ms: u64,
    pub rotary_open_ms: u64,
    pub retain_release_ms: u64,
}

impl Default for BallTimings {
    fn default() -> Self {
        Self {
            lock_close_ms: 300,
            rotary_open_ms: 500,
            retain_release_ms: 400,
        }
    }
}

impl BallTimings {
    pub fn lock_close(&self) -> Duration {
        Duration::from_millis(self.lock_close_ms)
    }

    pub fn rotary_open(&self) -> Duration {
        Duration::from_millis(self.rotary_open_ms)
    }

    pub fn retain_release(&self) -> Duration {
        Duration::from_millis(self.retain_release_ms)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Drivetrain
// ────────────────────────────────────────────────────────────────────────────

/// Heading-hold loop and precision driving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Software PID on gyro heading; `tolerance` is in degrees.
    pub heading_gains: ClosedLoopGains,
    /// Heading held while loading from the station, degrees.
    pub hold_heading_deg: f64,
    /// Rotation command magnitude cap while holding heading.
    pub max_rotation: f64,
    /// Translation scale applied while the intake is extended.
    pub precision_scale: f64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            heading_gains: ClosedLoopGains {
                p: 0.02,
                i: 0.0,
                d: 0.001,
                integral_zone: 0.0,
                tolerance: 1.0,
            },
            hold_heading_deg: 0.0,
            max_rotation: 0.6,
            precision_scale: 0.4,
        }
    }
}

impl DriveConfig {
    /// # Errors
    ///
    /// [`MechError::Config`] when a scale or cap is outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), MechError> {
        for (name, value) in [
            ("precision_scale", self.precision_scale),
            ("max_rotation", self.max_rotation),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MechError::Config(format!(
                    "drive.{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        LeadscrewConfig::default().validate().unwrap();
        DriveConfig::default().validate().unwrap();
        assert_eq!(LeadscrewConfig::default().travel_ticks(), 20.0 * 4096.0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: LeadscrewConfig = toml::from_str(
            r#"
            length_in = 18.0
            [gains]
            p = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.length_in, 18.0);
        assert_eq!(cfg.soft_limit_in, 2.0);
        assert_eq!(cfg.gains.p, 1.5);
        assert_eq!(cfg.gains.tolerance, 0.0);
    }

    #[test]
    fn bad_geometry_rejected() {
        let cfg = LeadscrewConfig {
            soft_limit_in: 15.0,
            ..LeadscrewConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(MechError::Config(_))));

        let cfg = LeadscrewConfig {
            ticks_per_inch: 0.0,
            ..LeadscrewConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = LeadscrewConfig {
            homing_speed: 1.2,
            ..LeadscrewConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn drive_scale_out_of_range_rejected() {
        let cfg = DriveConfig {
            precision_scale: -0.1,
            ..DriveConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn timings_convert_to_durations() {
        let h = HatchTimings::default();
        assert_eq!(h.linear_out(), Duration::from_millis(500));
        let b = BallTimings::default();
        assert_eq!(b.retain_release(), Duration::from_millis(400));
        assert_eq!(HomingLimits::default().step_period(), Duration::from_millis(5));
    }
}
