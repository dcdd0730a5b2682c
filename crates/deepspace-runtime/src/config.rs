//! [`RobotConfig`] – every tunable of a robot session in one TOML document.
//!
//! Sections map one-to-one onto the mechanism configs from
//! `deepspace-mechanisms`; any section or field left out of the document
//! takes its default.
//!
//! # Example
//!
//! ```rust
//! use deepspace_runtime::config::RobotConfig;
//! use deepspace_types::RobotState;
//!
//! let cfg = RobotConfig::from_toml_str(r#"
//!     initial_state = "WAITING_TO_LOAD"
//!
//!     [features]
//!     ball = false
//! "#).unwrap();
//!
//! assert_eq!(cfg.initial_state, RobotState::WaitingToLoad);
//! assert!(!cfg.features.ball);
//! assert_eq!(cfg.control_period_ms, 5);
//! ```

use std::time::Duration;

use deepspace_mechanisms::{BallTimings, DriveConfig, HatchTimings, HomingLimits, LeadscrewConfig};
use deepspace_types::{MechError, RobotState};
use serde::{Deserialize, Serialize};

use crate::operator::Bindings;

/// Which optional mechanisms this robot runs.  A disabled mechanism is
/// never constructed, so nothing ever calls into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Features {
    pub drive: bool,
    pub hatch: bool,
    pub ball: bool,
    pub leadscrew: bool,
    /// Vision camera on the leadscrew.  Ignored without a leadscrew.
    pub camera: bool,
    pub secondary_joystick: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            drive: true,
            hatch: true,
            ball: true,
            leadscrew: true,
            camera: true,
            secondary_joystick: true,
        }
    }
}

/// Complete session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Fixed period of the control loop.
    pub control_period_ms: u64,
    /// Robot state entered when the loop leaves homing.
    pub initial_state: RobotState,
    pub features: Features,
    pub leadscrew: LeadscrewConfig,
    pub hatch: HatchTimings,
    pub ball: BallTimings,
    pub drive: DriveConfig,
    pub bindings: Bindings,
    pub homing: HomingLimits,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            control_period_ms: 5,
            initial_state: RobotState::InitialHoldingHatch,
            features: Features::default(),
            leadscrew: LeadscrewConfig::default(),
            hatch: HatchTimings::default(),
            ball: BallTimings::default(),
            drive: DriveConfig::default(),
            bindings: Bindings::default(),
            homing: HomingLimits::default(),
        }
    }
}

impl RobotConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// [`MechError::Config`] for malformed TOML, an unknown state name or an
    /// out-of-range value.
    pub fn from_toml_str(raw: &str) -> Result<Self, MechError> {
        let cfg: RobotConfig =
            toml::from_str(raw).map_err(|e| MechError::Config(format!("invalid config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Render as a TOML document.
    ///
    /// # Errors
    ///
    /// [`MechError::Config`] when serialization fails.
    pub fn to_toml(&self) -> Result<String, MechError> {
        toml::to_string_pretty(self)
            .map_err(|e| MechError::Config(format!("failed to serialize config: {e}")))
    }

    pub fn control_period(&self) -> Duration {
        Duration::from_millis(self.control_period_ms)
    }

    /// # Errors
    ///
    /// [`MechError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), MechError> {
        if self.control_period_ms == 0 {
            return Err(MechError::Config(
                "control_period_ms must be positive".to_string(),
            ));
        }
        if self.homing.max_cycles == 0 {
            return Err(MechError::Config(
                "homing.max_cycles must be positive".to_string(),
            ));
        }
        self.leadscrew.validate()?;
        self.drive.validate()?;
        self.bindings.validate()
    }
}
