//! `deepspace-types` – shared vocabulary for the robot workspace.
//!
//! Every crate in the workspace speaks in terms of the types defined here:
//!
//! - [`state`] – the closed state enums of the robot and of each mechanism
//!   ([`RobotState`], [`LeadscrewState`], …).  Raw encodings (numeric codes,
//!   dashboard names) are decoded through `TryFrom<u8>` / `FromStr`, which is
//!   the only place an unknown state can appear.
//! - [`intent`] – per-cycle operator snapshots ([`DriverIntent`],
//!   [`DriveCommand`]).
//! - [`telemetry`] – the dashboard sink abstraction ([`TelemetrySink`]).
//! - [`MechError`] – the workspace-wide error type.

pub mod intent;
pub mod state;
pub mod telemetry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use intent::{DriveCommand, DriverIntent};
pub use state::{
    BallIntakeState, DrivetrainState, HatchIntakeState, IntakeState, LeadscrewState, RobotState,
};
pub use telemetry::{MemorySink, Telemetered, TelemetrySink, TelemetryValue};

/// Global error type spanning decode failures, hardware faults and homing.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MechError {
    /// A state value outside the closed enumeration reached a dispatch point.
    #[error("Unknown {mechanism} state: {value}")]
    UnknownState { mechanism: String, value: String },

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Homing did not reach the home limit switch within {cycles} cycles")]
    HomingTimedOut { cycles: u32 },

    #[error("Homing aborted by caller")]
    HomingAborted,

    #[error("Configuration Error: {0}")]
    Config(String),
}

impl MechError {
    /// Fatal errors stop every mechanism and take the control loop out of
    /// its running phase.  They are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MechError::UnknownState { .. } | MechError::HardwareFault { .. }
        )
    }

    /// Shorthand for a [`MechError::HardwareFault`].
    pub fn hardware(component: impl Into<String>, details: impl Into<String>) -> Self {
        MechError::HardwareFault {
            component: component.into(),
            details: details.into(),
        }
    }
}
