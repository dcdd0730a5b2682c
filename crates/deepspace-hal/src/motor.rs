//! Motor controller and position encoder traits.
//!
//! A smart motor controller runs its own closed loop; the robot only pushes
//! gains and targets and reads back the loop error.  The encoder is a
//! separate port so that one mechanism can own both halves exclusively.

use deepspace_types::MechError;

use crate::pid::ClosedLoopGains;

/// The two physical travel limit switches wired to a motor controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitSwitch {
    /// The end the mechanism zeroes against.
    Home,
    /// The opposite end of travel.
    Far,
}

/// Command and telemetry interface of a single motor controller.
pub trait MotorController: Send {
    /// Stable identifier, e.g. `"leadscrew"`.
    fn id(&self) -> &str;

    /// Open-loop output as a signed fraction in `[-1, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`MechError::HardwareFault`] if the controller rejects the
    /// command.
    fn set_percent_output(&mut self, percent: f64) -> Result<(), MechError>;

    /// Closed-loop position target in native sensor ticks.
    ///
    /// # Errors
    ///
    /// Returns [`MechError::HardwareFault`] if the controller rejects the
    /// command.
    fn set_position_target(&mut self, ticks: f64) -> Result<(), MechError>;

    /// Push closed-loop gains to the controller's slot 0.
    ///
    /// # Errors
    ///
    /// Returns [`MechError::HardwareFault`] if the configuration frame fails.
    fn configure_gains(&mut self, gains: &ClosedLoopGains) -> Result<(), MechError>;

    /// Last closed-loop target, in native ticks.
    fn closed_loop_target(&self) -> f64;

    /// Current closed-loop error (`target - measured`), in native ticks.
    fn closed_loop_error(&self) -> f64;

    /// Whether the given limit switch is currently closed.
    fn limit_switch_closed(&self, switch: LimitSwitch) -> bool;

    /// Output currently applied, as a signed fraction.
    fn output_percent(&self) -> f64;
}

/// A relative position encoder.
pub trait PositionSensor: Send {
    fn id(&self) -> &str;

    /// Position in native ticks relative to the last reset.
    fn position_ticks(&self) -> f64;

    /// Overwrite the stored position reference.
    ///
    /// # Errors
    ///
    /// Returns [`MechError::HardwareFault`] if the sensor cannot be written.
    fn set_position_ticks(&mut self, ticks: f64) -> Result<(), MechError>;
}
