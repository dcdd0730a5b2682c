//! Single-acting pneumatic solenoid valves.

use deepspace_types::MechError;

/// A pneumatic piston driven by one solenoid valve.
pub trait Solenoid: Send {
    /// Stable identifier for this valve, e.g. `"hatch_linear"`.
    fn id(&self) -> &str;

    /// Drive the piston out (`true`) or let it return (`false`).
    ///
    /// # Errors
    ///
    /// Returns [`MechError::HardwareFault`] if the valve cannot be switched.
    fn set_extended(&mut self, extended: bool) -> Result<(), MechError>;

    /// Last commanded piston position.
    fn is_extended(&self) -> bool;
}
