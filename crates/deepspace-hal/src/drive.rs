//! Opaque swerve drive base.
//!
//! Wheel kinematics live behind this trait; mechanisms only ask for a body
//! velocity.

use deepspace_types::{DriveCommand, MechError};

pub trait DriveBase: Send {
    fn id(&self) -> &str;

    /// Drive at the given translation vector and rotation rate.
    ///
    /// # Errors
    ///
    /// Returns [`MechError::HardwareFault`] if any module rejects its command.
    fn drive(&mut self, command: DriveCommand) -> Result<(), MechError>;

    /// Neutral every drive and steering motor.
    ///
    /// # Errors
    ///
    /// Returns [`MechError::HardwareFault`] if any module rejects the stop.
    fn stop(&mut self) -> Result<(), MechError> {
        self.drive(DriveCommand::stopped())
    }
}
