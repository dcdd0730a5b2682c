//! Operator input mapping.
//!
//! The primary gamepad drives the robot.  Game intent (score, load, the
//! hatch/ball selector) and the leadscrew controls come from the
//! profile-switched secondary joystick.  [`OperatorInput::sample`] reads both
//! devices exactly once per control cycle.

use deepspace_hal::{InputDevice, ProfiledJoystick};
use deepspace_mechanisms::LeadscrewInput;
use deepspace_types::{DriveCommand, DriverIntent, MechError};
use serde::{Deserialize, Serialize};

/// Highest logical button reachable through the joystick profiles.
const MAX_LOGICAL_BUTTON: usize = 31;

/// Button and axis assignments.
///
/// Gamepad indices are raw; joystick buttons are logical (see
/// [`ProfiledJoystick`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bindings {
    pub drive_x_axis: usize,
    pub drive_y_axis: usize,
    pub drive_rotation_axis: usize,
    /// Stick values at or below this magnitude read as zero.
    pub drive_deadband: f64,

    pub score: usize,
    pub load: usize,
    pub has_loaded: usize,
    pub confirm_scored: usize,
    pub confirm_loaded: usize,
    /// Held: drive the leadscrew from the joystick X axis.
    pub leadscrew_manual: usize,
    /// Held: center the leadscrew on the vision target.
    pub camera_align: usize,
    /// Profile whose axes carry the selector (Z) and leadscrew (X) axes.
    pub axis_profile: usize,
}

impl Default for Bindings {
    fn default() -> Self {
        Self {
            drive_x_axis: 0,
            drive_y_axis: 1,
            drive_rotation_axis: 4,
            drive_deadband: 0.1,
            score: 3,
            load: 4,
            has_loaded: 5,
            confirm_scored: 6,
            confirm_loaded: 7,
            leadscrew_manual: 2,
            camera_align: 8,
            axis_profile: 0,
        }
    }
}

impl Bindings {
    /// # Errors
    ///
    /// [`MechError::Config`] for an unreachable joystick button or profile,
    /// or a deadband outside `[0, 1)`.
    pub fn validate(&self) -> Result<(), MechError> {
        if !(0.0..1.0).contains(&self.drive_deadband) {
            return Err(MechError::Config(format!(
                "bindings.drive_deadband must be within [0, 1), got {}",
                self.drive_deadband
            )));
        }
        if self.axis_profile >= ProfiledJoystick::<Box<dyn InputDevice>>::PROFILES {
            return Err(MechError::Config(format!(
                "bindings.axis_profile {} does not exist",
                self.axis_profile
            )));
        }
        for (name, button) in [
            ("score", self.score),
            ("load", self.load),
            ("has_loaded", self.has_loaded),
            ("confirm_scored", self.confirm_scored),
            ("confirm_loaded", self.confirm_loaded),
            ("leadscrew_manual", self.leadscrew_manual),
            ("camera_align", self.camera_align),
        ] {
            if !(2..=MAX_LOGICAL_BUTTON).contains(&button) {
                return Err(MechError::Config(format!(
                    "bindings.{name} = {button} is not a logical joystick button"
                )));
            }
        }
        Ok(())
    }
}

/// Everything the robot needs from the operators for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OperatorSnapshot {
    pub intent: DriverIntent,
    pub drive: DriveCommand,
    pub leadscrew: LeadscrewInput,
}

pub struct OperatorInput {
    gamepad: Box<dyn InputDevice>,
    joystick: Option<ProfiledJoystick<Box<dyn InputDevice>>>,
    bindings: Bindings,
}

impl OperatorInput {
    pub fn new(
        gamepad: Box<dyn InputDevice>,
        joystick: Option<Box<dyn InputDevice>>,
        bindings: Bindings,
    ) -> Self {
        Self {
            gamepad,
            joystick: joystick.map(ProfiledJoystick::new),
            bindings,
        }
    }

    pub fn has_joystick(&self) -> bool {
        self.joystick.is_some()
    }

    /// Active joystick profile, if there is a joystick.
    pub fn joystick_profile(&self) -> Option<usize> {
        self.joystick.as_ref().map(ProfiledJoystick::profile)
    }

    /// Read both devices.  Without a joystick, game intent and leadscrew
    /// controls stay at rest.
    pub fn sample(&mut self) -> OperatorSnapshot {
        let b = &self.bindings;
        let dead = |v: f64| if v.abs() <= b.drive_deadband { 0.0 } else { v };
        let drive = DriveCommand::new(
            dead(self.gamepad.axis(b.drive_x_axis)),
            // Stick forward is negative.
            -dead(self.gamepad.axis(b.drive_y_axis)),
            dead(self.gamepad.axis(b.drive_rotation_axis)),
        );

        let Some(stick) = self.joystick.as_mut() else {
            return OperatorSnapshot {
                drive,
                ..OperatorSnapshot::default()
            };
        };
        stick.update_profile();

        let intent = DriverIntent {
            score: stick.button(b.score),
            load: stick.button(b.load),
            has_loaded: stick.button(b.has_loaded),
            confirm_scored: stick.button(b.confirm_scored),
            confirm_loaded: stick.button(b.confirm_loaded),
            secondary_axis: stick.z(b.axis_profile),
        };
        let leadscrew = LeadscrewInput {
            manual_held: stick.button(b.leadscrew_manual),
            align_held: stick.button(b.camera_align),
            manual_axis: stick.x(b.axis_profile),
        };
        OperatorSnapshot {
            intent,
            drive,
            leadscrew,
        }
    }
}
