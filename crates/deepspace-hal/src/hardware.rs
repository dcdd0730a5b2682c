//! [`RobotHardware`] – every port a robot session owns.
//!
//! Ports are grouped per mechanism so each group can be moved, whole, into
//! the one mechanism that owns it.  Groups are optional: a mechanism that is
//! disabled by configuration simply has no ports.

use std::sync::Arc;

use crate::camera::VisionCamera;
use crate::clock::Clock;
use crate::drive::DriveBase;
use crate::gyro::Gyro;
use crate::input::InputDevice;
use crate::motor::{MotorController, PositionSensor};
use crate::solenoid::Solenoid;

/// Motor, encoder and (optional) alignment camera of the leadscrew.
pub struct LeadscrewPorts {
    pub motor: Box<dyn MotorController>,
    pub encoder: Box<dyn PositionSensor>,
    pub camera: Option<Box<dyn VisionCamera>>,
}

/// Linear (reach) and rotary (grip) pistons of the hatch intake.
pub struct HatchPorts {
    pub linear: Box<dyn Solenoid>,
    pub rotary: Box<dyn Solenoid>,
}

/// Lock, rotary and retain pistons of the ball intake.
pub struct BallPorts {
    pub lock: Box<dyn Solenoid>,
    pub rotary: Box<dyn Solenoid>,
    pub retain: Box<dyn Solenoid>,
}

/// Swerve base and heading sensor.
pub struct DrivePorts {
    pub base: Box<dyn DriveBase>,
    pub gyro: Box<dyn Gyro>,
}

/// The complete set of hardware handed to a robot session.
pub struct RobotHardware {
    /// Primary driver gamepad.
    pub gamepad: Box<dyn InputDevice>,
    /// Secondary operator joystick (profile-switched).
    pub joystick: Option<Box<dyn InputDevice>>,
    pub leadscrew: Option<LeadscrewPorts>,
    pub hatch: Option<HatchPorts>,
    pub ball: Option<BallPorts>,
    pub drive: Option<DrivePorts>,
    pub clock: Arc<dyn Clock>,
}
