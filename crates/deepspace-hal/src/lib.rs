//! `deepspace-hal` – hardware abstraction layer.
//!
//! Mechanisms only ever talk to the traits in this crate, so real drivers and
//! the in-process simulation can be swapped without touching control logic.
//!
//! # Modules
//!
//! - [`motor`] – [`MotorController`][motor::MotorController] (percent and
//!   closed-loop position commands, limit switches) and
//!   [`PositionSensor`][motor::PositionSensor] (encoder readback / zeroing).
//! - [`solenoid`] – single-acting pneumatic [`Solenoid`][solenoid::Solenoid].
//! - [`camera`] – vision target tracker ([`VisionCamera`][camera::VisionCamera]).
//! - [`gyro`] – robot heading ([`Gyro`][gyro::Gyro]).
//! - [`drive`] – opaque swerve base ([`DriveBase`][drive::DriveBase]).
//! - [`input`] – human input devices and the profile-switched
//!   [`ProfiledJoystick`][input::ProfiledJoystick].
//! - [`pid`] – software [`PidController`][pid::PidController] and the
//!   [`ClosedLoopGains`][pid::ClosedLoopGains] pushed to smart controllers.
//! - [`clock`] – monotonic time source injected into timed sequences.
//! - [`hardware`] – [`RobotHardware`][hardware::RobotHardware], the bundle of
//!   every port a robot session owns.
//! - [`sim`] / [`sim_rig`] – simulated drivers with inspection handles, and a
//!   builder that assembles a complete simulated [`RobotHardware`].

pub mod camera;
pub mod clock;
pub mod drive;
pub mod gyro;
pub mod hardware;
pub mod input;
pub mod motor;
pub mod pid;
pub mod sim;
pub mod sim_rig;
pub mod solenoid;

pub use camera::VisionCamera;
pub use clock::{Clock, SystemClock};
pub use drive::DriveBase;
pub use gyro::Gyro;
pub use hardware::{BallPorts, DrivePorts, HatchPorts, LeadscrewPorts, RobotHardware};
pub use input::{InputDevice, ProfiledJoystick};
pub use motor::{LimitSwitch, MotorController, PositionSensor};
pub use pid::{ClosedLoopGains, PidController};
pub use sim_rig::{SimHandles, SimRig};
pub use solenoid::Solenoid;
