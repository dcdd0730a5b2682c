//! `deepspace-runtime` – robot assembly and the control loop.
//!
//! Turns a [`RobotHardware`][deepspace_hal::RobotHardware] bundle and a
//! [`RobotConfig`] into a running robot session.
//!
//! # Modules
//!
//! - [`config`] – [`RobotConfig`][config::RobotConfig]: control period,
//!   initial state, per-mechanism feature flags and every mechanism's tuning,
//!   loaded from TOML and validated before any hardware is touched.
//! - [`operator`] – [`OperatorInput`][operator::OperatorInput]: maps the
//!   primary gamepad and the profile-switched secondary joystick onto a
//!   per-cycle [`OperatorSnapshot`][operator::OperatorSnapshot].
//! - [`robot`] – [`Robot::assemble`][robot::Robot::assemble]: builds only the
//!   mechanisms that are both enabled and physically present.
//! - [`state_machine`] – [`RobotStateMachine`][state_machine::RobotStateMachine]:
//!   the game-level state machine that coordinates the intake and the
//!   drivetrain, with single-cycle transition delay.
//! - [`control_loop`] – [`ControlLoop`][control_loop::ControlLoop]: homing,
//!   fixed-period cycling, fatal-error and stop-edge handling, and per-cycle
//!   telemetry.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: initialises
//!   the global `tracing` subscriber with an optional OTLP span exporter, and
//!   [`TracingSink`][telemetry::TracingSink] which forwards robot telemetry
//!   into it.

pub mod config;
pub mod control_loop;
pub mod operator;
pub mod robot;
pub mod state_machine;
pub mod telemetry;

pub use config::{Features, RobotConfig};
pub use control_loop::{ControlLoop, Phase};
pub use operator::{Bindings, OperatorInput, OperatorSnapshot};
pub use robot::Robot;
pub use state_machine::{RobotStateMachine, SubsystemStatus, next_state};
pub use telemetry::{TracerProviderGuard, TracingSink, init_tracing};
