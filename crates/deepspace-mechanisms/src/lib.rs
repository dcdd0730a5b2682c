//! `deepspace-mechanisms` – the robot's physical subsystems.
//!
//! Each subsystem implements [`deepspace_kernel::Mechanism`] over one of the
//! closed state enums from `deepspace-types` and exclusively owns the ports
//! it was built from.
//!
//! - [`leadscrew`] – [`LeadscrewController`]: manual drive, absolute
//!   positioning, vision centering and limit-switch homing of the hatch
//!   leadscrew.
//! - [`hatch_intake`] / [`ball_intake`] – pneumatic game-piece intakes.
//! - [`intake`] – [`IntakeSupervisor`]: coarse intake intents built from the
//!   two intakes and the leadscrew, sequenced by [`sequence::StepSequence`].
//! - [`drivetrain`] – [`Drivetrain`]: swerve pass-through and gyro heading
//!   hold.
//! - [`config`] – serde-backed tunables for all of the above.

pub mod ball_intake;
pub mod config;
pub mod drivetrain;
pub mod hatch_intake;
pub mod intake;
pub mod leadscrew;
pub mod sequence;

pub use ball_intake::BallIntake;
pub use config::{BallTimings, DriveConfig, HatchTimings, HomingLimits, LeadscrewConfig};
pub use drivetrain::Drivetrain;
pub use hatch_intake::HatchIntake;
pub use intake::IntakeSupervisor;
pub use leadscrew::{LeadscrewController, LeadscrewInput};
pub use sequence::StepSequence;
