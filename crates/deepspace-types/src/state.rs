//! Closed state enumerations for the robot and its mechanisms.
//!
//! Each enum carries a stable numeric code (used by compact telemetry
//! encodings) and a SCREAMING_SNAKE_CASE name (used on the dashboard and in
//! configuration files).  Decoding either form yields
//! [`MechError::UnknownState`] for anything outside the enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::MechError;

macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident for $mechanism:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Name of the mechanism this state belongs to.
            pub const MECHANISM: &'static str = $mechanism;

            /// Dashboard name of this state.
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Stable numeric code of this state.
            pub fn code(self) -> u8 {
                match self {
                    $($name::$variant => $code),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl TryFrom<u8> for $name {
            type Error = MechError;

            fn try_from(raw: u8) -> Result<Self, MechError> {
                match raw {
                    $($code => Ok($name::$variant),)+
                    other => Err(MechError::UnknownState {
                        mechanism: $mechanism.to_string(),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl FromStr for $name {
            type Err = MechError;

            fn from_str(s: &str) -> Result<Self, MechError> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err(MechError::UnknownState {
                        mechanism: $mechanism.to_string(),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

state_enum! {
    /// Game-level state of the whole robot.  Exactly one is active at a time.
    #[derive(Default)]
    pub enum RobotState for "robot" {
        InitialHoldingHatch = 0 => "INITIAL_HOLDING_HATCH",
        HatchScore = 1 => "HATCH_SCORE",
        WaitingToLoad = 2 => "WAITING_TO_LOAD",
        LoadingHatch = 3 => "LOADING_HATCH",
        HatchPrescore = 4 => "HATCH_PRESCORE",
        BallPrescore = 5 => "BALL_PRESCORE",
        BallFrontScore = 6 => "BALL_FRONT_SCORE",
        BallBackScore = 7 => "BALL_BACK_SCORE",
        Defense = 8 => "DEFENSE",
        Climb = 9 => "CLIMB",
        #[default]
        Default = 10 => "DEFAULT",
    }
}

state_enum! {
    /// Operating mode of the leadscrew.
    #[derive(Default)]
    pub enum LeadscrewState for "leadscrew" {
        Manual = 0 => "MANUAL",
        CameraAlign = 1 => "CAMERA_ALIGN",
        #[default]
        Idle = 2 => "IDLE",
    }
}

state_enum! {
    /// Posture of the hatch-panel intake pistons.
    #[derive(Default)]
    pub enum HatchIntakeState for "hatch_intake" {
        /// Linear piston in, gripper expanded.
        Hold = 0 => "HOLD",
        /// Linear piston out, gripper expanded.
        Extend = 1 => "EXTEND",
        /// Linear piston out, gripper contracted.
        Release = 2 => "RELEASE",
        /// Linear piston in, gripper contracted.
        #[default]
        Retract = 3 => "RETRACT",
    }
}

state_enum! {
    /// Posture of the ball intake pistons.
    #[derive(Default)]
    pub enum BallIntakeState for "ball_intake" {
        #[default]
        Stowed = 0 => "STOWED",
        Locked = 1 => "LOCKED",
        Raised = 2 => "RAISED",
        Released = 3 => "RELEASED",
    }
}

state_enum! {
    /// Coarse intent of the combined intake supervisor.
    #[derive(Default)]
    pub enum IntakeState for "intake" {
        #[default]
        Idle = 0 => "IDLE",
        HoldingHatch = 1 => "HOLDING_HATCH",
        IntakePanel = 2 => "INTAKE_PANEL",
        ScorePanel = 3 => "SCORE_PANEL",
        ScoreBallHigh = 4 => "SCORE_BALL_HIGH",
        ScoreBallLow = 5 => "SCORE_BALL_LOW",
    }
}

state_enum! {
    /// Drive mode of the swerve drivetrain.
    #[derive(Default)]
    pub enum DrivetrainState for "drivetrain" {
        #[default]
        Swerve = 0 => "SWERVE",
        HoldHeading = 1 => "HOLD_HEADING",
        Stopped = 2 => "STOPPED",
    }
}
