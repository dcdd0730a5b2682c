//! [`Robot`] – assembly of a robot session from hardware and configuration.
//!
//! Feature flags gate each optional mechanism on its own; there is no
//! exclusivity rule between them.  A mechanism that is enabled but has no
//! hardware is skipped with a warning, and hardware for a disabled mechanism
//! is dropped unused.

use std::sync::Arc;

use deepspace_hal::{Clock, RobotHardware};
use deepspace_kernel::StatusQuery;
use deepspace_mechanisms::{BallIntake, Drivetrain, HatchIntake, IntakeSupervisor, LeadscrewController};
use deepspace_types::MechError;
use tracing::{info, warn};

use crate::config::RobotConfig;
use crate::operator::OperatorInput;
use crate::state_machine::RobotStateMachine;

/// Everything a control loop needs: operator devices, the state machine
/// owning every mechanism, and the session clock.
pub struct Robot {
    pub operator: OperatorInput,
    pub state_machine: RobotStateMachine,
    pub clock: Arc<dyn Clock>,
}

impl Robot {
    /// # Errors
    ///
    /// [`MechError::Config`] for an invalid configuration, or a hardware
    /// fault raised while configuring the leadscrew controller.
    pub fn assemble(hardware: RobotHardware, config: &RobotConfig) -> Result<Self, MechError> {
        config.validate()?;
        let RobotHardware {
            gamepad,
            joystick,
            leadscrew,
            hatch,
            ball,
            drive,
            clock,
        } = hardware;
        let features = &config.features;

        let joystick = gated("secondary_joystick", features.secondary_joystick, joystick);

        let leadscrew = gated("leadscrew", features.leadscrew, leadscrew)
            .map(|mut ports| {
                if !features.camera && ports.camera.take().is_some() {
                    info!(mechanism = "camera", "disabled by configuration");
                }
                LeadscrewController::new(ports, config.leadscrew.clone())
            })
            .transpose()?;
        let hatch = gated("hatch", features.hatch, hatch).map(HatchIntake::new);
        let ball = gated("ball", features.ball, ball).map(BallIntake::new);

        let intake = if hatch.is_some() || ball.is_some() || leadscrew.is_some() {
            Some(IntakeSupervisor::new(
                hatch,
                ball,
                leadscrew,
                &config.hatch,
                &config.ball,
                Arc::clone(&clock),
            ))
        } else {
            None
        };

        let intake_extended = match &intake {
            Some(intake) => intake.extended_query(),
            None => StatusQuery::constant("hatch/extended", false),
        };
        let drivetrain = gated("drive", features.drive, drive).map(|ports| {
            Drivetrain::new(
                ports,
                config.drive.clone(),
                config.control_period(),
                intake_extended,
            )
        });

        info!(
            initial_state = %config.initial_state,
            intake = intake.is_some(),
            drive = drivetrain.is_some(),
            joystick = joystick.is_some(),
            "robot assembled"
        );

        Ok(Self {
            operator: OperatorInput::new(gamepad, joystick, config.bindings.clone()),
            state_machine: RobotStateMachine::new(config.initial_state, intake, drivetrain),
            clock,
        })
    }
}

fn gated<T>(mechanism: &'static str, enabled: bool, ports: Option<T>) -> Option<T> {
    match (enabled, ports) {
        (true, Some(ports)) => Some(ports),
        (true, None) => {
            warn!(mechanism, "enabled but no hardware present; running without it");
            None
        }
        (false, Some(_)) => {
            info!(mechanism, "disabled by configuration");
            None
        }
        (false, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepspace_hal::SimRig;
    use deepspace_types::RobotState;

    fn travel_ticks(config: &RobotConfig) -> f64 {
        config.leadscrew.travel_ticks()
    }

    #[test]
    fn full_rig_builds_every_mechanism() {
        let config = RobotConfig::default();
        let (hw, _) = SimRig::full(travel_ticks(&config), 400.0).build();
        let robot = Robot::assemble(hw, &config).unwrap();
        let intake = robot.state_machine.intake().unwrap();
        assert!(intake.hatch().is_some());
        assert!(intake.ball().is_some());
        assert!(intake.leadscrew().unwrap().has_camera());
        assert!(robot.state_machine.drivetrain().is_some());
        assert!(robot.operator.has_joystick());
        assert_eq!(robot.state_machine.state(), RobotState::InitialHoldingHatch);
    }

    #[test]
    fn each_flag_gates_only_its_own_mechanism() {
        let mut config = RobotConfig::default();
        config.features.ball = false;
        config.features.camera = false;
        let (hw, _) = SimRig::full(travel_ticks(&config), 400.0).build();
        let robot = Robot::assemble(hw, &config).unwrap();
        let intake = robot.state_machine.intake().unwrap();
        assert!(intake.ball().is_none());
        assert!(intake.hatch().is_some());
        let leadscrew = intake.leadscrew().unwrap();
        assert!(!leadscrew.has_camera());
        assert!(robot.state_machine.drivetrain().is_some());
    }

    #[test]
    fn missing_hardware_is_not_an_error() {
        let config = RobotConfig::default();
        let (hw, _) = SimRig::new().with_drive().build();
        let robot = Robot::assemble(hw, &config).unwrap();
        assert!(robot.state_machine.intake().is_none());
        assert!(robot.state_machine.drivetrain().is_some());
        assert!(!robot.operator.has_joystick());
    }

    #[test]
    fn invalid_config_is_rejected_before_touching_hardware() {
        let mut config = RobotConfig::default();
        config.control_period_ms = 0;
        let (hw, handles) = SimRig::full(travel_ticks(&config), 400.0).build();
        assert!(matches!(
            Robot::assemble(hw, &config),
            Err(MechError::Config(_))
        ));
        assert!(handles.leadscrew.unwrap().gains().is_none());
    }
}
