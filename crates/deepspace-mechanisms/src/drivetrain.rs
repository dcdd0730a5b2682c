//! [`Drivetrain`] – swerve drive with heading hold.
//!
//! Wheel kinematics live behind [`DriveBase`]; this mechanism only decides
//! which translation and rotation to ask for.  While the intake reports
//! itself extended, translation is scaled down for precise placement.

use std::time::Duration;

use deepspace_hal::{DriveBase, DrivePorts, Gyro, PidController};
use deepspace_kernel::{Mechanism, MechanismState, StatusQuery};
use deepspace_types::{DriveCommand, DrivetrainState, MechError, Telemetered, TelemetrySink};

use crate::config::DriveConfig;

pub struct Drivetrain {
    base: Box<dyn DriveBase>,
    gyro: Box<dyn Gyro>,
    config: DriveConfig,
    heading_pid: PidController,
    period: Duration,
    state: DrivetrainState,
    operator: DriveCommand,
    last_command: DriveCommand,
    intake_extended: StatusQuery,
}

impl Drivetrain {
    /// `period` is the control loop period, used as the heading loop's time
    /// step.  `intake_extended` selects precision driving.
    pub fn new(
        ports: DrivePorts,
        config: DriveConfig,
        period: Duration,
        intake_extended: StatusQuery,
    ) -> Self {
        let mut heading_pid = PidController::from_gains(config.heading_gains);
        heading_pid.enable_continuous_input(-180.0, 180.0);
        heading_pid.set_output_limits(-config.max_rotation, config.max_rotation);
        heading_pid.set_set_point(config.hold_heading_deg);
        Self {
            base: ports.base,
            gyro: ports.gyro,
            config,
            heading_pid,
            period,
            state: DrivetrainState::Swerve,
            operator: DriveCommand::stopped(),
            last_command: DriveCommand::stopped(),
            intake_extended,
        }
    }

    /// Operator translation and rotation for the coming cycle.
    pub fn set_operator_command(&mut self, command: DriveCommand) {
        self.operator = command;
    }

    /// Command actually sent to the base last cycle.
    pub fn last_command(&self) -> DriveCommand {
        self.last_command
    }

    pub fn heading(&self) -> f64 {
        self.gyro.heading_degrees()
    }

    fn scaled(&self, command: DriveCommand) -> DriveCommand {
        if self.intake_extended.get() {
            command.scale_translation(self.config.precision_scale)
        } else {
            command
        }
    }

    fn send(&mut self, command: DriveCommand) -> Result<(), MechError> {
        self.base.drive(command)?;
        self.last_command = command;
        Ok(())
    }
}

impl Mechanism for Drivetrain {
    type State = DrivetrainState;

    fn name(&self) -> &'static str {
        "drivetrain"
    }

    fn current_state(&self) -> DrivetrainState {
        self.state
    }

    fn transition_to(
        &mut self,
        state: MechanismState<Self, DrivetrainState>,
    ) -> Result<(), MechError> {
        let value = state.into_value();
        if value != self.state {
            tracing::debug!(from = %self.state, to = %value, "drive mode");
            if value == DrivetrainState::HoldHeading {
                self.heading_pid.reset();
            }
        }
        self.state = value;

        match value {
            DrivetrainState::Swerve => {
                let command = self.scaled(self.operator);
                self.send(command)
            }
            DrivetrainState::HoldHeading => {
                let rotation = self
                    .heading_pid
                    .update(self.gyro.heading_degrees(), self.period.as_secs_f64());
                let command = self.scaled(DriveCommand {
                    rotation,
                    ..self.operator
                });
                self.send(command)
            }
            DrivetrainState::Stopped => self.send(DriveCommand::stopped()),
        }
    }

    fn stop(&mut self) -> Result<(), MechError> {
        self.base.stop()?;
        self.last_command = DriveCommand::stopped();
        Ok(())
    }
}

impl Telemetered for Drivetrain {
    fn report(&self, sink: &mut dyn TelemetrySink) {
        sink.record("drive/state", self.state.name().into());
        sink.record("drive/heading", self.heading().into());
        sink.record("drive/vx", self.last_command.x.into());
        sink.record("drive/vy", self.last_command.y.into());
        sink.record("drive/omega", self.last_command.rotation.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepspace_hal::SimRig;
    use deepspace_hal::sim::{SimDriveHandle, SimGyroHandle};
    use deepspace_kernel::{StatusPublisher, status_channel};
    use deepspace_types::MemorySink;

    fn rig() -> (Drivetrain, SimDriveHandle, SimGyroHandle, StatusPublisher) {
        let (hw, h) = SimRig::new().with_drive().build();
        let (extended, query) = status_channel("hatch/extended");
        let drive = Drivetrain::new(
            hw.drive.unwrap(),
            DriveConfig::default(),
            Duration::from_millis(5),
            query,
        );
        (drive, h.drive.unwrap(), h.gyro.unwrap(), extended)
    }

    #[test]
    fn swerve_passes_operator_command() {
        let (mut drive, base, _, _) = rig();
        let cmd = DriveCommand::new(0.5, -0.25, 0.1);
        drive.set_operator_command(cmd);
        drive
            .transition_to(MechanismState::of(DrivetrainState::Swerve))
            .unwrap();
        assert_eq!(base.last_command(), Some(cmd));
    }

    #[test]
    fn extended_intake_scales_translation() {
        let (mut drive, base, _, extended) = rig();
        extended.publish(true);
        drive.set_operator_command(DriveCommand::new(1.0, 0.5, 0.3));
        drive
            .transition_to(MechanismState::of(DrivetrainState::Swerve))
            .unwrap();
        let sent = base.last_command().unwrap();
        assert!((sent.x - 0.4).abs() < 1e-12);
        assert!((sent.y - 0.2).abs() < 1e-12);
        assert_eq!(sent.rotation, 0.3);
    }

    #[test]
    fn hold_heading_turns_back_toward_target() {
        let (mut drive, base, gyro, _) = rig();
        drive.set_operator_command(DriveCommand::new(0.3, 0.0, 0.9));

        gyro.set_heading(-30.0);
        drive
            .transition_to(MechanismState::of(DrivetrainState::HoldHeading))
            .unwrap();
        let sent = base.last_command().unwrap();
        assert!(sent.rotation > 0.0);
        assert!(sent.rotation <= DriveConfig::default().max_rotation);
        assert_eq!(sent.x, 0.3);

        gyro.set_heading(30.0);
        drive
            .transition_to(MechanismState::of(DrivetrainState::HoldHeading))
            .unwrap();
        assert!(base.last_command().unwrap().rotation < 0.0);
    }

    #[test]
    fn hold_heading_takes_short_way_round() {
        let (hw, h) = SimRig::new().with_drive().build();
        let config = DriveConfig {
            hold_heading_deg: 170.0,
            ..DriveConfig::default()
        };
        let mut drive = Drivetrain::new(
            hw.drive.unwrap(),
            config,
            Duration::from_millis(5),
            StatusQuery::constant("hatch/extended", false),
        );
        let (base, gyro) = (h.drive.unwrap(), h.gyro.unwrap());

        // -170 is 20 degrees past 170 across the wrap, not 340 short of it.
        gyro.set_heading(-170.0);
        drive
            .transition_to(MechanismState::of(DrivetrainState::HoldHeading))
            .unwrap();
        assert!(base.last_command().unwrap().rotation < 0.0);
    }

    #[test]
    fn stopped_mode_and_stop_send_zero() {
        let (mut drive, base, _, _) = rig();
        drive.set_operator_command(DriveCommand::new(1.0, 1.0, 1.0));
        drive
            .transition_to(MechanismState::of(DrivetrainState::Stopped))
            .unwrap();
        assert_eq!(base.last_command(), Some(DriveCommand::stopped()));

        drive
            .transition_to(MechanismState::of(DrivetrainState::Swerve))
            .unwrap();
        drive.stop().unwrap();
        assert_eq!(base.last_command(), Some(DriveCommand::stopped()));
        assert_eq!(drive.last_command(), DriveCommand::stopped());
    }

    #[test]
    fn report_publishes_velocity_and_heading() {
        let (mut drive, _, gyro, _) = rig();
        gyro.set_heading(12.5);
        drive.set_operator_command(DriveCommand::new(0.2, 0.1, 0.0));
        drive
            .transition_to(MechanismState::of(DrivetrainState::Swerve))
            .unwrap();
        let mut sink = MemorySink::new();
        drive.report(&mut sink);
        assert_eq!(sink.text("drive/state"), Some("SWERVE"));
        assert_eq!(sink.number("drive/heading"), Some(12.5));
        assert_eq!(sink.number("drive/vx"), Some(0.2));
    }
}
