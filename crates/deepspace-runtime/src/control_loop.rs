//! [`ControlLoop`] – the fixed-period scheduler of a robot session.
//!
//! The loop moves through three phases:
//!
//! - **Homing** – one leadscrew homing step per tick.  Operator input is not
//!   read and no other mechanism is commanded.  Skipped when the robot has
//!   no leadscrew.
//! - **Running** – sample operator input, tick the [`RobotStateMachine`].
//! - **Stopped** – every actuator has been driven to neutral.  Entered on the
//!   external stop edge, on a fatal error, or when homing fails.  Terminal.
//!
//! After every tick, whatever the phase, the loop reports to a
//! [`TelemetrySink`].  Telemetry never feeds back into control.
//!
//! The loop does no sleeping of its own; the caller paces [`ControlLoop::tick`]
//! at [`ControlLoop::period`].

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use deepspace_hal::Clock;
use deepspace_kernel::{CycleWatchdog, Mechanism};
use deepspace_mechanisms::{HomingLimits, IntakeSupervisor, LeadscrewController};
use deepspace_types::{MechError, Telemetered, TelemetrySink};
use tracing::{error, info, warn};

use crate::config::RobotConfig;
use crate::operator::OperatorInput;
use crate::robot::Robot;
use crate::state_machine::RobotStateMachine;

// ─────────────────────────────────────────────────────────────────────────────
// Phase
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Homing,
    Running,
    Stopped,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Homing => "HOMING",
            Phase::Running => "RUNNING",
            Phase::Stopped => "STOPPED",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ControlLoop
// ─────────────────────────────────────────────────────────────────────────────

pub struct ControlLoop {
    operator: OperatorInput,
    robot: RobotStateMachine,
    clock: Arc<dyn Clock>,
    watchdog: CycleWatchdog,
    homing: HomingLimits,
    homing_cycles: u32,
    phase: Phase,
    stop: Arc<AtomicBool>,
    fault: Option<MechError>,
    cycles: u64,
}

impl ControlLoop {
    /// A loop in the homing phase.
    pub fn new(robot: Robot, config: &RobotConfig) -> Self {
        let Robot {
            operator,
            state_machine,
            clock,
        } = robot;
        Self {
            operator,
            robot: state_machine,
            clock,
            watchdog: CycleWatchdog::new(config.control_period()),
            homing: config.homing,
            homing_cycles: 0,
            phase: Phase::Homing,
            stop: Arc::new(AtomicBool::new(false)),
            fault: None,
            cycles: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn period(&self) -> Duration {
        self.watchdog.period()
    }

    pub fn robot(&self) -> &RobotStateMachine {
        &self.robot
    }

    pub fn robot_mut(&mut self) -> &mut RobotStateMachine {
        &mut self.robot
    }

    pub fn watchdog(&self) -> &CycleWatchdog {
        &self.watchdog
    }

    /// Ticks run so far, in any phase.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Homing steps taken by the homing phase.
    pub fn homing_cycles(&self) -> u32 {
        self.homing_cycles
    }

    /// The error that stopped the loop, if one did.
    pub fn fault(&self) -> Option<&MechError> {
        self.fault.as_ref()
    }

    /// Flag observed at the start of every tick.  Raising it (from a signal
    /// handler, the field-disable edge, …) stops every mechanism on the next
    /// tick.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Home the leadscrew with the blocking routine instead of the homing
    /// phase.  Only valid before the first tick.
    ///
    /// # Errors
    ///
    /// Anything [`LeadscrewController::leadscrew_initial_zero`] returns.  The
    /// loop is stopped on error.
    pub fn home_blocking(&mut self, abort: &AtomicBool) -> Result<u32, MechError> {
        if self.phase != Phase::Homing {
            return Ok(0);
        }
        let limits = self.homing;
        let steps = match leadscrew_of(&mut self.robot) {
            Some(leadscrew) => leadscrew.leadscrew_initial_zero(&limits, abort),
            None => Ok(0),
        };
        match steps {
            Ok(steps) => {
                self.homing_cycles = steps;
                self.phase = Phase::Running;
                Ok(steps)
            }
            Err(e) => {
                self.halt(Some(e.clone()));
                Err(e)
            }
        }
    }

    /// Run one cycle and report it to `sink`.  Returns the phase the loop is
    /// in after the cycle.
    ///
    /// # Errors
    ///
    /// The error raised this cycle.  Fatal errors, and any error while
    /// homing, have already stopped the loop when this returns; a non-fatal
    /// error while running leaves it running.
    pub fn tick(&mut self, sink: &mut dyn TelemetrySink) -> Result<Phase, MechError> {
        self.watchdog.begin(self.clock.now());
        let result = self.step();
        if let Err(e) = &result {
            if e.is_fatal() || self.phase == Phase::Homing {
                self.halt(Some(e.clone()));
            } else {
                warn!(error = %e, "control cycle failed");
            }
        }
        self.watchdog.finish(self.clock.now());
        self.cycles += 1;
        self.report(sink);
        result.map(|()| self.phase)
    }

    fn step(&mut self) -> Result<(), MechError> {
        if self.phase != Phase::Stopped && self.stop.load(Ordering::SeqCst) {
            info!(phase = %self.phase, "stop requested");
            self.halt(None);
            return Ok(());
        }
        match self.phase {
            Phase::Homing => self.homing_step(),
            Phase::Running => {
                let input = self.operator.sample();
                self.robot.tick(&input).map(|_| ())
            }
            Phase::Stopped => Ok(()),
        }
    }

    fn homing_step(&mut self) -> Result<(), MechError> {
        let Some(leadscrew) = leadscrew_of(&mut self.robot) else {
            info!("no leadscrew to home");
            self.phase = Phase::Running;
            return Ok(());
        };
        self.homing_cycles += 1;
        if leadscrew.homing_step()? {
            info!(cycles = self.homing_cycles, "homing complete");
            self.phase = Phase::Running;
        } else if self.homing_cycles >= self.homing.max_cycles {
            return Err(MechError::HomingTimedOut {
                cycles: self.homing_cycles,
            });
        }
        Ok(())
    }

    fn halt(&mut self, fault: Option<MechError>) {
        if let Err(e) = self.robot.stop() {
            error!(error = %e, "failed to stop every mechanism");
        }
        if let Some(fault) = fault {
            error!(error = %fault, phase = %self.phase, "control loop stopped on fault");
            self.fault = Some(fault);
        }
        self.phase = Phase::Stopped;
    }
}

fn leadscrew_of(robot: &mut RobotStateMachine) -> Option<&mut LeadscrewController> {
    robot.intake_mut().and_then(IntakeSupervisor::leadscrew_mut)
}

impl Telemetered for ControlLoop {
    fn report(&self, sink: &mut dyn TelemetrySink) {
        sink.record("robot/phase", self.phase.name().into());
        sink.record("robot/cycle", (self.cycles as f64).into());
        self.robot.report(sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepspace_hal::SimRig;
    use deepspace_hal::sim::MotorCommand;
    use deepspace_types::{MemorySink, RobotState};

    fn config() -> RobotConfig {
        let mut config = RobotConfig::default();
        config.leadscrew.ticks_per_inch = 100.0;
        config.leadscrew.gains.tolerance = 5.0;
        config
    }

    fn build(rig: SimRig, config: &RobotConfig) -> (ControlLoop, deepspace_hal::SimHandles) {
        let (hw, handles) = rig.build();
        let robot = Robot::assemble(hw, config).unwrap();
        (ControlLoop::new(robot, config), handles)
    }

    fn run_until_running(ctl: &mut ControlLoop, sink: &mut MemorySink) {
        for _ in 0..1000 {
            if ctl.tick(sink).unwrap() == Phase::Running {
                return;
            }
        }
        panic!("homing never finished");
    }

    #[test]
    fn without_leadscrew_homing_is_skipped() {
        let cfg = config();
        let (mut ctl, _) = build(SimRig::new().with_hatch(), &cfg);
        let mut sink = MemorySink::new();
        assert_eq!(ctl.tick(&mut sink).unwrap(), Phase::Running);
        assert_eq!(ctl.homing_cycles(), 0);
        assert_eq!(sink.text("robot/phase"), Some("RUNNING"));
    }

    #[test]
    fn homing_phase_zeroes_then_runs() {
        let cfg = config();
        let (mut ctl, handles) = build(
            SimRig::new().with_leadscrew(cfg.leadscrew.travel_ticks(), 50.0),
            &cfg,
        );
        let motor = handles.leadscrew.unwrap();
        let mut sink = MemorySink::new();

        assert_eq!(ctl.tick(&mut sink).unwrap(), Phase::Homing);
        assert!(motor.output() < 0.0);
        run_until_running(&mut ctl, &mut sink);

        assert_eq!(motor.physical_ticks(), 0.0);
        assert_eq!(motor.sensor_ticks(), 0.0);
        assert_eq!(motor.last_command(), Some(MotorCommand::Percent(0.0)));
        assert!(ctl.homing_cycles() > 1);
    }

    #[test]
    fn homing_timeout_stops_the_loop() {
        let mut cfg = config();
        cfg.homing.max_cycles = 3;
        let (mut ctl, handles) = build(
            SimRig::new().with_leadscrew(cfg.leadscrew.travel_ticks(), 50.0),
            &cfg,
        );
        let mut sink = MemorySink::new();
        assert_eq!(ctl.tick(&mut sink).unwrap(), Phase::Homing);
        assert_eq!(ctl.tick(&mut sink).unwrap(), Phase::Homing);
        let err = ctl.tick(&mut sink).unwrap_err();
        assert_eq!(err, MechError::HomingTimedOut { cycles: 3 });
        assert_eq!(ctl.phase(), Phase::Stopped);
        assert_eq!(ctl.fault(), Some(&err));
        assert_eq!(
            handles.leadscrew.unwrap().last_command(),
            Some(MotorCommand::Percent(0.0))
        );
        // Stopped is terminal.
        assert_eq!(ctl.tick(&mut sink).unwrap(), Phase::Stopped);
    }

    #[test]
    fn blocking_homing_replaces_the_phase() {
        let mut cfg = config();
        cfg.homing.step_period_ms = 0;
        let (mut ctl, handles) = build(
            SimRig::new().with_leadscrew(cfg.leadscrew.travel_ticks(), 50.0),
            &cfg,
        );
        let steps = ctl.home_blocking(&AtomicBool::new(false)).unwrap();
        assert!(steps > 0);
        assert_eq!(ctl.phase(), Phase::Running);
        assert_eq!(handles.leadscrew.unwrap().sensor_ticks(), 0.0);
    }

    #[test]
    fn blocking_homing_abort_stops_the_loop() {
        let cfg = config();
        let (mut ctl, _) = build(
            SimRig::new().with_leadscrew(cfg.leadscrew.travel_ticks(), 50.0),
            &cfg,
        );
        let err = ctl.home_blocking(&AtomicBool::new(true)).unwrap_err();
        assert_eq!(err, MechError::HomingAborted);
        assert_eq!(ctl.phase(), Phase::Stopped);
    }

    #[test]
    fn stop_edge_neutralises_everything() {
        let cfg = config();
        let (mut ctl, handles) = build(SimRig::full(cfg.leadscrew.travel_ticks(), 50.0), &cfg);
        let mut sink = MemorySink::new();
        run_until_running(&mut ctl, &mut sink);
        let pad = &handles.gamepad;
        pad.set_axis(1, -1.0);
        ctl.tick(&mut sink).unwrap();
        let drive = handles.drive.as_ref().unwrap();
        assert!(drive.last_command().unwrap().y > 0.0);

        ctl.stop_handle().store(true, Ordering::SeqCst);
        assert_eq!(ctl.tick(&mut sink).unwrap(), Phase::Stopped);
        assert_eq!(drive.last_command().unwrap().magnitude(), 0.0);
        assert_eq!(
            handles.leadscrew.unwrap().last_command(),
            Some(MotorCommand::Percent(0.0))
        );
        assert!(!handles.hatch_linear.unwrap().is_extended());
        assert!(ctl.fault().is_none());
        assert_eq!(sink.text("robot/phase"), Some("STOPPED"));
    }

    #[test]
    fn hardware_fault_is_fatal() {
        let cfg = config();
        let (mut ctl, handles) = build(
            SimRig::new().with_hatch().with_drive(),
            &cfg,
        );
        let mut sink = MemorySink::new();
        assert_eq!(ctl.tick(&mut sink).unwrap(), Phase::Running);

        handles.drive.as_ref().unwrap().inject_fault("module 2 brownout");
        let err = ctl.tick(&mut sink).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(ctl.phase(), Phase::Stopped);
        assert!(matches!(ctl.fault(), Some(MechError::HardwareFault { .. })));
        assert_eq!(ctl.robot().state(), RobotState::InitialHoldingHatch);
    }

    #[test]
    fn reports_after_every_tick() {
        let cfg = config();
        let (mut ctl, _) = build(SimRig::new().with_hatch(), &cfg);
        let mut sink = MemorySink::new();
        ctl.tick(&mut sink).unwrap();
        ctl.tick(&mut sink).unwrap();
        assert_eq!(sink.number("robot/cycle"), Some(2.0));
        assert_eq!(sink.text("robot/state"), Some("INITIAL_HOLDING_HATCH"));
        assert_eq!(sink.text("hatch/state"), Some("HOLD"));
        assert_eq!(ctl.watchdog().cycles(), 2);
    }
}
