//! Full-match walkthroughs on a simulated robot with a manual clock.

use std::time::Duration;

use deepspace_hal::input::axis;
use deepspace_hal::{SimHandles, SimRig};
use deepspace_hal::sim::{ManualClock, SimInputHandle};
use deepspace_runtime::{ControlLoop, Phase, Robot, RobotConfig};
use deepspace_types::{MemorySink, RobotState};

// Raw joystick buttons in profile 0.
const SCORE: usize = 3;
const LOAD: usize = 4;

struct Match {
    ctl: ControlLoop,
    handles: SimHandles,
    clock: ManualClock,
    sink: MemorySink,
}

impl Match {
    fn start() -> Self {
        let mut config = RobotConfig::default();
        config.leadscrew.ticks_per_inch = 100.0;
        config.leadscrew.gains.tolerance = 5.0;
        let (hw, handles) = SimRig::full(config.leadscrew.travel_ticks(), 50.0)
            .with_manual_clock()
            .build();
        let clock = handles.clock.clone().unwrap();
        let robot = Robot::assemble(hw, &config).unwrap();
        let mut game = Self {
            ctl: ControlLoop::new(robot, &config),
            handles,
            clock,
            sink: MemorySink::new(),
        };
        for _ in 0..1000 {
            if game.tick() == Phase::Running {
                return game;
            }
        }
        panic!("homing never finished");
    }

    fn tick(&mut self) -> Phase {
        self.ctl.tick(&mut self.sink).unwrap()
    }

    fn state(&self) -> RobotState {
        self.ctl.robot().state()
    }

    fn stick(&self) -> &SimInputHandle {
        self.handles.joystick.as_ref().unwrap()
    }

    fn wait(&mut self, ms: u64) {
        self.clock.advance(Duration::from_millis(ms));
        self.tick();
    }

    fn hatch(&self) -> &str {
        self.sink.text("hatch/state").unwrap()
    }
}

#[test]
fn hatch_cycle_score_then_reload() {
    let mut game = Match::start();
    game.tick();
    assert_eq!(game.state(), RobotState::InitialHoldingHatch);
    assert_eq!(game.hatch(), "HOLD");
    assert!(game.ctl.robot().status().holding_hatch);

    // Score on the hatch side.  The trigger is seen this cycle and acted on
    // the next.
    game.stick().set_axis(axis::Z, -1.0);
    game.stick().press(SCORE);
    game.tick();
    assert_eq!(game.state(), RobotState::InitialHoldingHatch);
    game.stick().release(SCORE);
    game.tick();
    assert_eq!(game.state(), RobotState::HatchScore);
    assert_eq!(game.hatch(), "EXTEND");
    assert!(game.handles.hatch_linear.as_ref().unwrap().is_extended());

    game.wait(500);
    assert_eq!(game.hatch(), "RELEASE");
    game.wait(300);
    assert_eq!(game.hatch(), "RETRACT");
    assert!(game.ctl.robot().status().score_complete);
    game.tick();
    assert_eq!(game.state(), RobotState::WaitingToLoad);
    assert_eq!(game.sink.text("intake/state"), Some("IDLE"));

    // Load a fresh panel from the station.
    game.stick().press(LOAD);
    game.tick();
    game.stick().release(LOAD);
    game.tick();
    assert_eq!(game.state(), RobotState::LoadingHatch);
    assert_eq!(game.sink.text("drive/state"), Some("HOLD_HEADING"));
    assert_eq!(game.hatch(), "RELEASE");

    game.wait(500);
    assert_eq!(game.hatch(), "EXTEND");
    game.wait(300);
    assert_eq!(game.hatch(), "HOLD");
    game.tick();
    assert_eq!(game.state(), RobotState::HatchPrescore);
    assert_eq!(game.sink.text("drive/state"), Some("SWERVE"));
    assert!(game.ctl.robot().status().holding_hatch);
}

#[test]
fn ball_front_score_by_name() {
    let mut game = Match::start();
    game.tick();
    game.ctl
        .robot_mut()
        .request_by_name("BALL_FRONT_SCORE")
        .unwrap();
    game.tick();
    assert_eq!(game.state(), RobotState::BallFrontScore);
    assert_eq!(game.sink.text("ball/state"), Some("LOCKED"));
    assert_eq!(game.hatch(), "RETRACT");

    game.wait(300);
    assert_eq!(game.sink.text("ball/state"), Some("RAISED"));
    game.wait(500);
    assert_eq!(game.sink.text("ball/state"), Some("STOWED"));
    game.tick();
    assert_eq!(game.state(), RobotState::WaitingToLoad);
}

#[test]
fn operator_can_cut_a_sequence_short() {
    let mut game = Match::start();
    game.tick();
    game.ctl.robot_mut().request_by_name("BALL_BACK_SCORE").unwrap();
    game.tick();
    assert_eq!(game.state(), RobotState::BallBackScore);
    assert_eq!(game.sink.text("ball/state"), Some("RELEASED"));

    // Confirmation button, profile 0.
    game.stick().press(6);
    game.tick();
    game.stick().release(6);
    game.tick();
    assert_eq!(game.state(), RobotState::WaitingToLoad);
    assert_eq!(game.sink.text("ball/state"), Some("STOWED"));
}

#[test]
fn unknown_request_leaves_the_match_running() {
    let mut game = Match::start();
    game.tick();
    let err = game.ctl.robot_mut().request_by_name("HOVER").unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(game.tick(), Phase::Running);
    assert_eq!(game.state(), RobotState::InitialHoldingHatch);
}
