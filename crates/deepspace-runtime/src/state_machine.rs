//! [`RobotStateMachine`] – game-level orchestration.
//!
//! Each cycle the state machine
//!
//! 1. applies the transition decided on the previous cycle, if any,
//! 2. runs the behavior of the (now current) state, which issues at most one
//!    command to each subsystem, and
//! 3. evaluates [`next_state`] against the operator intent and the status the
//!    subsystems reported while running that behavior.
//!
//! A transition decided in step 3 is held as pending and only takes effect
//! at step 1 of the following cycle, so the behavior of the successor state
//! never runs in the cycle its trigger was seen.
//!
//! # Transition table
//!
//! | From | Condition | To |
//! |---|---|---|
//! | `INITIAL_HOLDING_HATCH`, `HATCH_PRESCORE` | holding ∧ score ∧ axis < 0 | `HATCH_SCORE` |
//! | `INITIAL_HOLDING_HATCH`, `HATCH_PRESCORE` | holding ∧ load | `WAITING_TO_LOAD` |
//! | `HATCH_SCORE` | score complete ∨ confirm scored | `WAITING_TO_LOAD` |
//! | `WAITING_TO_LOAD` | idle ∧ has loaded ∧ axis > 0 | `BALL_PRESCORE` |
//! | `WAITING_TO_LOAD` | idle ∧ load ∧ axis < 0 | `LOADING_HATCH` |
//! | `LOADING_HATCH` | intake complete ∨ (confirm loaded ∧ axis < 0) | `HATCH_PRESCORE` |
//! | `BALL_FRONT_SCORE` | high score complete ∨ confirm scored | `WAITING_TO_LOAD` |
//! | `BALL_BACK_SCORE` | low score complete ∨ confirm scored | `WAITING_TO_LOAD` |
//!
//! States without a row only change on an explicit [`RobotStateMachine::request`].

use deepspace_kernel::{Mechanism, MechanismState};
use deepspace_mechanisms::{Drivetrain, IntakeSupervisor};
use deepspace_types::{
    DriverIntent, DrivetrainState, MechError, RobotState, Telemetered, TelemetrySink,
};
use tracing::{debug, info};

use crate::operator::OperatorSnapshot;

/// Subsystem status consulted by the transition table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubsystemStatus {
    pub holding_hatch: bool,
    pub idle: bool,
    pub score_complete: bool,
    pub intake_complete: bool,
    pub ball_score_high_complete: bool,
    pub ball_score_low_complete: bool,
}

/// Pure transition function.  Returns `state` itself when nothing fires.
pub fn next_state(
    state: RobotState,
    intent: &DriverIntent,
    status: &SubsystemStatus,
) -> RobotState {
    let hatch_side = intent.secondary_axis < 0.0;
    let ball_side = intent.secondary_axis > 0.0;
    match state {
        RobotState::InitialHoldingHatch | RobotState::HatchPrescore => {
            if status.holding_hatch && intent.score && hatch_side {
                RobotState::HatchScore
            } else if status.holding_hatch && intent.load {
                RobotState::WaitingToLoad
            } else {
                state
            }
        }
        RobotState::HatchScore => {
            if status.score_complete || intent.confirm_scored {
                RobotState::WaitingToLoad
            } else {
                state
            }
        }
        RobotState::WaitingToLoad => {
            if status.idle && intent.has_loaded && ball_side {
                RobotState::BallPrescore
            } else if status.idle && intent.load && hatch_side {
                RobotState::LoadingHatch
            } else {
                state
            }
        }
        RobotState::LoadingHatch => {
            if status.intake_complete || (intent.confirm_loaded && hatch_side) {
                RobotState::HatchPrescore
            } else {
                state
            }
        }
        RobotState::BallFrontScore => {
            if status.ball_score_high_complete || intent.confirm_scored {
                RobotState::WaitingToLoad
            } else {
                state
            }
        }
        RobotState::BallBackScore => {
            if status.ball_score_low_complete || intent.confirm_scored {
                RobotState::WaitingToLoad
            } else {
                state
            }
        }
        RobotState::BallPrescore
        | RobotState::Defense
        | RobotState::Climb
        | RobotState::Default => state,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RobotStateMachine
// ────────────────────────────────────────────────────────────────────────────

/// Owns every mechanism of the robot for the session lifetime.
///
/// # Example
///
/// ```rust
/// use deepspace_runtime::state_machine::RobotStateMachine;
/// use deepspace_runtime::operator::OperatorSnapshot;
/// use deepspace_types::RobotState;
///
/// let mut robot = RobotStateMachine::new(RobotState::WaitingToLoad, None, None);
/// let mut input = OperatorSnapshot::default();
/// input.intent.load = true;
/// input.intent.secondary_axis = -1.0;
///
/// // The trigger is seen this cycle...
/// assert_eq!(robot.tick(&input).unwrap(), RobotState::WaitingToLoad);
/// assert_eq!(robot.pending(), Some(RobotState::LoadingHatch));
/// // ...and acted on the next.
/// assert_eq!(robot.tick(&input).unwrap(), RobotState::LoadingHatch);
/// ```
pub struct RobotStateMachine {
    state: RobotState,
    pending: Option<RobotState>,
    intake: Option<IntakeSupervisor>,
    drivetrain: Option<Drivetrain>,
    status: SubsystemStatus,
    cycles: u64,
}

impl RobotStateMachine {
    pub fn new(
        initial: RobotState,
        intake: Option<IntakeSupervisor>,
        drivetrain: Option<Drivetrain>,
    ) -> Self {
        Self {
            state: initial,
            pending: None,
            intake,
            drivetrain,
            status: SubsystemStatus::default(),
            cycles: 0,
        }
    }

    /// State whose behavior ran (or will run) this cycle.
    pub fn state(&self) -> RobotState {
        self.state
    }

    /// Transition decided last cycle, applied at the start of the next.
    pub fn pending(&self) -> Option<RobotState> {
        self.pending
    }

    /// Status observed during the last behavior run.
    pub fn status(&self) -> SubsystemStatus {
        self.status
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn intake(&self) -> Option<&IntakeSupervisor> {
        self.intake.as_ref()
    }

    pub fn intake_mut(&mut self) -> Option<&mut IntakeSupervisor> {
        self.intake.as_mut()
    }

    pub fn drivetrain(&self) -> Option<&Drivetrain> {
        self.drivetrain.as_ref()
    }

    /// Queue an explicit transition (dashboard, autonomous).  Like any other
    /// transition it takes effect at the start of the next cycle.
    pub fn request(&mut self, state: MechanismState<Self, RobotState>) {
        let value = state.into_value();
        debug!(requested = %value, "robot state requested");
        self.pending = Some(value);
    }

    /// Queue a transition named by an external source.
    ///
    /// # Errors
    ///
    /// [`MechError::UnknownState`] for a name outside [`RobotState`]; nothing
    /// is queued and no subsystem is commanded.
    pub fn request_by_name(&mut self, name: &str) -> Result<(), MechError> {
        let state = MechanismState::<Self, RobotState>::parse(name).inspect_err(|e| {
            tracing::error!(error = %e, "rejected robot state request");
        })?;
        self.request(state);
        Ok(())
    }

    /// Run one control cycle.  Returns the state whose behavior ran.
    ///
    /// # Errors
    ///
    /// Any subsystem error.  No transition is armed on a failed cycle.
    pub fn tick(&mut self, input: &OperatorSnapshot) -> Result<RobotState, MechError> {
        if let Some(next) = self.pending.take() {
            if next != self.state {
                info!(from = %self.state, to = %next, "robot state");
            }
            self.state = next;
        }

        if let Some(drivetrain) = self.drivetrain.as_mut() {
            drivetrain.set_operator_command(input.drive);
        }
        if let Some(intake) = self.intake.as_mut() {
            intake.set_leadscrew_input(input.leadscrew);
        }

        self.transition_to(MechanismState::of(self.state))?;
        self.status = self.observe();
        self.cycles += 1;

        let next = next_state(self.state, &input.intent, &self.status);
        if next != self.state {
            debug!(from = %self.state, to = %next, "transition armed");
            self.pending = Some(next);
        }
        Ok(self.state)
    }

    fn observe(&self) -> SubsystemStatus {
        match &self.intake {
            Some(intake) => SubsystemStatus {
                holding_hatch: intake.is_holding_hatch(),
                idle: intake.is_idle(),
                score_complete: intake.score_complete(),
                intake_complete: intake.intake_complete(),
                ball_score_high_complete: intake.ball_score_high_complete(),
                ball_score_low_complete: intake.ball_score_low_complete(),
            },
            // Nothing to be busy.
            None => SubsystemStatus {
                idle: true,
                ..SubsystemStatus::default()
            },
        }
    }

    fn drive(&mut self, mode: DrivetrainState) -> Result<(), MechError> {
        match self.drivetrain.as_mut() {
            Some(drivetrain) => drivetrain.transition_to(MechanismState::of(mode)),
            None => Ok(()),
        }
    }

    fn intake_intent(
        &mut self,
        intent: fn(&mut IntakeSupervisor) -> Result<(), MechError>,
    ) -> Result<(), MechError> {
        match self.intake.as_mut() {
            Some(intake) => intent(intake),
            None => Ok(()),
        }
    }
}

impl Mechanism for RobotStateMachine {
    type State = RobotState;

    fn name(&self) -> &'static str {
        "robot"
    }

    fn current_state(&self) -> RobotState {
        self.state
    }

    /// Run the behavior of `state` immediately.  [`RobotStateMachine::tick`]
    /// is the per-cycle entry point; this is the dispatch it uses.
    fn transition_to(&mut self, state: MechanismState<Self, RobotState>) -> Result<(), MechError> {
        let value = state.into_value();
        self.state = value;
        match value {
            RobotState::InitialHoldingHatch | RobotState::HatchPrescore => {
                self.intake_intent(IntakeSupervisor::holding_hatch)?;
                self.drive(DrivetrainState::Swerve)
            }
            RobotState::HatchScore => {
                self.intake_intent(IntakeSupervisor::score_panel)?;
                self.drive(DrivetrainState::Swerve)
            }
            RobotState::WaitingToLoad => {
                self.intake_intent(IntakeSupervisor::idle)?;
                self.drive(DrivetrainState::Swerve)
            }
            RobotState::LoadingHatch => {
                self.intake_intent(IntakeSupervisor::intake_panel)?;
                self.drive(DrivetrainState::HoldHeading)
            }
            RobotState::BallFrontScore => {
                self.intake_intent(IntakeSupervisor::score_ball_high)?;
                self.drive(DrivetrainState::Swerve)
            }
            RobotState::BallBackScore => {
                self.intake_intent(IntakeSupervisor::score_ball_low)?;
                self.drive(DrivetrainState::Swerve)
            }
            RobotState::BallPrescore
            | RobotState::Defense
            | RobotState::Climb
            | RobotState::Default => {
                self.intake_intent(IntakeSupervisor::idle)?;
                self.drive(DrivetrainState::Swerve)
            }
        }
    }

    /// Drive every actuator to neutral and drop any pending transition.
    /// Every subsystem is attempted before the first failure is returned.
    fn stop(&mut self) -> Result<(), MechError> {
        self.pending = None;
        let results = [
            self.intake.as_mut().map(Mechanism::stop),
            self.drivetrain.as_mut().map(Mechanism::stop),
        ];
        info!(state = %self.state, "all mechanisms stopped");
        results.into_iter().flatten().collect()
    }
}

impl Telemetered for RobotStateMachine {
    fn report(&self, sink: &mut dyn TelemetrySink) {
        sink.record("robot/state", self.state.name().into());
        if let Some(intake) = &self.intake {
            intake.report(sink);
        }
        if let Some(drivetrain) = &self.drivetrain {
            drivetrain.report(sink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepspace_types::MemorySink;
    use proptest::prelude::*;

    fn intent() -> DriverIntent {
        DriverIntent::default()
    }

    fn holding() -> SubsystemStatus {
        SubsystemStatus {
            holding_hatch: true,
            ..SubsystemStatus::default()
        }
    }

    fn idle() -> SubsystemStatus {
        SubsystemStatus {
            idle: true,
            ..SubsystemStatus::default()
        }
    }

    // ---- transition table

    #[test]
    fn holding_hatch_scores_on_hatch_side() {
        let i = DriverIntent {
            score: true,
            secondary_axis: -1.0,
            ..intent()
        };
        for from in [RobotState::InitialHoldingHatch, RobotState::HatchPrescore] {
            assert_eq!(next_state(from, &i, &holding()), RobotState::HatchScore);
            // Not holding: nothing to score.
            assert_eq!(next_state(from, &i, &SubsystemStatus::default()), from);
        }
        // Wrong side of the selector.
        let ball_side = DriverIntent {
            secondary_axis: 1.0,
            ..i
        };
        assert_eq!(
            next_state(RobotState::HatchPrescore, &ball_side, &holding()),
            RobotState::HatchPrescore
        );
    }

    #[test]
    fn holding_hatch_goes_back_to_load() {
        let i = DriverIntent {
            load: true,
            ..intent()
        };
        assert_eq!(
            next_state(RobotState::InitialHoldingHatch, &i, &holding()),
            RobotState::WaitingToLoad
        );
    }

    #[test]
    fn score_wins_over_load_when_both_fire() {
        let i = DriverIntent {
            score: true,
            load: true,
            secondary_axis: -0.5,
            ..intent()
        };
        assert_eq!(
            next_state(RobotState::InitialHoldingHatch, &i, &holding()),
            RobotState::HatchScore
        );
    }

    #[test]
    fn hatch_score_exits_on_completion_or_confirmation() {
        let done = SubsystemStatus {
            score_complete: true,
            ..SubsystemStatus::default()
        };
        assert_eq!(
            next_state(RobotState::HatchScore, &intent(), &done),
            RobotState::WaitingToLoad
        );
        let confirm = DriverIntent {
            confirm_scored: true,
            ..intent()
        };
        assert_eq!(
            next_state(RobotState::HatchScore, &confirm, &SubsystemStatus::default()),
            RobotState::WaitingToLoad
        );
        assert_eq!(
            next_state(RobotState::HatchScore, &intent(), &SubsystemStatus::default()),
            RobotState::HatchScore
        );
    }

    #[test]
    fn waiting_to_load_picks_path_by_selector() {
        let ball = DriverIntent {
            has_loaded: true,
            secondary_axis: 0.4,
            ..intent()
        };
        assert_eq!(
            next_state(RobotState::WaitingToLoad, &ball, &idle()),
            RobotState::BallPrescore
        );
        let hatch = DriverIntent {
            load: true,
            secondary_axis: -0.4,
            ..intent()
        };
        assert_eq!(
            next_state(RobotState::WaitingToLoad, &hatch, &idle()),
            RobotState::LoadingHatch
        );
        // Zero axis selects neither path.
        let neutral = DriverIntent {
            load: true,
            has_loaded: true,
            ..intent()
        };
        assert_eq!(
            next_state(RobotState::WaitingToLoad, &neutral, &idle()),
            RobotState::WaitingToLoad
        );
        // Busy intake blocks both.
        assert_eq!(
            next_state(RobotState::WaitingToLoad, &hatch, &SubsystemStatus::default()),
            RobotState::WaitingToLoad
        );
    }

    #[test]
    fn loading_hatch_exits_on_completion_or_confirmed_hatch() {
        let done = SubsystemStatus {
            intake_complete: true,
            ..SubsystemStatus::default()
        };
        assert_eq!(
            next_state(RobotState::LoadingHatch, &intent(), &done),
            RobotState::HatchPrescore
        );
        let confirm = DriverIntent {
            confirm_loaded: true,
            secondary_axis: -1.0,
            ..intent()
        };
        assert_eq!(
            next_state(RobotState::LoadingHatch, &confirm, &SubsystemStatus::default()),
            RobotState::HatchPrescore
        );
        let confirm_ball_side = DriverIntent {
            secondary_axis: 1.0,
            ..confirm
        };
        assert_eq!(
            next_state(
                RobotState::LoadingHatch,
                &confirm_ball_side,
                &SubsystemStatus::default()
            ),
            RobotState::LoadingHatch
        );
    }

    #[test]
    fn ball_scores_exit_on_their_own_completion() {
        let high = SubsystemStatus {
            ball_score_high_complete: true,
            ..SubsystemStatus::default()
        };
        let low = SubsystemStatus {
            ball_score_low_complete: true,
            ..SubsystemStatus::default()
        };
        assert_eq!(
            next_state(RobotState::BallFrontScore, &intent(), &high),
            RobotState::WaitingToLoad
        );
        assert_eq!(
            next_state(RobotState::BallFrontScore, &intent(), &low),
            RobotState::BallFrontScore
        );
        assert_eq!(
            next_state(RobotState::BallBackScore, &intent(), &low),
            RobotState::WaitingToLoad
        );
    }

    #[test]
    fn terminal_states_never_exit_on_their_own() {
        let everything = DriverIntent {
            score: true,
            load: true,
            has_loaded: true,
            confirm_scored: true,
            confirm_loaded: true,
            secondary_axis: -1.0,
        };
        let all_done = SubsystemStatus {
            holding_hatch: true,
            idle: true,
            score_complete: true,
            intake_complete: true,
            ball_score_high_complete: true,
            ball_score_low_complete: true,
        };
        for state in [
            RobotState::BallPrescore,
            RobotState::Defense,
            RobotState::Climb,
            RobotState::Default,
        ] {
            assert_eq!(next_state(state, &everything, &all_done), state);
        }
    }

    // ---- state machine

    #[test]
    fn transition_applies_one_cycle_late() {
        let mut robot = RobotStateMachine::new(RobotState::WaitingToLoad, None, None);
        let mut input = OperatorSnapshot::default();
        input.intent.has_loaded = true;
        input.intent.secondary_axis = 1.0;

        assert_eq!(robot.tick(&input).unwrap(), RobotState::WaitingToLoad);
        assert_eq!(robot.state(), RobotState::WaitingToLoad);
        assert_eq!(robot.pending(), Some(RobotState::BallPrescore));

        assert_eq!(robot.tick(&input).unwrap(), RobotState::BallPrescore);
        assert_eq!(robot.pending(), None);
        assert_eq!(robot.cycles(), 2);
    }

    #[test]
    fn request_by_name_queues_for_next_cycle() {
        let mut robot = RobotStateMachine::new(RobotState::Default, None, None);
        robot.request_by_name("BALL_FRONT_SCORE").unwrap();
        assert_eq!(robot.state(), RobotState::Default);
        assert_eq!(
            robot.tick(&OperatorSnapshot::default()).unwrap(),
            RobotState::BallFrontScore
        );
    }

    #[test]
    fn unknown_name_is_fatal_and_queues_nothing() {
        let mut robot = RobotStateMachine::new(RobotState::Default, None, None);
        let err = robot.request_by_name("HOVER").unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, MechError::UnknownState { ref value, .. } if value == "HOVER"));
        assert_eq!(robot.pending(), None);
    }

    #[test]
    fn decoding_unknown_code_is_fatal() {
        let err = MechanismState::<RobotStateMachine, RobotState>::from_code(200).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn stop_clears_pending() {
        let mut robot = RobotStateMachine::new(RobotState::Default, None, None);
        robot.request(MechanismState::of(RobotState::Climb));
        robot.stop().unwrap();
        assert_eq!(robot.pending(), None);
        assert_eq!(robot.state(), RobotState::Default);
    }

    #[test]
    fn report_names_state() {
        let robot = RobotStateMachine::new(RobotState::HatchScore, None, None);
        let mut sink = MemorySink::new();
        robot.report(&mut sink);
        assert_eq!(sink.text("robot/state"), Some("HATCH_SCORE"));
    }

    fn any_intent() -> impl Strategy<Value = DriverIntent> {
        (
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            any::<bool>(),
            -1.0f64..=1.0,
        )
            .prop_map(
                |(score, load, has_loaded, confirm_scored, confirm_loaded, secondary_axis)| {
                    DriverIntent {
                        score,
                        load,
                        has_loaded,
                        confirm_scored,
                        confirm_loaded,
                        secondary_axis,
                    }
                },
            )
    }

    proptest! {
        /// The state that runs at cycle t+1 is exactly what the table decided
        /// at cycle t; the state that runs at t is never the one decided at t.
        #[test]
        fn single_step_delay(
            start in 0u8..11,
            intents in proptest::collection::vec(any_intent(), 1..40),
        ) {
            let initial = RobotState::try_from(start).unwrap();
            let mut robot = RobotStateMachine::new(initial, None, None);
            let mut expected = initial;
            for intent in &intents {
                let input = OperatorSnapshot { intent: *intent, ..OperatorSnapshot::default() };
                let ran = robot.tick(&input).unwrap();
                prop_assert_eq!(ran, expected);
                prop_assert_eq!(robot.state(), expected);
                expected = next_state(ran, intent, &robot.status());
            }
        }
    }
}
