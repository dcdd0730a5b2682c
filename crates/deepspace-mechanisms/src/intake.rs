//! [`IntakeSupervisor`] – coarse intake intents for the robot state machine.
//!
//! The robot state machine asks for "score the panel" or "hold the hatch"
//! and polls for completion; the supervisor turns those intents into
//! postures of the hatch and ball intakes and modes of the leadscrew.
//!
//! Multi-step intents run a [`StepSequence`] that restarts every time the
//! intent is entered.  Completion is latched when the behavior runs, so the
//! status the state machine reads always matches what was last commanded.
//!
//! Any of the three owned mechanisms may be absent (disabled by
//! configuration); commands to an absent mechanism are skipped.

use std::sync::Arc;

use deepspace_hal::Clock;
use deepspace_kernel::{Mechanism, MechanismState, StatusQuery};
use deepspace_types::{
    BallIntakeState, HatchIntakeState, IntakeState, MechError, Telemetered, TelemetrySink,
};

use crate::ball_intake::BallIntake;
use crate::config::{BallTimings, HatchTimings};
use crate::hatch_intake::HatchIntake;
use crate::leadscrew::{LeadscrewController, LeadscrewInput};
use crate::sequence::StepSequence;

pub struct IntakeSupervisor {
    hatch: Option<HatchIntake>,
    ball: Option<BallIntake>,
    leadscrew: Option<LeadscrewController>,
    state: IntakeState,
    entered: Option<IntakeState>,
    leadscrew_input: LeadscrewInput,
    score_panel: StepSequence<HatchIntakeState>,
    intake_panel: StepSequence<HatchIntakeState>,
    ball_high: StepSequence<BallIntakeState>,
    ball_low: StepSequence<BallIntakeState>,
    sequence_complete: bool,
    step: usize,
}

impl IntakeSupervisor {
    pub fn new(
        hatch: Option<HatchIntake>,
        ball: Option<BallIntake>,
        leadscrew: Option<LeadscrewController>,
        hatch_timings: &HatchTimings,
        ball_timings: &BallTimings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let score_out = hatch_timings.linear_out();
        let score_panel = StepSequence::new(Arc::clone(&clock), HatchIntakeState::Extend)
            .then(score_out, HatchIntakeState::Release)
            .then(
                score_out + hatch_timings.rotary_contract(),
                HatchIntakeState::Retract,
            );

        let load_reach = hatch_timings
            .rotary_contract()
            .max(hatch_timings.linear_out());
        let intake_panel = StepSequence::new(Arc::clone(&clock), HatchIntakeState::Release)
            .then(load_reach, HatchIntakeState::Extend)
            .then(
                load_reach + hatch_timings.rotary_expand(),
                HatchIntakeState::Hold,
            );

        let lock = ball_timings.lock_close();
        let ball_high = StepSequence::new(Arc::clone(&clock), BallIntakeState::Locked)
            .then(lock, BallIntakeState::Raised)
            .then(lock + ball_timings.rotary_open(), BallIntakeState::Stowed);

        let ball_low = StepSequence::new(clock, BallIntakeState::Released)
            .then(ball_timings.retain_release(), BallIntakeState::Stowed);

        Self {
            hatch,
            ball,
            leadscrew,
            state: IntakeState::Idle,
            entered: None,
            leadscrew_input: LeadscrewInput::default(),
            score_panel,
            intake_panel,
            ball_high,
            ball_low,
            sequence_complete: false,
            step: 0,
        }
    }

    /// Operator leadscrew controls for the coming cycle.
    pub fn set_leadscrew_input(&mut self, input: LeadscrewInput) {
        self.leadscrew_input = input;
    }

    pub fn hatch(&self) -> Option<&HatchIntake> {
        self.hatch.as_ref()
    }

    pub fn ball(&self) -> Option<&BallIntake> {
        self.ball.as_ref()
    }

    pub fn leadscrew(&self) -> Option<&LeadscrewController> {
        self.leadscrew.as_ref()
    }

    pub fn leadscrew_mut(&mut self) -> Option<&mut LeadscrewController> {
        self.leadscrew.as_mut()
    }

    /// Raised while the hatch reach piston is out.  Always low without a
    /// hatch intake.
    pub fn extended_query(&self) -> StatusQuery {
        match &self.hatch {
            Some(hatch) => hatch.extended_query(),
            None => StatusQuery::constant("hatch/extended", false),
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Intents
    // ────────────────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Hardware faults from any owned mechanism.
    pub fn idle(&mut self) -> Result<(), MechError> {
        self.transition_to(MechanismState::of(IntakeState::Idle))
    }

    /// # Errors
    ///
    /// Hardware faults from any owned mechanism.
    pub fn holding_hatch(&mut self) -> Result<(), MechError> {
        self.transition_to(MechanismState::of(IntakeState::HoldingHatch))
    }

    /// # Errors
    ///
    /// Hardware faults from any owned mechanism.
    pub fn intake_panel(&mut self) -> Result<(), MechError> {
        self.transition_to(MechanismState::of(IntakeState::IntakePanel))
    }

    /// # Errors
    ///
    /// Hardware faults from any owned mechanism.
    pub fn score_panel(&mut self) -> Result<(), MechError> {
        self.transition_to(MechanismState::of(IntakeState::ScorePanel))
    }

    /// # Errors
    ///
    /// Hardware faults from any owned mechanism.
    pub fn score_ball_high(&mut self) -> Result<(), MechError> {
        self.transition_to(MechanismState::of(IntakeState::ScoreBallHigh))
    }

    /// # Errors
    ///
    /// Hardware faults from any owned mechanism.
    pub fn score_ball_low(&mut self) -> Result<(), MechError> {
        self.transition_to(MechanismState::of(IntakeState::ScoreBallLow))
    }

    // ────────────────────────────────────────────────────────────────────
    // Status
    // ────────────────────────────────────────────────────────────────────

    pub fn is_idle(&self) -> bool {
        self.state == IntakeState::Idle
    }

    pub fn is_holding_hatch(&self) -> bool {
        self.hatch.as_ref().is_some_and(HatchIntake::is_holding)
    }

    pub fn score_complete(&self) -> bool {
        self.state == IntakeState::ScorePanel && self.sequence_complete
    }

    pub fn intake_complete(&self) -> bool {
        self.state == IntakeState::IntakePanel && self.sequence_complete
    }

    pub fn ball_score_high_complete(&self) -> bool {
        self.state == IntakeState::ScoreBallHigh && self.sequence_complete
    }

    pub fn ball_score_low_complete(&self) -> bool {
        self.state == IntakeState::ScoreBallLow && self.sequence_complete
    }

    /// Step index of the running sequence, zero for single-posture intents.
    pub fn step(&self) -> usize {
        self.step
    }

    // ────────────────────────────────────────────────────────────────────
    // Owned mechanisms
    // ────────────────────────────────────────────────────────────────────

    fn restart_sequence(&mut self, state: IntakeState) {
        match state {
            IntakeState::IntakePanel => self.intake_panel.restart(),
            IntakeState::ScorePanel => self.score_panel.restart(),
            IntakeState::ScoreBallHigh => self.ball_high.restart(),
            IntakeState::ScoreBallLow => self.ball_low.restart(),
            IntakeState::Idle | IntakeState::HoldingHatch => {}
        }
    }

    fn set_hatch(&mut self, posture: HatchIntakeState) -> Result<(), MechError> {
        match self.hatch.as_mut() {
            Some(hatch) => hatch.transition_to(MechanismState::of(posture)),
            None => Ok(()),
        }
    }

    fn set_ball(&mut self, posture: BallIntakeState) -> Result<(), MechError> {
        match self.ball.as_mut() {
            Some(ball) => ball.transition_to(MechanismState::of(posture)),
            None => Ok(()),
        }
    }

    fn run_leadscrew(&mut self, align: bool) -> Result<(), MechError> {
        let input = if align {
            self.leadscrew_input.with_align()
        } else {
            self.leadscrew_input
        };
        match self.leadscrew.as_mut() {
            Some(leadscrew) => leadscrew.enact_movement(&input),
            None => Ok(()),
        }
    }
}

impl Mechanism for IntakeSupervisor {
    type State = IntakeState;

    fn name(&self) -> &'static str {
        "intake"
    }

    fn current_state(&self) -> IntakeState {
        self.state
    }

    fn transition_to(&mut self, state: MechanismState<Self, IntakeState>) -> Result<(), MechError> {
        let value = state.into_value();
        if self.entered != Some(value) {
            tracing::info!(intent = %value, "intake intent");
            self.restart_sequence(value);
            self.entered = Some(value);
        }
        self.state = value;

        let (complete, step) = match value {
            IntakeState::Idle => {
                self.set_hatch(HatchIntakeState::Retract)?;
                self.set_ball(BallIntakeState::Stowed)?;
                self.run_leadscrew(false)?;
                (true, 0)
            }
            IntakeState::HoldingHatch => {
                self.set_hatch(HatchIntakeState::Hold)?;
                self.set_ball(BallIntakeState::Stowed)?;
                self.run_leadscrew(true)?;
                (true, 0)
            }
            IntakeState::IntakePanel => {
                self.set_hatch(self.intake_panel.current())?;
                self.set_ball(BallIntakeState::Stowed)?;
                self.run_leadscrew(true)?;
                (self.intake_panel.is_complete(), self.intake_panel.step_index())
            }
            IntakeState::ScorePanel => {
                self.set_hatch(self.score_panel.current())?;
                self.set_ball(BallIntakeState::Stowed)?;
                self.run_leadscrew(false)?;
                (self.score_panel.is_complete(), self.score_panel.step_index())
            }
            IntakeState::ScoreBallHigh => {
                self.set_hatch(HatchIntakeState::Retract)?;
                self.set_ball(self.ball_high.current())?;
                self.run_leadscrew(false)?;
                (self.ball_high.is_complete(), self.ball_high.step_index())
            }
            IntakeState::ScoreBallLow => {
                self.set_hatch(HatchIntakeState::Retract)?;
                self.set_ball(self.ball_low.current())?;
                self.run_leadscrew(false)?;
                (self.ball_low.is_complete(), self.ball_low.step_index())
            }
        };
        self.sequence_complete = complete;
        self.step = step;
        Ok(())
    }

    /// Stop every owned mechanism, attempting all of them before reporting
    /// the first failure.
    fn stop(&mut self) -> Result<(), MechError> {
        let results = [
            self.leadscrew.as_mut().map(Mechanism::stop),
            self.hatch.as_mut().map(Mechanism::stop),
            self.ball.as_mut().map(Mechanism::stop),
        ];
        self.entered = None;
        results.into_iter().flatten().collect()
    }
}

impl Telemetered for IntakeSupervisor {
    fn report(&self, sink: &mut dyn TelemetrySink) {
        sink.record("intake/state", self.state.name().into());
        sink.record("intake/step", (self.step as f64).into());
        if let Some(hatch) = &self.hatch {
            hatch.report(sink);
        }
        if let Some(ball) = &self.ball {
            ball.report(sink);
        }
        if let Some(leadscrew) = &self.leadscrew {
            leadscrew.report(sink);
        }
    }
}
