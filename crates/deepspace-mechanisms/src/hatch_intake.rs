//! [`HatchIntake`] – two-piston hatch panel gripper.
//!
//! The linear piston reaches the gripper out of the frame perimeter; the
//! rotary piston expands the gripper inside a panel's hole to hold it.  The
//! four postures are the combinations of the two.

use deepspace_hal::{HatchPorts, Solenoid};
use deepspace_kernel::{Mechanism, MechanismState, StatusPublisher, StatusQuery, status_channel};
use deepspace_types::{HatchIntakeState, MechError, Telemetered, TelemetrySink};

/// `(linear out, gripper expanded)` for each posture.
fn pistons(state: HatchIntakeState) -> (bool, bool) {
    match state {
        HatchIntakeState::Hold => (false, true),
        HatchIntakeState::Extend => (true, true),
        HatchIntakeState::Release => (true, false),
        HatchIntakeState::Retract => (false, false),
    }
}

pub struct HatchIntake {
    linear: Box<dyn Solenoid>,
    rotary: Box<dyn Solenoid>,
    state: HatchIntakeState,
    holding: StatusPublisher,
    extended: StatusPublisher,
}

impl HatchIntake {
    pub fn new(ports: HatchPorts) -> Self {
        let (holding, _) = status_channel("hatch/holding");
        let (extended, _) = status_channel("hatch/extended");
        Self {
            linear: ports.linear,
            rotary: ports.rotary,
            state: HatchIntakeState::Retract,
            holding,
            extended,
        }
    }

    /// Raised while the linear piston is out.
    pub fn extended_query(&self) -> StatusQuery {
        self.extended.query()
    }

    pub fn is_holding(&self) -> bool {
        self.holding.get()
    }

    pub fn is_extended(&self) -> bool {
        self.extended.get()
    }
}

impl Mechanism for HatchIntake {
    type State = HatchIntakeState;

    fn name(&self) -> &'static str {
        "hatch_intake"
    }

    fn current_state(&self) -> HatchIntakeState {
        self.state
    }

    fn transition_to(
        &mut self,
        state: MechanismState<Self, HatchIntakeState>,
    ) -> Result<(), MechError> {
        let value = state.into_value();
        let (linear_out, grip) = pistons(value);
        self.linear.set_extended(linear_out)?;
        self.rotary.set_extended(grip)?;
        if value != self.state {
            tracing::debug!(from = %self.state, to = %value, "hatch intake posture");
        }
        self.state = value;
        self.holding.publish(value == HatchIntakeState::Hold);
        self.extended.publish(linear_out);
        Ok(())
    }

    /// Pull the reach piston in.  The gripper is left as it is so a held
    /// panel is not dropped; the posture becomes `Hold` or `Retract`.
    fn stop(&mut self) -> Result<(), MechError> {
        self.linear.set_extended(false)?;
        let (_, grip) = pistons(self.state);
        let stowed = if grip {
            HatchIntakeState::Hold
        } else {
            HatchIntakeState::Retract
        };
        if stowed != self.state {
            tracing::debug!(from = %self.state, to = %stowed, "hatch intake stopped");
        }
        self.state = stowed;
        self.holding.publish(stowed == HatchIntakeState::Hold);
        self.extended.publish(false);
        Ok(())
    }
}

impl Telemetered for HatchIntake {
    fn report(&self, sink: &mut dyn TelemetrySink) {
        sink.record("hatch/state", self.state.name().into());
    }
}
