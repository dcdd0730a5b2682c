//! [`BallIntake`] – three-piston cargo carrier.
//!
//! The lock piston clamps a ball in the carrier, the rotary piston tips the
//! carrier up to the high port and the retain piston keeps the ball from
//! rolling out of the low side.

use deepspace_hal::{BallPorts, Solenoid};
use deepspace_kernel::{Mechanism, MechanismState};
use deepspace_types::{BallIntakeState, MechError, Telemetered, TelemetrySink};

/// `(lock, rotary, retain)` extension for each posture.
fn pistons(state: BallIntakeState) -> (bool, bool, bool) {
    match state {
        BallIntakeState::Stowed => (false, false, true),
        BallIntakeState::Locked => (true, false, true),
        BallIntakeState::Raised => (true, true, true),
        BallIntakeState::Released => (false, false, false),
    }
}

pub struct BallIntake {
    lock: Box<dyn Solenoid>,
    rotary: Box<dyn Solenoid>,
    retain: Box<dyn Solenoid>,
    state: BallIntakeState,
}

impl BallIntake {
    pub fn new(ports: BallPorts) -> Self {
        Self {
            lock: ports.lock,
            rotary: ports.rotary,
            retain: ports.retain,
            state: BallIntakeState::Stowed,
        }
    }
}

impl Mechanism for BallIntake {
    type State = BallIntakeState;

    fn name(&self) -> &'static str {
        "ball_intake"
    }

    fn current_state(&self) -> BallIntakeState {
        self.state
    }

    fn transition_to(
        &mut self,
        state: MechanismState<Self, BallIntakeState>,
    ) -> Result<(), MechError> {
        let value = state.into_value();
        let (lock, rotary, retain) = pistons(value);
        self.lock.set_extended(lock)?;
        self.rotary.set_extended(rotary)?;
        self.retain.set_extended(retain)?;
        if value != self.state {
            tracing::debug!(from = %self.state, to = %value, "ball intake posture");
        }
        self.state = value;
        Ok(())
    }

    /// Lower the carrier; lock and retain stay put.
    fn stop(&mut self) -> Result<(), MechError> {
        self.rotary.set_extended(false)?;
        if self.state == BallIntakeState::Raised {
            tracing::debug!(from = %self.state, to = %BallIntakeState::Locked, "ball intake stopped");
            self.state = BallIntakeState::Locked;
        }
        Ok(())
    }
}

impl Telemetered for BallIntake {
    fn report(&self, sink: &mut dyn TelemetrySink) {
        sink.record("ball/state", self.state.name().into());
    }
}
