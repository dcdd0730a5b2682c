//! The mechanism abstraction shared by every subsystem.
//!
//! A [`Mechanism`] exposes its current state and accepts explicit transition
//! requests.  Requests carry a [`MechanismState`]: a human-readable label for
//! telemetry paired with the typed state value.  Because state types are
//! closed enums, dispatch inside `transition_to` is an exhaustive `match`;
//! the only place an unknown state can appear is when decoding a raw name or
//! code, and that fails with [`MechError::UnknownState`] before any actuator
//! is touched.

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use deepspace_types::MechError;

/// A named, typed state request for mechanism `M`.
///
/// Immutable once constructed.  The `M` parameter ties the state to the
/// mechanism it was built for, so a hatch state cannot be handed to the
/// leadscrew even when both use similar enums.
pub struct MechanismState<M: ?Sized, S> {
    name: Cow<'static, str>,
    value: S,
    _mechanism: PhantomData<fn() -> M>,
}

impl<M: ?Sized, S> MechanismState<M, S> {
    pub fn new(name: impl Into<Cow<'static, str>>, value: S) -> Self {
        Self {
            name: name.into(),
            value,
            _mechanism: PhantomData,
        }
    }

    /// Telemetry label.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &S {
        &self.value
    }

    pub fn into_value(self) -> S {
        self.value
    }
}

impl<M: ?Sized, S: fmt::Display> MechanismState<M, S> {
    /// Build a request labelled with the state's own display name.
    pub fn of(value: S) -> Self {
        Self::new(value.to_string(), value)
    }
}

impl<M: ?Sized, S> MechanismState<M, S>
where
    S: FromStr<Err = MechError> + fmt::Display,
{
    /// Decode a request from a raw state name.
    ///
    /// # Errors
    ///
    /// [`MechError::UnknownState`] when `name` is not a state of `S`.
    pub fn parse(name: &str) -> Result<Self, MechError> {
        let value = name.parse::<S>()?;
        Ok(Self::of(value))
    }
}

impl<M: ?Sized, S> MechanismState<M, S>
where
    S: TryFrom<u8, Error = MechError> + fmt::Display,
{
    /// Decode a request from a raw numeric code.
    ///
    /// # Errors
    ///
    /// [`MechError::UnknownState`] when `code` is not a state of `S`.
    pub fn from_code(code: u8) -> Result<Self, MechError> {
        let value = S::try_from(code)?;
        Ok(Self::of(value))
    }
}

impl<M: ?Sized, S: Clone> Clone for MechanismState<M, S> {
    fn clone(&self) -> Self {
        Self::new(self.name.clone(), self.value.clone())
    }
}

impl<M: ?Sized, S: fmt::Debug> fmt::Debug for MechanismState<M, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MechanismState")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}

impl<M: ?Sized, S: PartialEq> PartialEq for MechanismState<M, S> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.value == other.value
    }
}

/// A physical subsystem with a current state and explicit transitions.
pub trait Mechanism {
    /// The closed set of states this mechanism can be in.
    type State: Copy + fmt::Debug + PartialEq;

    /// Stable name used in logs and telemetry keys.
    fn name(&self) -> &'static str;

    /// Pure read of the current state.
    fn current_state(&self) -> Self::State;

    /// Run exactly one state-specific behavior routine for `state`.
    ///
    /// # Errors
    ///
    /// Propagates hardware faults from the mechanism's ports.
    fn transition_to(&mut self, state: MechanismState<Self, Self::State>) -> Result<(), MechError>;

    /// Drive every actuator of this mechanism to its neutral command.
    ///
    /// # Errors
    ///
    /// Propagates hardware faults from the mechanism's ports.
    fn stop(&mut self) -> Result<(), MechError>;
}

/// Decode `name` into a state of `M` and transition to it.
///
/// This is the dispatch path for state requests that arrive as text (the
/// dashboard, configuration).  An unknown name is a fatal error and nothing
/// is commanded.
///
/// # Errors
///
/// [`MechError::UnknownState`] for unknown names, or whatever the transition
/// itself returns.
pub fn transition_by_name<M>(mechanism: &mut M, name: &str) -> Result<(), MechError>
where
    M: Mechanism,
    M::State: FromStr<Err = MechError> + fmt::Display,
{
    let state = MechanismState::<M, M::State>::parse(name).inspect_err(|e| {
        tracing::error!(mechanism = mechanism.name(), error = %e, "rejected state request");
    })?;
    mechanism.transition_to(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepspace_types::LeadscrewState;

    /// Records every behavior routine it runs.
    #[derive(Default)]
    struct Recorder {
        state: LeadscrewState,
        log: Vec<&'static str>,
    }

    impl Mechanism for Recorder {
        type State = LeadscrewState;

        fn name(&self) -> &'static str {
            "recorder"
        }

        fn current_state(&self) -> LeadscrewState {
            self.state
        }

        fn transition_to(
            &mut self,
            state: MechanismState<Self, LeadscrewState>,
        ) -> Result<(), MechError> {
            self.state = *state.value();
            self.log.push(match self.state {
                LeadscrewState::Manual => "manual",
                LeadscrewState::CameraAlign => "align",
                LeadscrewState::Idle => "idle",
            });
            Ok(())
        }

        fn stop(&mut self) -> Result<(), MechError> {
            self.log.push("stop");
            Ok(())
        }
    }

    #[test]
    fn state_carries_name_and_value() {
        let s = MechanismState::<Recorder, _>::new("align to tape", LeadscrewState::CameraAlign);
        assert_eq!(s.name(), "align to tape");
        assert_eq!(*s.value(), LeadscrewState::CameraAlign);

        let s = MechanismState::<Recorder, _>::of(LeadscrewState::Manual);
        assert_eq!(s.name(), "MANUAL");
        assert_eq!(s.clone(), s);
    }

    #[test]
    fn transition_runs_exactly_one_routine() {
        let mut m = Recorder::default();
        m.transition_to(MechanismState::of(LeadscrewState::CameraAlign))
            .unwrap();
        assert_eq!(m.current_state(), LeadscrewState::CameraAlign);
        assert_eq!(m.log, vec!["align"]);
    }

    #[test]
    fn known_name_dispatches() {
        let mut m = Recorder::default();
        transition_by_name(&mut m, "MANUAL").unwrap();
        assert_eq!(m.current_state(), LeadscrewState::Manual);
    }

    #[test]
    fn unknown_name_is_fatal_and_runs_nothing() {
        let mut m = Recorder::default();
        let err = transition_by_name(&mut m, "SPIN").unwrap_err();
        assert!(err.is_fatal());
        assert!(m.log.is_empty());
        assert_eq!(m.current_state(), LeadscrewState::Idle);
    }

    #[test]
    fn unknown_code_is_rejected() {
        let err = MechanismState::<Recorder, LeadscrewState>::from_code(9).unwrap_err();
        assert!(matches!(err, MechError::UnknownState { .. }));
        let ok = MechanismState::<Recorder, LeadscrewState>::from_code(0).unwrap();
        assert_eq!(*ok.value(), LeadscrewState::Manual);
    }
}
