//! [`LeadscrewController`] – single-axis position actuator for the hatch
//! intake.
//!
//! The leadscrew carries the hatch mechanism left and right across the front
//! of the robot.  Each control cycle [`LeadscrewController::enact_movement`]
//!
//! 1. re-derives the [`LeadscrewState`] from operator input (manual hold
//!    beats camera-align, anything else is idle),
//! 2. zeroes the encoder if the home limit switch is closed, and
//! 3. dispatches to the mode behavior.
//!
//! Step 2 runs before step 3 so a fresh zero reference is what the mode
//! behavior sees.  Every open-loop speed passes the soft-limit clamp and
//! every position target is clamped into travel before conversion to ticks.
//!
//! The encoder is the only record of position; nothing here caches it.
//!
//! # Example
//!
//! ```rust
//! use deepspace_hal::SimRig;
//! use deepspace_mechanisms::{LeadscrewConfig, LeadscrewController, LeadscrewInput};
//!
//! let config = LeadscrewConfig::default();
//! let (hardware, _handles) = SimRig::new()
//!     .with_leadscrew(config.travel_ticks(), 400.0)
//!     .build();
//! let mut leadscrew = LeadscrewController::new(hardware.leadscrew.unwrap(), config).unwrap();
//!
//! leadscrew.enact_movement(&LeadscrewInput::default()).unwrap();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use deepspace_hal::{LeadscrewPorts, LimitSwitch, MotorController, PositionSensor, VisionCamera};
use deepspace_kernel::{Mechanism, MechanismState, TravelLimits};
use deepspace_types::{LeadscrewState, MechError, Telemetered, TelemetrySink};
use serde::{Deserialize, Serialize};

use crate::config::{HomingLimits, LeadscrewConfig};

/// Operator controls relevant to the leadscrew, sampled once per cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadscrewInput {
    /// Manual-drive button is held.
    pub manual_held: bool,
    /// Camera-align button is held.
    pub align_held: bool,
    /// Raw manual axis, `[-1, 1]`.
    pub manual_axis: f64,
}

impl LeadscrewInput {
    /// The same input with camera-align requested.  Manual hold still wins.
    pub fn with_align(self) -> Self {
        Self {
            align_held: true,
            ..self
        }
    }

    /// Mode selected by this input, in priority order.
    pub fn requested_state(&self) -> LeadscrewState {
        if self.manual_held {
            LeadscrewState::Manual
        } else if self.align_held {
            LeadscrewState::CameraAlign
        } else {
            LeadscrewState::Idle
        }
    }
}

/// Closed-loop controller for the leadscrew axis.
pub struct LeadscrewController {
    motor: Box<dyn MotorController>,
    encoder: Box<dyn PositionSensor>,
    camera: Option<Box<dyn VisionCamera>>,
    config: LeadscrewConfig,
    limits: TravelLimits,
    state: LeadscrewState,
    manual_speed: f64,
    /// A non-zero open-loop output is applied.  It stays on the motor until
    /// the next command, so a mode that issues nothing must clear it first.
    open_loop: bool,
    /// Last computed vision error.  Reported to telemetry only.
    reported_camera_error: Option<f64>,
}

impl LeadscrewController {
    /// Take ownership of the leadscrew ports, push the nominal gains to the
    /// motor controller and select the vision pipeline.
    ///
    /// # Errors
    ///
    /// [`MechError::Config`] for invalid geometry, or a hardware fault from
    /// the initial configuration calls.
    pub fn new(ports: LeadscrewPorts, config: LeadscrewConfig) -> Result<Self, MechError> {
        config.validate()?;
        let limits = config.travel_limits()?;
        let LeadscrewPorts {
            mut motor,
            encoder,
            mut camera,
        } = ports;

        motor.configure_gains(&config.gains)?;
        if let Some(camera) = camera.as_mut() {
            camera.set_pipeline(config.vision_pipeline)?;
        }

        Ok(Self {
            motor,
            encoder,
            camera,
            config,
            limits,
            state: LeadscrewState::Idle,
            manual_speed: 0.0,
            open_loop: false,
            reported_camera_error: None,
        })
    }

    pub fn config(&self) -> &LeadscrewConfig {
        &self.config
    }

    pub fn limits(&self) -> &TravelLimits {
        &self.limits
    }

    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    // ────────────────────────────────────────────────────────────────────
    // Per-cycle entry point
    // ────────────────────────────────────────────────────────────────────

    /// Run one control cycle from operator input.
    ///
    /// # Errors
    ///
    /// Hardware faults from the motor, encoder or camera.
    pub fn enact_movement(&mut self, input: &LeadscrewInput) -> Result<(), MechError> {
        let state = input.requested_state();
        self.manual_speed = self.manual_speed_for(input.manual_axis);

        if self.motor.limit_switch_closed(LimitSwitch::Home) {
            self.zero()?;
        }

        self.transition_to(MechanismState::of(state))
    }

    /// Inverted, squared response with a deadband.
    fn manual_speed_for(&self, axis: f64) -> f64 {
        if axis.abs() > self.config.manual_deadband {
            -axis * axis.abs() * self.config.manual_scale
        } else {
            0.0
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Commands
    // ────────────────────────────────────────────────────────────────────

    /// Open-loop drive.  Inside the soft-limit zone the magnitude is capped
    /// at the soft speed, keeping the sign.  Returns the issued output.
    ///
    /// # Errors
    ///
    /// Hardware fault from the motor.
    pub fn set_speed(&mut self, percent: f64) -> Result<f64, MechError> {
        let speed = self.limits.clamp_speed(self.position_inches(), percent);
        if speed != percent {
            tracing::trace!(requested = percent, issued = speed, "leadscrew speed clamped");
        }
        self.motor.set_percent_output(speed)?;
        self.open_loop = speed != 0.0;
        Ok(speed)
    }

    /// Closed-loop move to `inches` from the home end, clamped into travel,
    /// using the nominal gains.  Returns the issued target in ticks.
    ///
    /// # Errors
    ///
    /// Hardware fault from the motor.
    pub fn set_position(&mut self, inches: f64) -> Result<f64, MechError> {
        let clamped = self.limits.clamp_position(inches);
        let ticks = clamped * self.config.ticks_per_inch;
        self.motor.configure_gains(&self.config.gains)?;
        self.motor.set_position_target(ticks)?;
        self.open_loop = false;
        tracing::debug!(requested = inches, inches = clamped, ticks, "leadscrew position target");
        Ok(ticks)
    }

    /// Lateral distance to the target in inches, from the camera's angle.
    /// `None` without a camera or a visible target.
    pub fn camera_error(&self) -> Option<f64> {
        let camera = self.camera.as_ref()?;
        if !camera.has_target() {
            return None;
        }
        let angle = camera.horizontal_angle_to_target().to_radians();
        Some(self.config.target_distance_in * angle.tan())
    }

    /// Move so the target sits in the middle of travel.  A position command
    /// is only issued when the goal is further than the camera tolerance from
    /// the current position.  Returns the commanded goal, if any.
    ///
    /// # Errors
    ///
    /// Hardware fault from the motor.
    pub fn center_with_camera(&mut self) -> Result<Option<f64>, MechError> {
        let error = self.camera_error();
        self.reported_camera_error = error;
        let Some(error) = error else {
            return Ok(None);
        };

        let goal = self.limits.center() - error;
        if (goal - self.position_inches()).abs() > self.config.camera_tolerance_in {
            self.set_position(goal)?;
            Ok(Some(goal))
        } else {
            Ok(None)
        }
    }

    /// Declare the current position to be the home end.
    ///
    /// # Errors
    ///
    /// Hardware fault from the encoder.
    pub fn zero(&mut self) -> Result<(), MechError> {
        self.encoder.set_position_ticks(0.0)
    }

    // ────────────────────────────────────────────────────────────────────
    // Homing
    // ────────────────────────────────────────────────────────────────────

    /// One non-blocking homing step.  Drives toward home (slower inside the
    /// soft zone) until the home switch closes, then stops and zeroes.
    /// Returns `true` once homed.
    ///
    /// # Errors
    ///
    /// Hardware fault from the motor or encoder.
    pub fn homing_step(&mut self) -> Result<bool, MechError> {
        if self.motor.limit_switch_closed(LimitSwitch::Home) {
            self.motor.set_percent_output(0.0)?;
            self.open_loop = false;
            self.zero()?;
            tracing::info!("leadscrew homed");
            return Ok(true);
        }
        let speed = if self.in_soft_limit() {
            self.config.homing_soft_speed
        } else {
            self.config.homing_speed
        };
        self.motor.set_percent_output(-speed)?;
        self.open_loop = true;
        Ok(false)
    }

    /// Blocking homing for callers that home before any control loop runs.
    /// Returns the number of steps taken.
    ///
    /// # Errors
    ///
    /// [`MechError::HomingAborted`] when `abort` is raised,
    /// [`MechError::HomingTimedOut`] after `limits.max_cycles` steps, or a
    /// hardware fault.  The motor is stopped on every error path except a
    /// hardware fault from the motor itself.
    pub fn leadscrew_initial_zero(
        &mut self,
        limits: &HomingLimits,
        abort: &AtomicBool,
    ) -> Result<u32, MechError> {
        let pace = limits.step_period();
        for step in 1..=limits.max_cycles {
            if abort.load(Ordering::SeqCst) {
                self.stop()?;
                tracing::warn!(step, "leadscrew homing aborted");
                return Err(MechError::HomingAborted);
            }
            if self.homing_step()? {
                return Ok(step);
            }
            if !pace.is_zero() {
                std::thread::sleep(pace);
            }
        }
        self.stop()?;
        tracing::error!(cycles = limits.max_cycles, "leadscrew homing timed out");
        Err(MechError::HomingTimedOut {
            cycles: limits.max_cycles,
        })
    }

    // ────────────────────────────────────────────────────────────────────
    // Queries
    // ────────────────────────────────────────────────────────────────────

    pub fn position_ticks(&self) -> f64 {
        self.encoder.position_ticks()
    }

    /// Current position in inches from the home end.
    pub fn position_inches(&self) -> f64 {
        self.encoder.position_ticks() / self.config.ticks_per_inch
    }

    pub fn in_soft_limit(&self) -> bool {
        self.limits.in_soft_zone(self.position_inches())
    }

    /// `true` once the last closed-loop target has been reached within the
    /// configured tick tolerance.
    pub fn is_in_range(&self) -> bool {
        self.motor.closed_loop_error().abs() <= self.config.gains.tolerance
    }

    /// Output the motor is applying, as a signed fraction.
    pub fn output_percent(&self) -> f64 {
        self.motor.output_percent()
    }
}

impl Mechanism for LeadscrewController {
    type State = LeadscrewState;

    fn name(&self) -> &'static str {
        "leadscrew"
    }

    fn current_state(&self) -> LeadscrewState {
        self.state
    }

    fn transition_to(
        &mut self,
        state: MechanismState<Self, LeadscrewState>,
    ) -> Result<(), MechError> {
        let value = state.into_value();
        if value != self.state {
            tracing::debug!(from = %self.state, to = %value, "leadscrew mode");
        }
        self.state = value;
        match value {
            LeadscrewState::Manual => {
                self.reported_camera_error = None;
                self.set_speed(self.manual_speed)?;
            }
            LeadscrewState::CameraAlign => {
                let commanded = self.center_with_camera()?;
                // Without a new target, neither a lost target nor a manual
                // output left from the last cycle may keep driving the axis.
                if commanded.is_none() && (self.reported_camera_error.is_none() || self.open_loop)
                {
                    self.set_speed(0.0)?;
                }
            }
            LeadscrewState::Idle => {
                self.reported_camera_error = None;
                self.set_speed(0.0)?;
            }
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), MechError> {
        self.motor.set_percent_output(0.0)?;
        self.open_loop = false;
        Ok(())
    }
}

impl Telemetered for LeadscrewController {
    fn report(&self, sink: &mut dyn TelemetrySink) {
        sink.record("leadscrew/state", self.state.name().into());
        sink.record("leadscrew/inches", self.position_inches().into());
        sink.record("leadscrew/ticks", self.position_ticks().into());
        if let Some(error) = self.reported_camera_error {
            sink.record("leadscrew/camera_error", error.into());
        }
        sink.record("leadscrew/output", self.output_percent().into());
        sink.record("leadscrew/in_range", self.is_in_range().into());
    }
}
