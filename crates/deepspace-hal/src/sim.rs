//! In-process simulated drivers for running the full stack without hardware.
//!
//! Every constructor returns the driver (to be moved into a mechanism) plus a
//! cloneable handle that shares its state, so tests and the simulation
//! harness can inspect issued commands and move the simulated world.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use deepspace_types::{DriveCommand, MechError};

use crate::camera::VisionCamera;
use crate::clock::Clock;
use crate::drive::DriveBase;
use crate::gyro::Gyro;
use crate::input::InputDevice;
use crate::motor::{LimitSwitch, MotorController, PositionSensor};
use crate::pid::ClosedLoopGains;
use crate::solenoid::Solenoid;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ────────────────────────────────────────────────────────────────────────────
// Motor + encoder
// ────────────────────────────────────────────────────────────────────────────

/// A command observed by a [`SimMotor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCommand {
    Percent(f64),
    Position(f64),
}

/// Linear axis driven by one motor.  Physical position is measured from the
/// home end and bounded by `[0, travel_ticks]`; the encoder reads it relative
/// to `sensor_offset`.  Every command advances the axis by one cycle's worth
/// of motion.
#[derive(Debug)]
struct MotorModel {
    physical_ticks: f64,
    sensor_offset: f64,
    travel_ticks: f64,
    full_speed_ticks: f64,
    output: f64,
    target: f64,
    gains: Option<ClosedLoopGains>,
    commands: Vec<MotorCommand>,
    fault: Option<String>,
}

impl MotorModel {
    fn sensor_ticks(&self) -> f64 {
        self.physical_ticks - self.sensor_offset
    }

    fn advance(&mut self, delta: f64) {
        self.physical_ticks = (self.physical_ticks + delta).clamp(0.0, self.travel_ticks);
    }

    fn take_fault(&mut self, id: &str) -> Result<(), MechError> {
        match self.fault.take() {
            Some(details) => Err(MechError::hardware(id, details)),
            None => Ok(()),
        }
    }
}

/// Simulated smart motor controller.
pub struct SimMotor {
    id: String,
    model: Arc<Mutex<MotorModel>>,
}

/// Simulated encoder sharing the axis of a [`SimMotor`].
pub struct SimEncoder {
    id: String,
    model: Arc<Mutex<MotorModel>>,
}

/// Inspection handle for a simulated motor axis.
#[derive(Clone)]
pub struct SimMotorHandle {
    model: Arc<Mutex<MotorModel>>,
}

/// Build a simulated axis of `travel_ticks` length that moves
/// `full_speed_ticks` per command at 100 % output.  The axis starts half-way
/// along its travel with the encoder reading zero, as after a power cycle.
pub fn sim_motor(
    id: &str,
    travel_ticks: f64,
    full_speed_ticks: f64,
) -> (SimMotor, SimEncoder, SimMotorHandle) {
    let start = travel_ticks / 2.0;
    let model = Arc::new(Mutex::new(MotorModel {
        physical_ticks: start,
        sensor_offset: start,
        travel_ticks,
        full_speed_ticks,
        output: 0.0,
        target: 0.0,
        gains: None,
        commands: Vec::new(),
        fault: None,
    }));
    (
        SimMotor {
            id: id.to_string(),
            model: Arc::clone(&model),
        },
        SimEncoder {
            id: format!("{id}_encoder"),
            model: Arc::clone(&model),
        },
        SimMotorHandle { model },
    )
}

impl MotorController for SimMotor {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_percent_output(&mut self, percent: f64) -> Result<(), MechError> {
        let mut m = lock(&self.model);
        m.take_fault(&self.id)?;
        m.commands.push(MotorCommand::Percent(percent));
        m.output = percent;
        let delta = percent * m.full_speed_ticks;
        m.advance(delta);
        Ok(())
    }

    fn set_position_target(&mut self, ticks: f64) -> Result<(), MechError> {
        let mut m = lock(&self.model);
        m.take_fault(&self.id)?;
        m.commands.push(MotorCommand::Position(ticks));
        m.target = ticks;
        let remaining = ticks + m.sensor_offset - m.physical_ticks;
        let step = remaining.clamp(-m.full_speed_ticks, m.full_speed_ticks);
        m.output = if m.full_speed_ticks > 0.0 {
            step / m.full_speed_ticks
        } else {
            0.0
        };
        m.advance(step);
        Ok(())
    }

    fn configure_gains(&mut self, gains: &ClosedLoopGains) -> Result<(), MechError> {
        let mut m = lock(&self.model);
        m.take_fault(&self.id)?;
        m.gains = Some(*gains);
        Ok(())
    }

    fn closed_loop_target(&self) -> f64 {
        lock(&self.model).target
    }

    fn closed_loop_error(&self) -> f64 {
        let m = lock(&self.model);
        m.target - m.sensor_ticks()
    }

    fn limit_switch_closed(&self, switch: LimitSwitch) -> bool {
        let m = lock(&self.model);
        match switch {
            LimitSwitch::Home => m.physical_ticks <= 0.0,
            LimitSwitch::Far => m.physical_ticks >= m.travel_ticks,
        }
    }

    fn output_percent(&self) -> f64 {
        lock(&self.model).output
    }
}

impl PositionSensor for SimEncoder {
    fn id(&self) -> &str {
        &self.id
    }

    fn position_ticks(&self) -> f64 {
        lock(&self.model).sensor_ticks()
    }

    fn set_position_ticks(&mut self, ticks: f64) -> Result<(), MechError> {
        let mut m = lock(&self.model);
        m.take_fault(&self.id)?;
        m.sensor_offset = m.physical_ticks - ticks;
        Ok(())
    }
}

impl SimMotorHandle {
    pub fn commands(&self) -> Vec<MotorCommand> {
        lock(&self.model).commands.clone()
    }

    pub fn last_command(&self) -> Option<MotorCommand> {
        lock(&self.model).commands.last().copied()
    }

    pub fn clear_commands(&self) {
        lock(&self.model).commands.clear();
    }

    pub fn output(&self) -> f64 {
        lock(&self.model).output
    }

    pub fn gains(&self) -> Option<ClosedLoopGains> {
        lock(&self.model).gains
    }

    pub fn sensor_ticks(&self) -> f64 {
        lock(&self.model).sensor_ticks()
    }

    pub fn physical_ticks(&self) -> f64 {
        lock(&self.model).physical_ticks
    }

    /// Move the axis without touching the encoder reference.
    pub fn set_physical_ticks(&self, ticks: f64) {
        let mut m = lock(&self.model);
        m.physical_ticks = ticks.clamp(0.0, m.travel_ticks);
    }

    /// Make the encoder read `ticks` at the current physical position.
    pub fn set_sensor_ticks(&self, ticks: f64) {
        let mut m = lock(&self.model);
        m.sensor_offset = m.physical_ticks - ticks;
    }

    /// Fail the next driver call with a hardware fault.
    pub fn inject_fault(&self, details: impl Into<String>) {
        lock(&self.model).fault = Some(details.into());
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Solenoid
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SolenoidModel {
    extended: bool,
    switches: u32,
    fault: Option<String>,
}

pub struct SimSolenoid {
    id: String,
    model: Arc<Mutex<SolenoidModel>>,
}

#[derive(Clone)]
pub struct SimSolenoidHandle {
    model: Arc<Mutex<SolenoidModel>>,
}

pub fn sim_solenoid(id: &str) -> (SimSolenoid, SimSolenoidHandle) {
    let model = Arc::new(Mutex::new(SolenoidModel::default()));
    (
        SimSolenoid {
            id: id.to_string(),
            model: Arc::clone(&model),
        },
        SimSolenoidHandle { model },
    )
}

impl Solenoid for SimSolenoid {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_extended(&mut self, extended: bool) -> Result<(), MechError> {
        let mut m = lock(&self.model);
        if let Some(details) = m.fault.take() {
            return Err(MechError::hardware(&self.id, details));
        }
        if m.extended != extended {
            m.switches += 1;
        }
        m.extended = extended;
        Ok(())
    }

    fn is_extended(&self) -> bool {
        lock(&self.model).extended
    }
}

impl SimSolenoidHandle {
    pub fn is_extended(&self) -> bool {
        lock(&self.model).extended
    }

    /// Number of times the valve actually changed position.
    pub fn switches(&self) -> u32 {
        lock(&self.model).switches
    }

    pub fn inject_fault(&self, details: impl Into<String>) {
        lock(&self.model).fault = Some(details.into());
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vision camera
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct CameraModel {
    angle_deg: f64,
    has_target: bool,
    pipeline: u8,
}

pub struct SimCamera {
    id: String,
    model: Arc<Mutex<CameraModel>>,
}

#[derive(Clone)]
pub struct SimCameraHandle {
    model: Arc<Mutex<CameraModel>>,
}

pub fn sim_camera(id: &str) -> (SimCamera, SimCameraHandle) {
    let model = Arc::new(Mutex::new(CameraModel::default()));
    (
        SimCamera {
            id: id.to_string(),
            model: Arc::clone(&model),
        },
        SimCameraHandle { model },
    )
}

impl VisionCamera for SimCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn horizontal_angle_to_target(&self) -> f64 {
        lock(&self.model).angle_deg
    }

    fn has_target(&self) -> bool {
        lock(&self.model).has_target
    }

    fn set_pipeline(&mut self, index: u8) -> Result<(), MechError> {
        lock(&self.model).pipeline = index;
        Ok(())
    }
}

impl SimCameraHandle {
    /// Report a target at `angle_deg`.
    pub fn set_angle(&self, angle_deg: f64) {
        let mut m = lock(&self.model);
        m.angle_deg = angle_deg;
        m.has_target = true;
    }

    /// Lose the target; the angle reads zero.
    pub fn clear_target(&self) {
        let mut m = lock(&self.model);
        m.angle_deg = 0.0;
        m.has_target = false;
    }

    pub fn pipeline(&self) -> u8 {
        lock(&self.model).pipeline
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gyro
// ────────────────────────────────────────────────────────────────────────────

pub struct SimGyro {
    id: String,
    heading: Arc<Mutex<f64>>,
}

#[derive(Clone)]
pub struct SimGyroHandle {
    heading: Arc<Mutex<f64>>,
}

pub fn sim_gyro(id: &str) -> (SimGyro, SimGyroHandle) {
    let heading = Arc::new(Mutex::new(0.0));
    (
        SimGyro {
            id: id.to_string(),
            heading: Arc::clone(&heading),
        },
        SimGyroHandle { heading },
    )
}

impl Gyro for SimGyro {
    fn id(&self) -> &str {
        &self.id
    }

    fn heading_degrees(&self) -> f64 {
        *lock(&self.heading)
    }
}

impl SimGyroHandle {
    pub fn set_heading(&self, degrees: f64) {
        *lock(&self.heading) = degrees;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Drive base
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct DriveModel {
    last: Option<DriveCommand>,
    commands: usize,
    fault: Option<String>,
}

pub struct SimDriveBase {
    id: String,
    model: Arc<Mutex<DriveModel>>,
}

#[derive(Clone)]
pub struct SimDriveHandle {
    model: Arc<Mutex<DriveModel>>,
}

pub fn sim_drive_base(id: &str) -> (SimDriveBase, SimDriveHandle) {
    let model = Arc::new(Mutex::new(DriveModel::default()));
    (
        SimDriveBase {
            id: id.to_string(),
            model: Arc::clone(&model),
        },
        SimDriveHandle { model },
    )
}

impl DriveBase for SimDriveBase {
    fn id(&self) -> &str {
        &self.id
    }

    fn drive(&mut self, command: DriveCommand) -> Result<(), MechError> {
        let mut m = lock(&self.model);
        if let Some(details) = m.fault.take() {
            return Err(MechError::hardware(&self.id, details));
        }
        m.last = Some(command);
        m.commands += 1;
        Ok(())
    }
}

impl SimDriveHandle {
    pub fn last_command(&self) -> Option<DriveCommand> {
        lock(&self.model).last
    }

    pub fn command_count(&self) -> usize {
        lock(&self.model).commands
    }

    pub fn inject_fault(&self, details: impl Into<String>) {
        lock(&self.model).fault = Some(details.into());
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Input device
// ────────────────────────────────────────────────────────────────────────────

const SIM_BUTTONS: usize = 17;
const SIM_AXES: usize = 6;

#[derive(Debug, Default)]
struct InputModel {
    held: [bool; SIM_BUTTONS],
    pressed: [bool; SIM_BUTTONS],
    released: [bool; SIM_BUTTONS],
    axes: [f64; SIM_AXES],
}

pub struct SimInput {
    model: Arc<Mutex<InputModel>>,
}

#[derive(Clone)]
pub struct SimInputHandle {
    model: Arc<Mutex<InputModel>>,
}

pub fn sim_input() -> (SimInput, SimInputHandle) {
    let model = Arc::new(Mutex::new(InputModel::default()));
    (
        SimInput {
            model: Arc::clone(&model),
        },
        SimInputHandle { model },
    )
}

impl InputDevice for SimInput {
    fn button(&self, index: usize) -> bool {
        lock(&self.model).held.get(index).copied().unwrap_or(false)
    }

    fn button_pressed(&mut self, index: usize) -> bool {
        let mut m = lock(&self.model);
        m.pressed
            .get_mut(index)
            .map(std::mem::take)
            .unwrap_or(false)
    }

    fn button_released(&mut self, index: usize) -> bool {
        let mut m = lock(&self.model);
        m.released
            .get_mut(index)
            .map(std::mem::take)
            .unwrap_or(false)
    }

    fn axis(&self, index: usize) -> f64 {
        lock(&self.model).axes.get(index).copied().unwrap_or(0.0)
    }
}

impl SimInputHandle {
    pub fn press(&self, index: usize) {
        let mut m = lock(&self.model);
        if index < SIM_BUTTONS && !m.held[index] {
            m.held[index] = true;
            m.pressed[index] = true;
        }
    }

    pub fn release(&self, index: usize) {
        let mut m = lock(&self.model);
        if index < SIM_BUTTONS && m.held[index] {
            m.held[index] = false;
            m.released[index] = true;
        }
    }

    /// Press and release within one cycle.
    pub fn tap(&self, index: usize) {
        self.press(index);
        self.release(index);
    }

    pub fn set_axis(&self, index: usize, value: f64) {
        if let Some(slot) = lock(&self.model).axes.get_mut(index) {
            *slot = value;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Clock
// ────────────────────────────────────────────────────────────────────────────

/// A [`Clock`] that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *lock(&self.now) += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *lock(&self.now)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_output_moves_axis_until_hard_stop() {
        let (mut motor, encoder, handle) = sim_motor("leadscrew", 1000.0, 100.0);
        assert_eq!(encoder.position_ticks(), 0.0);
        assert!(!motor.limit_switch_closed(LimitSwitch::Home));

        for _ in 0..10 {
            motor.set_percent_output(-1.0).unwrap();
        }
        assert_eq!(handle.physical_ticks(), 0.0);
        assert!(motor.limit_switch_closed(LimitSwitch::Home));
        assert_eq!(encoder.position_ticks(), -500.0);
    }

    #[test]
    fn zeroing_the_encoder_rebases_readings() {
        let (mut motor, mut encoder, handle) = sim_motor("leadscrew", 1000.0, 100.0);
        handle.set_physical_ticks(0.0);
        encoder.set_position_ticks(0.0).unwrap();
        motor.set_percent_output(0.5).unwrap();
        assert!((encoder.position_ticks() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn position_target_converges() {
        let (mut motor, encoder, _handle) = sim_motor("leadscrew", 1000.0, 100.0);
        for _ in 0..5 {
            motor.set_position_target(250.0).unwrap();
        }
        assert!((encoder.position_ticks() - 250.0).abs() < 1e-9);
        assert!(motor.closed_loop_error().abs() < 1e-9);
        assert_eq!(motor.closed_loop_target(), 250.0);
    }

    #[test]
    fn injected_fault_fails_one_call() {
        let (mut motor, _encoder, handle) = sim_motor("leadscrew", 1000.0, 100.0);
        handle.inject_fault("overcurrent");
        let err = motor.set_percent_output(0.1).unwrap_err();
        assert!(matches!(err, MechError::HardwareFault { .. }));
        assert!(motor.set_percent_output(0.1).is_ok());
        assert_eq!(handle.commands(), vec![MotorCommand::Percent(0.1)]);
    }

    #[test]
    fn solenoid_counts_real_switches() {
        let (mut valve, handle) = sim_solenoid("hatch_linear");
        valve.set_extended(true).unwrap();
        valve.set_extended(true).unwrap();
        valve.set_extended(false).unwrap();
        assert!(!handle.is_extended());
        assert_eq!(handle.switches(), 2);
    }

    #[test]
    fn manual_clock_only_moves_when_advanced() {
        let clock = ManualClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now() - t0, Duration::from_millis(250));
    }
}
