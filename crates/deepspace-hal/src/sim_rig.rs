//! [`SimRig`] – builder for a fully simulated [`RobotHardware`].
//!
//! Used by the CLI's simulation mode and by integration tests.  Each `with_*`
//! call adds one simulated port group; [`SimRig::build`] returns the hardware
//! bundle together with the [`SimHandles`] that observe it.
//!
//! # Example
//!
//! ```rust
//! use deepspace_hal::sim_rig::SimRig;
//!
//! let (hardware, handles) = SimRig::new()
//!     .with_leadscrew(4096.0 * 20.0, 800.0)
//!     .with_hatch()
//!     .build();
//!
//! assert!(hardware.leadscrew.is_some());
//! assert!(hardware.ball.is_none());
//! assert!(handles.hatch_linear.is_some());
//! ```

use std::sync::Arc;

use crate::camera::VisionCamera;
use crate::clock::{Clock, SystemClock};
use crate::hardware::{BallPorts, DrivePorts, HatchPorts, LeadscrewPorts, RobotHardware};
use crate::input::InputDevice;
use crate::sim::{
    ManualClock, SimCameraHandle, SimDriveHandle, SimGyroHandle, SimInputHandle, SimMotorHandle,
    SimSolenoidHandle, sim_camera, sim_drive_base, sim_gyro, sim_input, sim_motor, sim_solenoid,
};

/// Observation handles for every simulated port in a rig.
pub struct SimHandles {
    pub gamepad: SimInputHandle,
    pub joystick: Option<SimInputHandle>,
    pub leadscrew: Option<SimMotorHandle>,
    pub camera: Option<SimCameraHandle>,
    pub hatch_linear: Option<SimSolenoidHandle>,
    pub hatch_rotary: Option<SimSolenoidHandle>,
    pub ball_lock: Option<SimSolenoidHandle>,
    pub ball_rotary: Option<SimSolenoidHandle>,
    pub ball_retain: Option<SimSolenoidHandle>,
    pub drive: Option<SimDriveHandle>,
    pub gyro: Option<SimGyroHandle>,
    /// Present when the rig was built with [`SimRig::with_manual_clock`].
    pub clock: Option<ManualClock>,
}

/// Builder for a simulated robot.
#[derive(Default)]
pub struct SimRig {
    leadscrew: Option<(f64, f64)>,
    camera: bool,
    hatch: bool,
    ball: bool,
    drive: bool,
    joystick: bool,
    manual_clock: bool,
}

impl SimRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leadscrew axis of `travel_ticks` that moves `full_speed_ticks`
    /// per cycle at full output.
    pub fn with_leadscrew(mut self, travel_ticks: f64, full_speed_ticks: f64) -> Self {
        self.leadscrew = Some((travel_ticks, full_speed_ticks));
        self
    }

    /// Add the alignment camera.  Only used when a leadscrew is present.
    pub fn with_camera(mut self) -> Self {
        self.camera = true;
        self
    }

    pub fn with_hatch(mut self) -> Self {
        self.hatch = true;
        self
    }

    pub fn with_ball(mut self) -> Self {
        self.ball = true;
        self
    }

    pub fn with_drive(mut self) -> Self {
        self.drive = true;
        self
    }

    pub fn with_secondary_joystick(mut self) -> Self {
        self.joystick = true;
        self
    }

    /// Use a [`ManualClock`] instead of wall-clock time.
    pub fn with_manual_clock(mut self) -> Self {
        self.manual_clock = true;
        self
    }

    /// Every port group, wall-clock time.
    pub fn full(travel_ticks: f64, full_speed_ticks: f64) -> Self {
        Self::new()
            .with_leadscrew(travel_ticks, full_speed_ticks)
            .with_camera()
            .with_hatch()
            .with_ball()
            .with_drive()
            .with_secondary_joystick()
    }

    pub fn build(self) -> (RobotHardware, SimHandles) {
        let (gamepad, gamepad_handle) = sim_input();

        let (joystick, joystick_handle) = if self.joystick {
            let (device, handle) = sim_input();
            (Some(Box::new(device) as Box<dyn InputDevice>), Some(handle))
        } else {
            (None, None)
        };

        let mut camera_handle = None;
        let mut leadscrew_handle = None;
        let leadscrew = self.leadscrew.map(|(travel, speed)| {
            let (motor, encoder, handle) = sim_motor("leadscrew", travel, speed);
            leadscrew_handle = Some(handle);
            let camera = self.camera.then(|| {
                let (camera, handle) = sim_camera("hatch_camera");
                camera_handle = Some(handle);
                Box::new(camera) as Box<dyn VisionCamera>
            });
            LeadscrewPorts {
                motor: Box::new(motor),
                encoder: Box::new(encoder),
                camera,
            }
        });

        let mut hatch_handles = (None, None);
        let hatch = self.hatch.then(|| {
            let (linear, linear_handle) = sim_solenoid("hatch_linear");
            let (rotary, rotary_handle) = sim_solenoid("hatch_rotary");
            hatch_handles = (Some(linear_handle), Some(rotary_handle));
            HatchPorts {
                linear: Box::new(linear),
                rotary: Box::new(rotary),
            }
        });

        let mut ball_handles = (None, None, None);
        let ball = self.ball.then(|| {
            let (lock, lock_handle) = sim_solenoid("ball_lock");
            let (rotary, rotary_handle) = sim_solenoid("ball_rotary");
            let (retain, retain_handle) = sim_solenoid("ball_retain");
            ball_handles = (Some(lock_handle), Some(rotary_handle), Some(retain_handle));
            BallPorts {
                lock: Box::new(lock),
                rotary: Box::new(rotary),
                retain: Box::new(retain),
            }
        });

        let mut drive_handles = (None, None);
        let drive = self.drive.then(|| {
            let (base, base_handle) = sim_drive_base("swerve");
            let (gyro, gyro_handle) = sim_gyro("navx");
            drive_handles = (Some(base_handle), Some(gyro_handle));
            DrivePorts {
                base: Box::new(base),
                gyro: Box::new(gyro),
            }
        });

        let manual_clock = self.manual_clock.then(ManualClock::new);
        let clock: Arc<dyn Clock> = match &manual_clock {
            Some(c) => Arc::new(c.clone()),
            None => Arc::new(SystemClock),
        };

        let hardware = RobotHardware {
            gamepad: Box::new(gamepad),
            joystick,
            leadscrew,
            hatch,
            ball,
            drive,
            clock,
        };
        let handles = SimHandles {
            gamepad: gamepad_handle,
            joystick: joystick_handle,
            leadscrew: leadscrew_handle,
            camera: camera_handle,
            hatch_linear: hatch_handles.0,
            hatch_rotary: hatch_handles.1,
            ball_lock: ball_handles.0,
            ball_rotary: ball_handles.1,
            ball_retain: ball_handles.2,
            drive: drive_handles.0,
            gyro: drive_handles.1,
            clock: manual_clock,
        };
        (hardware, handles)
    }
}
