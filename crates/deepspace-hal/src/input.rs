//! Human input devices.
//!
//! Buttons are read as levels ([`InputDevice::button`]) or as edges
//! ([`InputDevice::button_pressed`] / [`InputDevice::button_released`]).  An
//! edge is reported once: reading it consumes it, the same way driver-station
//! joysticks latch edges between reads.

/// A gamepad or joystick as seen by the robot.  Button indices are 1-based.
pub trait InputDevice: Send {
    /// Level: whether the button is held right now.
    fn button(&self, index: usize) -> bool;

    /// Edge: whether the button went down since the last call.
    fn button_pressed(&mut self, index: usize) -> bool;

    /// Edge: whether the button came up since the last call.
    fn button_released(&mut self, index: usize) -> bool;

    /// Raw axis value in `[-1, 1]`; unknown axes read as `0.0`.
    fn axis(&self, index: usize) -> f64;
}

impl<T: InputDevice + ?Sized> InputDevice for Box<T> {
    fn button(&self, index: usize) -> bool {
        (**self).button(index)
    }

    fn button_pressed(&mut self, index: usize) -> bool {
        (**self).button_pressed(index)
    }

    fn button_released(&mut self, index: usize) -> bool {
        (**self).button_released(index)
    }

    fn axis(&self, index: usize) -> f64 {
        (**self).axis(index)
    }
}

/// Axis indices of a standard joystick.
pub mod axis {
    pub const X: usize = 0;
    pub const Y: usize = 1;
    pub const Z: usize = 2;
}

/// A joystick whose eleven raw buttons are multiplexed across
/// [`ProfiledJoystick::PROFILES`] logical banks.
///
/// Raw button 1 (the trigger) is reserved: releasing it cycles the active
/// profile.  Logical button `b` maps to raw button `b - 10 * profile`; any
/// logical button that lands outside raw `2..=11` in the active profile reads
/// as not pressed.  Axes are only live for the active profile.
pub struct ProfiledJoystick<D> {
    device: D,
    profile: usize,
}

impl<D: InputDevice> ProfiledJoystick<D> {
    pub const PROFILES: usize = 3;
    const PROFILE_BUTTON: usize = 1;
    const RAW_BUTTONS: usize = 11;
    const BANK_STRIDE: usize = 10;

    pub fn new(device: D) -> Self {
        Self { device, profile: 0 }
    }

    /// Currently selected profile, `0..PROFILES`.
    pub fn profile(&self) -> usize {
        self.profile
    }

    /// Advance to the next profile when the trigger has just been released.
    /// Call once per control cycle, before reading any logical button.
    pub fn update_profile(&mut self) {
        if self.device.button_released(Self::PROFILE_BUTTON) {
            self.profile = (self.profile + 1) % Self::PROFILES;
            tracing::debug!(profile = self.profile, "joystick profile changed");
        }
    }

    fn raw_button(&self, logical: usize) -> Option<usize> {
        let offset = self.profile * Self::BANK_STRIDE;
        let raw = logical.checked_sub(offset)?;
        (raw > Self::PROFILE_BUTTON && raw <= Self::RAW_BUTTONS).then_some(raw)
    }

    pub fn button(&self, logical: usize) -> bool {
        self.raw_button(logical)
            .is_some_and(|raw| self.device.button(raw))
    }

    pub fn button_pressed(&mut self, logical: usize) -> bool {
        match self.raw_button(logical) {
            Some(raw) => self.device.button_pressed(raw),
            None => false,
        }
    }

    pub fn button_released(&mut self, logical: usize) -> bool {
        match self.raw_button(logical) {
            Some(raw) => self.device.button_released(raw),
            None => false,
        }
    }

    fn profiled_axis(&self, profile: usize, index: usize) -> f64 {
        if profile == self.profile {
            self.device.axis(index)
        } else {
            0.0
        }
    }

    pub fn x(&self, profile: usize) -> f64 {
        self.profiled_axis(profile, axis::X)
    }

    pub fn y(&self, profile: usize) -> f64 {
        self.profiled_axis(profile, axis::Y)
    }

    pub fn z(&self, profile: usize) -> f64 {
        self.profiled_axis(profile, axis::Z)
    }

    /// Borrow the underlying device.
    pub fn device(&self) -> &D {
        &self.device
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::sim_input;

    #[test]
    fn trigger_release_cycles_profiles() {
        let (device, handle) = sim_input();
        let mut stick = ProfiledJoystick::new(device);
        assert_eq!(stick.profile(), 0);

        for expected in [1, 2, 0] {
            handle.press(1);
            handle.release(1);
            stick.update_profile();
            assert_eq!(stick.profile(), expected);
        }

        // No new edge: profile stays put.
        stick.update_profile();
        assert_eq!(stick.profile(), 0);
    }

    #[test]
    fn logical_buttons_map_into_active_bank() {
        let (device, handle) = sim_input();
        let mut stick = ProfiledJoystick::new(device);
        handle.press(4);

        // Profile 0: logical 4 is raw 4.
        assert!(stick.button(4));
        // Logical 14 belongs to profile 1.
        assert!(!stick.button(14));

        handle.press(1);
        handle.release(1);
        stick.update_profile();
        // Profile 1: logical 14 is raw 4, logical 4 is out of bank.
        assert!(stick.button(14));
        assert!(!stick.button(4));
    }

    #[test]
    fn trigger_is_never_a_logical_button() {
        let (device, handle) = sim_input();
        let stick = ProfiledJoystick::new(device);
        handle.press(1);
        assert!(!stick.button(1));
        assert!(!stick.button(0));
        assert!(!stick.button(12));
    }

    #[test]
    fn edges_pass_through_and_are_consumed() {
        let (device, handle) = sim_input();
        let mut stick = ProfiledJoystick::new(device);
        handle.press(3);
        assert!(stick.button_pressed(3));
        assert!(!stick.button_pressed(3));
        handle.release(3);
        assert!(stick.button_released(3));
        assert!(!stick.button_released(3));
    }

    #[test]
    fn axes_only_live_in_active_profile() {
        let (device, handle) = sim_input();
        let stick = ProfiledJoystick::new(device);
        handle.set_axis(axis::X, 0.6);
        handle.set_axis(axis::Z, -0.3);
        assert!((stick.x(0) - 0.6).abs() < 1e-9);
        assert_eq!(stick.x(1), 0.0);
        assert!((stick.z(0) + 0.3).abs() < 1e-9);
        assert_eq!(stick.y(2), 0.0);
    }
}
