//! Per-cycle operator snapshots.

use serde::{Deserialize, Serialize};

/// Discrete driver intent read once per control cycle.
///
/// `secondary_axis` is the raw value of the secondary joystick's selector
/// axis; its sign picks between hatch (negative) and ball (positive) paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverIntent {
    pub score: bool,
    pub load: bool,
    pub has_loaded: bool,
    pub confirm_scored: bool,
    pub confirm_loaded: bool,
    pub secondary_axis: f64,
}

/// Translation vector plus rotation rate requested for the drivetrain.
///
/// All components are unitless fractions in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveCommand {
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

impl DriveCommand {
    pub fn new(x: f64, y: f64, rotation: f64) -> Self {
        Self { x, y, rotation }
    }

    /// A command that keeps every wheel still.
    pub fn stopped() -> Self {
        Self::default()
    }

    /// Scale the translation components, leaving rotation untouched.
    pub fn scale_translation(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            rotation: self.rotation,
        }
    }

    /// Magnitude of the translation vector.
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_translation_keeps_rotation() {
        let cmd = DriveCommand::new(0.8, -0.4, 0.5).scale_translation(0.5);
        assert!((cmd.x - 0.4).abs() < 1e-9);
        assert!((cmd.y + 0.2).abs() < 1e-9);
        assert!((cmd.rotation - 0.5).abs() < 1e-9);
    }

    #[test]
    fn magnitude_of_unit_diagonal() {
        let cmd = DriveCommand::new(0.6, 0.8, 0.0);
        assert!((cmd.magnitude() - 1.0).abs() < 1e-9);
    }
}
