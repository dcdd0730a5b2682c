//! Vision target tracker.

use deepspace_types::MechError;

/// A camera running on-board target tracking.
pub trait VisionCamera: Send {
    fn id(&self) -> &str;

    /// Signed horizontal angle from the camera axis to the tracked target, in
    /// degrees.  Positive means the target is to the right.
    fn horizontal_angle_to_target(&self) -> f64;

    /// Whether a target is currently tracked.
    fn has_target(&self) -> bool;

    /// Select the processing pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`MechError::HardwareFault`] if the camera rejects the index.
    fn set_pipeline(&mut self, index: u8) -> Result<(), MechError>;
}
