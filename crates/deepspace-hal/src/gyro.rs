//! Robot heading sensor.

/// A yaw gyroscope.
pub trait Gyro: Send {
    fn id(&self) -> &str;

    /// Field-relative heading in degrees, wrapped to `(-180, 180]`.
    fn heading_degrees(&self) -> f64;
}
