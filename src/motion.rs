//! Motion samples and the trigger threshold.
//!
//! A [`MotionSample`] is one 3-axis accelerometer reading in units of g.
//! Samples are transient: the controller evaluates each one against the
//! threshold and drops it before the next arrives.

/// Magnitude (in g) a sample must strictly exceed to count as a trigger.
/// Gravity is not removed, so a device at rest reads ~1.0.
pub const MOTION_THRESHOLD_G: f32 = 1.2;

/// Fixed sampling cadence while a session is armed (5 Hz).
pub const SAMPLE_INTERVAL_MS: u32 = 200;

/// One accelerometer reading, in g per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct MotionSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl MotionSample {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the reading.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Strict comparison: a magnitude equal to `threshold` does not trigger.
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.magnitude() > threshold
    }
}
