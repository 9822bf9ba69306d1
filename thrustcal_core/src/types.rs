//! Shared value types for the sweep and estimation pipeline.

/// Full-scale raw command value of the device (14-bit RawCommand-style).
/// The working sweep range stays strictly below this ceiling.
pub const FULL_SCALE_COMMAND: i32 = 8192;

/// One recorded telemetry event, stamped with the setpoint in effect at
/// delivery time. Appended in arrival order; not mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    pub setpoint: i32,
    pub rpm: f32,
    pub current: f32,
}

/// A point on the (scaled or normalized) throttle→thrust curve.
/// Produced by pure transforms, never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub pwm: f64,
    pub thrust: f64,
}
