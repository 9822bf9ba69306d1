//! Thrust estimation from raw telemetry samples.
//!
//! Momentum-disk theory relates propeller thrust S and mechanical power P
//! as `S^3 ∝ P^2` (fixed air density and disk diameter), and motor torque
//! is approximately proportional to current, so `P = M·ω ∝ I·ω`. Hence
//!
//! ```text
//! S ∝ (I·ω)^(2/3)
//! ```
//!
//! The proportionality constant never matters: only the curve's shape
//! survives normalization, which is also why rpm and current may stay in
//! uncalibrated proxy units.

use crate::error::EstimateError;
use crate::types::{CurvePoint, FULL_SCALE_COMMAND, TelemetrySample};

/// Map recorded samples to `(scaled_setpoint, thrust_estimate)` points.
///
/// Output has the same length and order as the input; no filtering or
/// reordering happens here. The setpoint is scaled by the device full
/// scale, not by the observed span, so the x axis is comparable across
/// runs. A negative radicand means corrupt telemetry and fails loudly
/// instead of producing a NaN that would poison the fit.
pub fn thrust_curve(samples: &[TelemetrySample]) -> Result<Vec<CurvePoint>, EstimateError> {
    let mut out = Vec::with_capacity(samples.len());
    for (index, s) in samples.iter().enumerate() {
        let radicand = f64::from(s.current) * f64::from(s.rpm);
        if radicand < 0.0 {
            return Err(EstimateError::Domain {
                index,
                setpoint: s.setpoint,
                rpm: s.rpm,
                current: s.current,
            });
        }
        out.push(CurvePoint {
            pwm: f64::from(s.setpoint) / f64::from(FULL_SCALE_COMMAND),
            thrust: radicand.powf(2.0 / 3.0),
        });
    }
    Ok(out)
}
