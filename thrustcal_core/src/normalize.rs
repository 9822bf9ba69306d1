//! Working-band normalization of the estimated thrust curve.

use crate::config::BandCfg;
use crate::error::EstimateError;
use crate::types::CurvePoint;

/// Normalize the curve to `[0,1]×[0,1]` over the observed span and keep
/// only the configured working band of the throttle axis.
///
/// A single pass finds `pwm_min`, `pwm_max` and `thrust_max`; each point
/// is then mapped to `((pwm-pwm_min)/(pwm_max-pwm_min), thrust/thrust_max)`
/// and retained iff `spin_min <= pwm_n <= spin_max`. Order follows the
/// input; no resampling or interpolation happens, the fit runs directly
/// on the (possibly unevenly spaced) survivors.
pub fn normalize_band(
    points: &[CurvePoint],
    band: &BandCfg,
) -> Result<Vec<CurvePoint>, EstimateError> {
    if points.is_empty() {
        return Err(EstimateError::EmptyInput);
    }
    let mut pwm_min = f64::INFINITY;
    let mut pwm_max = f64::NEG_INFINITY;
    let mut thrust_max = f64::NEG_INFINITY;
    for p in points {
        pwm_min = pwm_min.min(p.pwm);
        pwm_max = pwm_max.max(p.pwm);
        thrust_max = thrust_max.max(p.thrust);
    }
    if pwm_max == pwm_min {
        return Err(EstimateError::DegenerateRange {
            axis: "pwm",
            value: pwm_max,
        });
    }
    if thrust_max <= 0.0 {
        // The prop never produced measurable thrust; there is no shape.
        return Err(EstimateError::DegenerateRange {
            axis: "thrust",
            value: thrust_max,
        });
    }
    let span = pwm_max - pwm_min;
    let kept = points
        .iter()
        .filter_map(|p| {
            let pwm_n = (p.pwm - pwm_min) / span;
            if pwm_n < band.spin_min || pwm_n > band.spin_max {
                return None;
            }
            Some(CurvePoint {
                pwm: pwm_n,
                thrust: p.thrust / thrust_max,
            })
        })
        .collect();
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pt(pwm: f64, thrust: f64) -> CurvePoint {
        CurvePoint { pwm, thrust }
    }

    #[test]
    fn endpoints_fall_outside_the_band() {
        let band = BandCfg {
            spin_min: 0.1,
            spin_max: 0.9,
        };
        let out =
            normalize_band(&[pt(0.0, 0.0), pt(0.5, 5.0), pt(1.0, 10.0)], &band).unwrap();
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0].pwm, 0.5, epsilon = 1e-12);
        assert_relative_eq!(out[0].thrust, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(
            normalize_band(&[], &BandCfg::default()).unwrap_err(),
            EstimateError::EmptyInput
        );
    }

    #[test]
    fn constant_pwm_is_a_degenerate_range() {
        let err = normalize_band(&[pt(0.4, 1.0), pt(0.4, 2.0)], &BandCfg::default()).unwrap_err();
        assert_eq!(
            err,
            EstimateError::DegenerateRange {
                axis: "pwm",
                value: 0.4
            }
        );
    }

    #[test]
    fn flat_zero_thrust_is_a_degenerate_range() {
        let err = normalize_band(&[pt(0.1, 0.0), pt(0.9, 0.0)], &BandCfg::default()).unwrap_err();
        assert!(matches!(
            err,
            EstimateError::DegenerateRange { axis: "thrust", .. }
        ));
    }

    #[test]
    fn order_is_preserved_and_points_never_fabricated() {
        // span is [0.2, 0.9]; with the default band [0.15, 0.95] the
        // endpoints normalize to 1.0 and 0.0 and are both discarded.
        let input = vec![pt(0.9, 9.0), pt(0.2, 2.0), pt(0.6, 6.0), pt(0.4, 4.0)];
        let out = normalize_band(&input, &BandCfg::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert_relative_eq!(out[0].pwm, 0.4 / 0.7, epsilon = 1e-12);
        assert_relative_eq!(out[0].thrust, 6.0 / 9.0, epsilon = 1e-12);
        assert_relative_eq!(out[1].pwm, 0.2 / 0.7, epsilon = 1e-12);
        assert_relative_eq!(out[1].thrust, 4.0 / 9.0, epsilon = 1e-12);
    }
}
