//! Least-squares fit of the expo coefficient.
//!
//! Damped Gauss-Newton (Levenberg-Marquardt) on the single-parameter
//! model [`expo_model`]. The model is linear in `a`, so an undamped step
//! lands on the optimum immediately; the damping loop still earns its
//! keep against pathological inputs (near-collinear points, bad initial
//! damping) and keeps the solver shape ready for richer models.

use crate::config::FitCfg;
use crate::error::EstimateError;
use crate::types::CurvePoint;

/// The normalized throttle→thrust model: a blend of the identity and a
/// pure quadratic. `a = 0` is a linear response, `a = 1` fully quadratic;
/// both endpoints pin `m(0) = 0` and `m(1) = 1`.
pub fn expo_model(pwm: f64, a: f64) -> f64 {
    (1.0 - a) * pwm + a * pwm * pwm
}

/// Outcome of a converged fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    /// The expo coefficient.
    pub a: f64,
    /// Estimated variance of `a` (residual-scaled inverse curvature).
    pub variance_a: f64,
    /// Iterations spent, including rejected steps.
    pub iterations: usize,
    /// Root-mean-square residual at the solution.
    pub residual_rms: f64,
}

fn sum_squared_residuals(points: &[CurvePoint], a: f64) -> f64 {
    points
        .iter()
        .map(|p| {
            let r = p.thrust - expo_model(p.pwm, a);
            r * r
        })
        .sum()
}

/// Fit the expo coefficient to a normalized curve.
///
/// At least two points are required (one parameter plus one degree of
/// freedom for the variance estimate). Iterates damped Gauss-Newton
/// steps until the parameter step drops below the configured tolerance;
/// exhausting the iteration budget is an error carrying the last
/// estimate for diagnostics.
pub fn fit_expo(points: &[CurvePoint], cfg: &FitCfg) -> Result<FitResult, EstimateError> {
    if points.len() < 2 {
        return Err(EstimateError::InsufficientData {
            got: points.len(),
            need: 2,
        });
    }

    let mut a = cfg.initial_a;
    let mut lambda = cfg.initial_lambda;
    let mut sse = sum_squared_residuals(points, a);

    for iteration in 1..=cfg.max_iterations {
        // Normal equations for the scalar parameter: curvature H = Σ j²
        // and gradient-of-residuals g = Σ j·r with j = dm/da = pwm² - pwm.
        let mut h = 0.0;
        let mut g = 0.0;
        for p in points {
            let j = p.pwm * p.pwm - p.pwm;
            let r = p.thrust - expo_model(p.pwm, a);
            h += j * j;
            g += j * r;
        }
        if h <= f64::EPSILON {
            // All points at pwm 0 or 1; the parameter is unobservable.
            return Err(EstimateError::NoConvergence {
                last_a: a,
                iterations: iteration,
            });
        }

        let step = g / (h + lambda);
        let candidate = a + step;
        let candidate_sse = sum_squared_residuals(points, candidate);

        if candidate_sse <= sse {
            a = candidate;
            sse = candidate_sse;
            lambda /= 10.0;
            tracing::debug!(iteration, a, sse, "fit step accepted");
            if step.abs() < cfg.tolerance {
                let n = points.len() as f64;
                let dof = n - 1.0;
                let variance_a = (sse / dof) / h;
                let residual_rms = (sse / n).sqrt();
                tracing::info!(a, residual_rms, iterations = iteration, "fit converged");
                return Ok(FitResult {
                    a,
                    variance_a,
                    iterations: iteration,
                    residual_rms,
                });
            }
        } else {
            lambda = (lambda * 10.0).max(1e-12);
            tracing::debug!(iteration, lambda, "fit step rejected; damping raised");
        }
    }

    Err(EstimateError::NoConvergence {
        last_a: a,
        iterations: cfg.max_iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn synthetic_curve(a: f64, n: usize) -> Vec<CurvePoint> {
        (0..n)
            .map(|i| {
                let pwm = 0.15 + 0.8 * (i as f64) / ((n - 1) as f64);
                CurvePoint {
                    pwm,
                    thrust: expo_model(pwm, a),
                }
            })
            .collect()
    }

    #[test]
    fn model_endpoints_are_pinned() {
        for a in [0.0, 0.3, 1.0] {
            assert_relative_eq!(expo_model(0.0, a), 0.0);
            assert_relative_eq!(expo_model(1.0, a), 1.0);
        }
        assert_relative_eq!(expo_model(0.5, 0.0), 0.5);
        assert_relative_eq!(expo_model(0.5, 1.0), 0.25);
    }

    #[test]
    fn recovers_exact_coefficient_from_clean_data() {
        let points = synthetic_curve(0.8, 50);
        let fit = fit_expo(&points, &FitCfg::default()).unwrap();
        assert_relative_eq!(fit.a, 0.8, epsilon = 1e-6);
        assert!(fit.residual_rms < 1e-8);
        assert!(fit.variance_a < 1e-12);
        assert!(fit.iterations <= FitCfg::default().max_iterations);
    }

    #[test]
    fn recovers_linear_response() {
        let points = synthetic_curve(0.0, 20);
        let fit = fit_expo(&points, &FitCfg::default()).unwrap();
        assert_relative_eq!(fit.a, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn noisy_data_still_converges_near_truth() {
        // Deterministic pseudo-noise, alternating sign.
        let mut points = synthetic_curve(0.6, 60);
        for (i, p) in points.iter_mut().enumerate() {
            let noise = if i % 2 == 0 { 0.005 } else { -0.005 };
            p.thrust += noise;
        }
        let fit = fit_expo(&points, &FitCfg::default()).unwrap();
        assert_relative_eq!(fit.a, 0.6, epsilon = 0.05);
        assert!(fit.variance_a > 0.0);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let one = synthetic_curve(0.5, 2);
        assert_eq!(
            fit_expo(&one[..1], &FitCfg::default()).unwrap_err(),
            EstimateError::InsufficientData { got: 1, need: 2 }
        );
        assert_eq!(
            fit_expo(&[], &FitCfg::default()).unwrap_err(),
            EstimateError::InsufficientData { got: 0, need: 2 }
        );
    }

    #[test]
    fn unobservable_parameter_reports_no_convergence() {
        let points = vec![
            CurvePoint {
                pwm: 0.0,
                thrust: 0.0,
            },
            CurvePoint {
                pwm: 1.0,
                thrust: 1.0,
            },
        ];
        let err = fit_expo(&points, &FitCfg::default()).unwrap_err();
        assert!(matches!(err, EstimateError::NoConvergence { .. }));
    }

    #[test]
    fn iteration_budget_is_honored() {
        let cfg = FitCfg {
            max_iterations: 1,
            tolerance: 1e-16,
            initial_lambda: 1e6,
            ..FitCfg::default()
        };
        let points = synthetic_curve(0.9, 10);
        let err = fit_expo(&points, &cfg).unwrap_err();
        match err {
            EstimateError::NoConvergence { iterations, .. } => assert_eq!(iterations, 1),
            other => panic!("expected NoConvergence, got {other:?}"),
        }
    }
}
