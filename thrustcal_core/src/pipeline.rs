//! Offline reduction of a recorded sweep into the expo coefficient.

use crate::config::{BandCfg, FitCfg};
use crate::error::{EstimateError, PipelineError, Stage};
use crate::estimate::thrust_curve;
use crate::fit::{FitResult, fit_expo};
use crate::normalize::normalize_band;
use crate::types::TelemetrySample;

/// Run the full estimation pipeline over a finished sample buffer:
/// thrust estimation, working-band normalization, expo fit. Errors carry
/// the stage that produced them so the operator knows whether to suspect
/// the telemetry, the band configuration, or the solver.
pub fn reduce(
    samples: &[TelemetrySample],
    band: &BandCfg,
    fit: &FitCfg,
) -> Result<FitResult, PipelineError> {
    let at = |stage: Stage| move |source: EstimateError| PipelineError { stage, source };

    tracing::debug!(samples = samples.len(), "reducing recorded sweep");
    let curve = thrust_curve(samples).map_err(at(Stage::Estimate))?;
    let banded = normalize_band(&curve, band).map_err(at(Stage::Normalize))?;
    tracing::debug!(
        estimated = curve.len(),
        in_band = banded.len(),
        "curve normalized"
    );
    let result = fit_expo(&banded, fit).map_err(at(Stage::Fit))?;
    tracing::info!(
        a = result.a,
        residual_rms = result.residual_rms,
        "expo coefficient fitted"
    );
    Ok(result)
}
