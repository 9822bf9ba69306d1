use thiserror::Error;

/// Errors raised by the sweep controller and run loop.
#[derive(Debug, Error, Clone)]
pub enum SweepError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("telemetry stalled for {stalled_ms} ms")]
    TelemetryStall { stalled_ms: u64 },
}

/// Errors raised by the estimation pipeline stages.
///
/// Every variant is terminal for the run: no `FitResult` is ever produced
/// alongside one of these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EstimateError {
    /// Negative thrust radicand; telemetry violated the non-negativity
    /// invariant. Carries the offending sample for diagnostics.
    #[error(
        "negative thrust radicand at sample {index}: setpoint {setpoint}, rpm {rpm}, current {current}"
    )]
    Domain {
        index: usize,
        setpoint: i32,
        rpm: f32,
        current: f32,
    },
    #[error("no samples to estimate from")]
    EmptyInput,
    #[error("degenerate {axis} range: all values equal {value}")]
    DegenerateRange { axis: &'static str, value: f64 },
    #[error("need at least {need} points in the working band, got {got}")]
    InsufficientData { got: usize, need: usize },
    /// Solver ran out of its iteration budget. Carries the last iterate,
    /// never silently substituted for the result.
    #[error("fit did not converge after {iterations} iterations (last a = {last_a})")]
    NoConvergence { last_a: f64, iterations: usize },
}

/// Pipeline stage names for error attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Estimate,
    Normalize,
    Fit,
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Stage::Estimate => "thrust estimation",
            Stage::Normalize => "range normalization",
            Stage::Fit => "curve fit",
        };
        f.write_str(name)
    }
}

/// An `EstimateError` tagged with the stage it occurred in.
#[derive(Debug, Error, Clone)]
#[error("{stage} failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: EstimateError,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
