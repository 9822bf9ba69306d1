#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Thrust-curve calibration core (transport-agnostic).
//!
//! Drives an ESC through a repeated triangular command sweep, records
//! returned telemetry, and reduces the recording to a single quadratic
//! throttle→thrust coefficient (the `MOT_THST_EXPO`-style expo value).
//! All transport interactions go through `thrustcal_traits::CommandSink`
//! and `thrustcal_traits::TelemetrySource`.
//!
//! ## Architecture
//!
//! - **Sweep**: tick-driven triangular setpoint state machine (`sweep`)
//! - **Pump**: background thread bridging async telemetry into the tick
//!   loop (`pump`)
//! - **Estimation**: sample → thrust curve → working band → expo fit
//!   (`estimate`, `normalize`, `fit`, `pipeline`)
//! - **Runner**: paced run loop producing a `CalibrationReport` (`runner`)
//!
//! The command axis is integer setpoints in `[0, FULL_SCALE_COMMAND)`;
//! the estimation pipeline works in `f64` on dimensionless proxies, since
//! only the curve's shape survives normalization.

pub mod config;
pub mod conversions;
pub mod error;
pub mod estimate;
pub mod fit;
pub mod mocks;
pub mod normalize;
pub mod pipeline;
pub mod pump;
pub mod runner;
pub mod sweep;
pub mod types;

pub use config::{BandCfg, FitCfg, SweepCfg, Timeouts};
pub use error::{BuildError, EstimateError, PipelineError, Stage, SweepError};
pub use fit::FitResult;
pub use pipeline::reduce;
pub use runner::{CalibrationReport, RunParams, run, run_with_clock};
pub use sweep::{SweepController, SweepPhase, SweepStatus};
pub use types::{CurvePoint, FULL_SCALE_COMMAND, TelemetrySample};
