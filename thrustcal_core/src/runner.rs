//! Calibration run orchestration.
//!
//! Wires a sweep controller, a telemetry pump and the estimation pipeline
//! into one blocking run: tick the sweep on a fixed cadence, feed it the
//! drained telemetry, and reduce the recorded buffer once the sweep is
//! done. The caller supplies the abort flag (wired to Ctrl-C upstream).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::{WrapErr, eyre};
use thrustcal_traits::{Clock, CommandSink, MonotonicClock, TelemetrySource};

use crate::config::{BandCfg, FitCfg, SweepCfg, Timeouts};
use crate::error::{Result, SweepError};
use crate::fit::FitResult;
use crate::pipeline::reduce;
use crate::pump::TelemetryPump;
use crate::sweep::{SweepController, SweepStatus};
use crate::types::TelemetrySample;

// Broadcast failures tolerated before the run is abandoned. A couple of
// dropped frames are survivable; a dead bus is not.
const MAX_CONSECUTIVE_SEND_FAILURES: u32 = 20;
// Consecutive failures after which the sweep is asked to ramp down.
const SEND_FAILURES_BEFORE_STOP: u32 = 3;

/// Everything a calibration run needs to know.
#[derive(Debug, Clone, Default)]
pub struct RunParams {
    pub sweep: SweepCfg,
    pub band: BandCfg,
    pub fit: FitCfg,
    pub timeouts: Timeouts,
    /// Hard ceiling on run duration; the sweep is ramped down once it is
    /// reached. `None` runs until the sweep finishes on its own.
    pub max_run_ms: Option<u64>,
}

/// Outcome of a completed calibration run.
#[derive(Debug, Clone)]
pub struct CalibrationReport {
    pub fit: FitResult,
    pub samples: Vec<TelemetrySample>,
    pub duration_ms: u64,
}

/// Run a calibration sweep to completion and reduce it. Blocks the
/// calling thread for the duration of the run.
pub fn run<K, S>(
    params: RunParams,
    sink: K,
    source: S,
    stop: Arc<AtomicBool>,
) -> Result<CalibrationReport>
where
    K: CommandSink,
    S: TelemetrySource + Send + 'static,
{
    run_with_clock(params, sink, source, stop, &MonotonicClock)
}

/// As [`run`], with an injectable clock for tests.
pub fn run_with_clock<K, S, C>(
    params: RunParams,
    sink: K,
    source: S,
    stop: Arc<AtomicBool>,
    clock: &C,
) -> Result<CalibrationReport>
where
    K: CommandSink,
    S: TelemetrySource + Send + 'static,
    C: Clock,
{
    let tick = Duration::from_millis(params.sweep.tick_ms);
    let telemetry_timeout = Duration::from_millis(params.timeouts.telemetry_ms);
    let stall_warn_ms = (4 * params.timeouts.telemetry_ms).max(2 * params.sweep.tick_ms);
    let stall_abort_ms = 10 * stall_warn_ms;

    let mut controller = SweepController::new(params.sweep.clone(), sink)
        .wrap_err("building the sweep controller")?;
    let pump = TelemetryPump::spawn(source, telemetry_timeout);

    let started = clock.now();
    let mut stop_requested = false;
    let mut send_failures: u32 = 0;
    let mut stall_warned = false;

    tracing::info!(
        esc_index = params.sweep.esc_index,
        upper = params.sweep.upper,
        lower = params.sweep.lower,
        "calibration run starting"
    );

    loop {
        let elapsed_ms = clock.ms_since(started);

        if !stop_requested && stop.load(Ordering::Relaxed) {
            tracing::warn!("abort requested; ramping the sweep down");
            controller.request_stop();
            stop_requested = true;
        }
        if !stop_requested
            && let Some(limit) = params.max_run_ms
            && elapsed_ms >= limit
        {
            tracing::warn!(limit_ms = limit, "run duration ceiling hit");
            controller.request_stop();
            stop_requested = true;
        }

        for ev in pump.drain() {
            controller.on_telemetry(ev);
        }

        let stalled = pump.stalled_for();
        if stalled > stall_abort_ms {
            return Err(SweepError::TelemetryStall { stalled_ms: stalled })
                .wrap_err("telemetry link is dead; aborting the run");
        }
        if stalled > stall_warn_ms {
            if !stall_warned {
                tracing::warn!(stalled_ms = stalled, "telemetry has stalled");
                stall_warned = true;
            }
        } else {
            stall_warned = false;
        }

        match controller.tick() {
            Ok(SweepStatus::Done) => break,
            Ok(SweepStatus::Running) => send_failures = 0,
            Err(e) => {
                send_failures += 1;
                tracing::warn!(
                    consecutive = send_failures,
                    error = %e,
                    "command broadcast failed"
                );
                if send_failures >= MAX_CONSECUTIVE_SEND_FAILURES {
                    return Err(e.wrap_err("command bus is not recovering"));
                }
                if send_failures == SEND_FAILURES_BEFORE_STOP && !stop_requested {
                    controller.request_stop();
                    stop_requested = true;
                }
            }
        }

        clock.sleep(tick);
    }

    // The sweep has parked the output at zero; anything still in flight
    // is plateau telemetry and carries no curve information.
    drop(pump);

    let duration_ms = clock.ms_since(started);
    let samples = controller.into_samples();
    tracing::info!(
        samples = samples.len(),
        duration_ms,
        "sweep finished; reducing"
    );

    if samples.is_empty() && stop_requested {
        return Err(eyre!("run aborted before any telemetry was recorded"));
    }

    let fit = reduce(&samples, &params.band, &params.fit)
        .wrap_err("reducing the recorded sweep")?;

    Ok(CalibrationReport {
        fit,
        samples,
        duration_ms,
    })
}
