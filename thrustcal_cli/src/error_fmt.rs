//! Human-readable error descriptions and structured JSON error formatting.

use thrustcal_core::error::{EstimateError, PipelineError, Stage, SweepError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(pe) = err.downcast_ref::<PipelineError>() {
        return match &pe.source {
            EstimateError::Domain { index, setpoint, rpm, current } => format!(
                "What happened: Telemetry sample {index} (setpoint {setpoint}) carried rpm {rpm} and current {current}, whose product is negative.\nLikely causes: Sensor sign glitch, miswired current sensor, or corrupted frames.\nHow to fix: Check the telemetry wiring and sensor polarity, then rerun."
            ),
            EstimateError::EmptyInput => {
                "What happened: The sweep recorded no telemetry samples.\nLikely causes: Telemetry link down, wrong ESC index, or the run was aborted during warm-up.\nHow to fix: Verify the link and sweep.esc_index, then rerun.".to_string()
            }
            EstimateError::DegenerateRange { axis, value } => format!(
                "What happened: All recorded {axis} values are {value}; the curve has no span to normalize.\nLikely causes: Setpoint never varied (sweep aborted immediately) or the motor never spun up.\nHow to fix: Check that the ESC is armed and powered, and that the sweep bounds are sane."
            ),
            EstimateError::InsufficientData { got, need } => format!(
                "What happened: Only {got} points survived the working band; the fit needs at least {need}.\nLikely causes: Band too narrow (band.spin_min/spin_max) or a very short run.\nHow to fix: Widen the band or let the sweep run longer."
            ),
            EstimateError::NoConvergence { last_a, iterations } => format!(
                "What happened: The curve fit did not converge after {iterations} iterations (last estimate {last_a:.4}).\nLikely causes: Very noisy telemetry or a response that is not expo-shaped.\nHow to fix: Inspect the recorded samples, raise fit.max_iterations, or loosen fit.tolerance."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<SweepError>() {
        return match se {
            SweepError::Transport(msg) => format!(
                "What happened: Broadcasting the command frame failed ({msg}).\nLikely causes: Bus disconnected, permissions, or the link process died.\nHow to fix: Check the link and its permissions, then rerun."
            ),
            SweepError::TelemetryStall { stalled_ms } => format!(
                "What happened: No telemetry arrived for {stalled_ms} ms.\nLikely causes: Telemetry link down or the ESC lost power mid-run.\nHow to fix: Check the telemetry wiring and power, and timeouts.telemetry_ms in the config."
            ),
        };
    }

    // String-based heuristics for errors coming from init or config.
    // Alternate formatting includes every cause in the chain, not just
    // the outermost context.
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("invalid config") || lower.contains("must be") {
        return "What happened: Configuration is invalid or incomplete.\nLikely causes: Out-of-range values under [sweep], [band], [fit] or [timeouts].\nHow to fix: Edit the TOML config and try again.".to_string();
    }

    if lower.contains("aborted before any telemetry") {
        return "What happened: The run was aborted before any telemetry was recorded.\nLikely causes: Ctrl-C during warm-up or a max_run_ms ceiling shorter than the warm-up.\nHow to fix: Let the run pass warm-up, or raise safety.max_run_ms.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map typed errors (if present) to stable exit codes; other errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(pe) = err.downcast_ref::<PipelineError>() {
        return match pe.stage {
            Stage::Estimate => 3,
            Stage::Normalize => 4,
            Stage::Fit => 5,
        };
    }
    if err.downcast_ref::<SweepError>().is_some() {
        return 6;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(pe) = err.downcast_ref::<PipelineError>() {
        return match &pe.source {
            EstimateError::Domain { .. } => "Domain",
            EstimateError::EmptyInput => "EmptyInput",
            EstimateError::DegenerateRange { .. } => "DegenerateRange",
            EstimateError::InsufficientData { .. } => "InsufficientData",
            EstimateError::NoConvergence { .. } => "NoConvergence",
        };
    }
    if let Some(se) = err.downcast_ref::<SweepError>() {
        return match se {
            SweepError::Transport(_) => "Transport",
            SweepError::TelemetryStall { .. } => "TelemetryStall",
        };
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = reason_name(err);
    let msg = humanize(err);

    let details = match err.downcast_ref::<PipelineError>().map(|pe| &pe.source) {
        Some(EstimateError::Domain { index, setpoint, rpm, current }) => Some(json!({
            "index": index, "setpoint": setpoint, "rpm": rpm, "current": current
        })),
        Some(EstimateError::InsufficientData { got, need }) => {
            Some(json!({ "got": got, "need": need }))
        }
        Some(EstimateError::NoConvergence { last_a, iterations }) => {
            Some(json!({ "last_a": last_a, "iterations": iterations }))
        }
        Some(EstimateError::DegenerateRange { axis, value }) => {
            Some(json!({ "axis": axis, "value": value }))
        }
        _ => None,
    };

    let obj = if let Some(d) = details {
        json!({ "reason": reason, "details": d, "message": msg })
    } else {
        json!({ "reason": reason, "message": msg })
    };
    obj.to_string()
}
