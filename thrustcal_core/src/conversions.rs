//! `From` implementations bridging `thrustcal_config` types to
//! `thrustcal_core` types.
//!
//! These eliminate the manual field-by-field mapping previously scattered in the CLI.

use crate::config::{BandCfg, FitCfg, SweepCfg, Timeouts};

// ── SweepCfg ─────────────────────────────────────────────────────────────────

impl From<&thrustcal_config::SweepCfg> for SweepCfg {
    fn from(c: &thrustcal_config::SweepCfg) -> Self {
        Self {
            esc_index: c.esc_index,
            esc_count: c.esc_count,
            step: c.step,
            upper: c.upper,
            lower: c.lower,
            warmup_ticks: c.warmup_ticks,
            tick_ms: c.tick_ms,
        }
    }
}

// ── BandCfg ──────────────────────────────────────────────────────────────────

impl From<&thrustcal_config::BandCfg> for BandCfg {
    fn from(c: &thrustcal_config::BandCfg) -> Self {
        Self {
            spin_min: c.spin_min,
            spin_max: c.spin_max,
        }
    }
}

// ── FitCfg ───────────────────────────────────────────────────────────────────

impl From<&thrustcal_config::FitCfg> for FitCfg {
    fn from(c: &thrustcal_config::FitCfg) -> Self {
        Self {
            initial_a: c.initial_a,
            max_iterations: c.max_iterations,
            tolerance: c.tolerance,
            initial_lambda: c.initial_lambda,
        }
    }
}

// ── Timeouts ─────────────────────────────────────────────────────────────────

impl From<&thrustcal_config::Timeouts> for Timeouts {
    fn from(c: &thrustcal_config::Timeouts) -> Self {
        Self {
            telemetry_ms: c.telemetry_ms,
        }
    }
}
