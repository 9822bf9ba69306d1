//! Runtime configuration structs for the calibration engine.
//!
//! These are the structs the core consumes; they are separate from the
//! TOML-deserialized schema in `thrustcal_config` (see `conversions`).

/// Sweep waveform and addressing configuration.
#[derive(Debug, Clone)]
pub struct SweepCfg {
    /// Index of the monitored ESC inside the command frame.
    pub esc_index: usize,
    /// Width of the command frame (number of outputs on the bus).
    pub esc_count: usize,
    /// Setpoint change per tick.
    pub step: i32,
    /// Upper turn-around bound for the triangular wave.
    pub upper: i32,
    /// Lower turn-around bound for the triangular wave.
    pub lower: i32,
    /// Ticks spent holding zero before the sweep starts (ESC arm/settle).
    pub warmup_ticks: u32,
    /// Tick period of the run loop in milliseconds.
    pub tick_ms: u64,
}

impl Default for SweepCfg {
    fn default() -> Self {
        Self {
            esc_index: 0,
            esc_count: 4,
            step: 20,
            upper: 8100,
            lower: 100,
            warmup_ticks: 20,
            tick_ms: 50,
        }
    }
}

/// Working band of the normalized throttle axis, as fractions of the
/// observed span. Points outside `[spin_min, spin_max]` are discarded:
/// below sits the dead band where friction nonlinearities dominate, above
/// the saturation region.
#[derive(Debug, Clone, Copy)]
pub struct BandCfg {
    pub spin_min: f64,
    pub spin_max: f64,
}

impl Default for BandCfg {
    fn default() -> Self {
        Self {
            spin_min: 0.15,
            spin_max: 0.95,
        }
    }
}

/// Nonlinear least-squares solver knobs for the expo fit.
#[derive(Debug, Clone, Copy)]
pub struct FitCfg {
    /// Initial guess for the expo coefficient.
    pub initial_a: f64,
    /// Iteration budget; exceeding it is a `NoConvergence` error.
    pub max_iterations: usize,
    /// Convergence threshold on the parameter step.
    pub tolerance: f64,
    /// Initial Levenberg-Marquardt damping; 0 disables damping and uses
    /// pure Gauss-Newton steps.
    pub initial_lambda: f64,
}

impl Default for FitCfg {
    fn default() -> Self {
        Self {
            initial_a: 0.5,
            max_iterations: 25,
            tolerance: 1e-10,
            initial_lambda: 1e-3,
        }
    }
}

/// Timeouts and watchdogs.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Max wait per telemetry receive (ms).
    pub telemetry_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { telemetry_ms: 150 }
    }
}
