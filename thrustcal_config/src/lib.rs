#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the thrust calibration tool.
//!
//! `Config` and sub-structs are deserialized from TOML and validated
//! before anything touches the bus.

use serde::Deserialize;

/// Sweep waveform and ESC addressing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SweepCfg {
    /// Index of the ESC under test inside the command frame
    pub esc_index: usize,
    /// Number of outputs in the command frame
    pub esc_count: usize,
    /// Setpoint change per tick (raw command units)
    pub step: i32,
    /// Upper turn-around bound of the triangular wave
    pub upper: i32,
    /// Lower turn-around bound of the triangular wave
    pub lower: i32,
    /// Zero-hold ticks before the sweep starts (ESC arm/settle)
    pub warmup_ticks: u32,
    /// Tick period of the run loop (ms)
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
/// observed span.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
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

/// Solver knobs for the expo fit.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct FitCfg {
    /// Initial guess for the expo coefficient
    pub initial_a: f64,
    /// Iteration budget
    pub max_iterations: usize,
    /// Convergence threshold on the parameter step
    pub tolerance: f64,
    /// Initial Levenberg-Marquardt damping
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Max wait per telemetry receive (ms). Also accepts alias "sensor_ms".
    #[serde(alias = "sensor_ms")]
    pub telemetry_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Safety {
    /// Hard ceiling on run duration in ms (0 disables)
    pub max_run_ms: u64,
}

impl Default for Safety {
    fn default() -> Self {
        Self { max_run_ms: 0 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Synthetic ESC; no hardware required.
    #[default]
    Sim,
}

/// ESC link selection and simulation parameters.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Link {
    pub mode: LinkMode,
    /// Expo coefficient of the simulated ESC response
    pub sim_expo: f64,
    /// Telemetry interval of the simulated ESC (ms)
    pub sim_telemetry_ms: u64,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            mode: LinkMode::Sim,
            sim_expo: 0.7,
            sim_telemetry_ms: 10,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sweep: SweepCfg,
    pub band: BandCfg,
    pub fit: FitCfg,
    pub timeouts: Timeouts,
    pub safety: Safety,
    pub logging: Logging,
    pub link: Link,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Default for Timeouts {
    fn default() -> Self {
        Self { telemetry_ms: 150 }
    }
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sweep
        if self.sweep.esc_count == 0 {
            eyre::bail!("sweep.esc_count must be >= 1");
        }
        if self.sweep.esc_index >= self.sweep.esc_count {
            eyre::bail!("sweep.esc_index must be < sweep.esc_count");
        }
        if self.sweep.step < 1 {
            eyre::bail!("sweep.step must be >= 1");
        }
        if self.sweep.lower < 0 {
            eyre::bail!("sweep.lower must be >= 0");
        }
        if self.sweep.upper <= self.sweep.lower {
            eyre::bail!("sweep.upper must be > sweep.lower");
        }
        if self.sweep.upper >= 8192 {
            eyre::bail!("sweep.upper must be below the 8192 full-scale command");
        }
        if self.sweep.step > self.sweep.upper - self.sweep.lower {
            eyre::bail!("sweep.step must not exceed the sweep span");
        }
        if self.sweep.warmup_ticks == 0 {
            eyre::bail!("sweep.warmup_ticks must be >= 1");
        }
        if self.sweep.tick_ms == 0 {
            eyre::bail!("sweep.tick_ms must be >= 1");
        }
        if self.sweep.tick_ms > 1000 {
            eyre::bail!("sweep.tick_ms is unreasonably large (>1s)");
        }

        // Band
        if !(0.0..1.0).contains(&self.band.spin_min) {
            eyre::bail!("band.spin_min must be in [0.0, 1.0)");
        }
        if !(0.0..=1.0).contains(&self.band.spin_max) {
            eyre::bail!("band.spin_max must be in [0.0, 1.0]");
        }
        if self.band.spin_max <= self.band.spin_min {
            eyre::bail!("band.spin_max must be > band.spin_min");
        }

        // Fit
        if !(0.0..=1.0).contains(&self.fit.initial_a) {
            eyre::bail!("fit.initial_a must be in [0.0, 1.0]");
        }
        if self.fit.max_iterations == 0 {
            eyre::bail!("fit.max_iterations must be >= 1");
        }
        if !(self.fit.tolerance > 0.0) {
            eyre::bail!("fit.tolerance must be > 0");
        }
        if self.fit.initial_lambda < 0.0 {
            eyre::bail!("fit.initial_lambda must be >= 0");
        }

        // Timeouts
        if self.timeouts.telemetry_ms == 0 {
            eyre::bail!("timeouts.telemetry_ms must be >= 1");
        }

        // Safety
        if self.safety.max_run_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("safety.max_run_ms is unreasonably large (>24h)");
        }

        // Link
        if !(0.0..=1.0).contains(&self.link.sim_expo) {
            eyre::bail!("link.sim_expo must be in [0.0, 1.0]");
        }
        if self.link.sim_telemetry_ms == 0 {
            eyre::bail!("link.sim_telemetry_ms must be >= 1");
        }

        Ok(())
    }
}
