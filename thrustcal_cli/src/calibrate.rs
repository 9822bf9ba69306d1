//! Calibration execution: config mapping, link assembly, run orchestration.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use thrustcal_core::error::Result as CoreResult;
use thrustcal_core::mocks::simulated_esc;
use thrustcal_core::runner::RunParams;
use thrustcal_core::{CalibrationReport, SweepCfg};

/// CLI overrides applied on top of the config file.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides {
    pub esc_index: Option<usize>,
    pub max_run_ms: Option<u64>,
    pub spin_min: Option<f64>,
    pub spin_max: Option<f64>,
}

/// Assemble run parameters from the validated config plus CLI overrides.
pub fn build_params(cfg: &thrustcal_config::Config, ov: Overrides) -> RunParams {
    let mut sweep: SweepCfg = (&cfg.sweep).into();
    if let Some(idx) = ov.esc_index {
        sweep.esc_index = idx;
    }
    let mut band: thrustcal_core::BandCfg = (&cfg.band).into();
    if let Some(v) = ov.spin_min {
        band.spin_min = v;
    }
    if let Some(v) = ov.spin_max {
        band.spin_max = v;
    }
    let max_run_ms = match ov.max_run_ms {
        Some(ms) => Some(ms),
        None if cfg.safety.max_run_ms > 0 => Some(cfg.safety.max_run_ms),
        None => None,
    };
    RunParams {
        sweep,
        band,
        fit: (&cfg.fit).into(),
        timeouts: (&cfg.timeouts).into(),
        max_run_ms,
    }
}

/// Run one calibration sweep against the configured link.
pub fn run_calibrate(
    cfg: &thrustcal_config::Config,
    ov: Overrides,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<CalibrationReport> {
    let params = build_params(cfg, ov);
    match cfg.link.mode {
        thrustcal_config::LinkMode::Sim => {
            let (sink, source) = simulated_esc(
                params.sweep.esc_index,
                cfg.link.sim_expo,
                Duration::from_millis(cfg.link.sim_telemetry_ms),
            );
            tracing::info!(
                expo = cfg.link.sim_expo,
                telemetry_ms = cfg.link.sim_telemetry_ms,
                "running against the simulated ESC link"
            );
            thrustcal_core::run(params, sink, source, shutdown)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_take_precedence_over_config() {
        let cfg = thrustcal_config::load_toml(
            "[sweep]\nesc_index = 0\n[safety]\nmax_run_ms = 60000\n[band]\nspin_min = 0.15",
        )
        .unwrap();
        let params = build_params(
            &cfg,
            Overrides {
                esc_index: Some(3),
                max_run_ms: Some(500),
                spin_min: Some(0.2),
                spin_max: None,
            },
        );
        assert_eq!(params.sweep.esc_index, 3);
        assert_eq!(params.max_run_ms, Some(500));
        assert_eq!(params.band.spin_min, 0.2);
        assert_eq!(params.band.spin_max, 0.95);
    }

    #[test]
    fn zero_max_run_ms_in_config_means_unlimited() {
        let cfg = thrustcal_config::load_toml("").unwrap();
        let params = build_params(&cfg, Overrides::default());
        assert_eq!(params.max_run_ms, None);
    }
}
