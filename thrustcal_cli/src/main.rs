//! `thrustcal` binary: config loading, logging setup, signal handling and
//! command dispatch. All calibration logic lives in `thrustcal_core`.

mod calibrate;
mod cli;
mod error_fmt;

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn init_tracing(args: &Cli, logging: &thrustcal_config::Logging) {
    let level = logging.level.as_deref().unwrap_or(&args.log_level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    // Optional JSON-lines file sink, layered alongside the console so a
    // log file never silences the terminal.
    let file_layer = logging.file.as_ref().map(|path| {
        let rotation = logging.rotation.as_deref().unwrap_or("never");
        let appender = match rotation {
            "daily" => tracing_appender::rolling::daily(".", path),
            "hourly" => tracing_appender::rolling::hourly(".", path),
            _ => tracing_appender::rolling::never(".", path),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed()
    });

    let console_layer = if args.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();
}

fn load_config(args: &Cli) -> Result<thrustcal_config::Config> {
    let text = fs::read_to_string(&args.config)
        .wrap_err_with(|| format!("reading config {:?}", args.config))?;
    let cfg = thrustcal_config::load_toml(&text)
        .wrap_err_with(|| format!("parsing config {:?}", args.config))?;
    cfg.validate().wrap_err("validating config")?;
    Ok(cfg)
}

fn print_report(report: &thrustcal_core::CalibrationReport, json: bool, print_samples: bool) {
    if json {
        let obj = serde_json::json!({
            "expo": report.fit.a,
            "sigma": report.fit.variance_a.sqrt(),
            "residual_rms": report.fit.residual_rms,
            "iterations": report.fit.iterations,
            "samples": report.samples.len(),
            "duration_ms": report.duration_ms,
        });
        println!("{obj}");
        return;
    }
    if print_samples {
        println!("setpoint,rpm,current");
        for s in &report.samples {
            println!("{},{},{}", s.setpoint, s.rpm, s.current);
        }
    }
    println!(
        "expo = {:.4} (sigma {:.2e}, rms {:.2e})",
        report.fit.a,
        report.fit.variance_a.sqrt(),
        report.fit.residual_rms
    );
    println!(
        "{} samples in {} ms, {} fit iterations",
        report.samples.len(),
        report.duration_ms,
        report.fit.iterations
    );
}

fn self_check(cfg: &thrustcal_config::Config) -> Result<()> {
    // Config already validated; exercise the sim link end to end with a
    // minimal sweep so "ok" means the whole stack works.
    let mut quick = thrustcal_config::Config::default();
    quick.sweep.esc_index = cfg.sweep.esc_index;
    quick.sweep.esc_count = cfg.sweep.esc_count;
    quick.sweep.tick_ms = 1;
    quick.sweep.warmup_ticks = 1;
    quick.sweep.step = 200;
    quick.timeouts.telemetry_ms = 10;
    quick.link.sim_telemetry_ms = 1;
    let report = calibrate::run_calibrate(
        &quick,
        calibrate::Overrides {
            max_run_ms: Some(300),
            ..Default::default()
        },
        Arc::new(AtomicBool::new(false)),
    )?;
    println!(
        "self-check ok: sim expo {:.3} recovered as {:.3} from {} samples",
        quick.link.sim_expo,
        report.fit.a,
        report.samples.len()
    );
    Ok(())
}

fn run() -> Result<()> {
    let args = Cli::parse();
    let _ = JSON_MODE.set(args.json);

    let cfg = load_config(&args)?;
    init_tracing(&args, &cfg.logging);

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })
    .wrap_err("installing Ctrl-C handler")?;

    match args.cmd {
        Commands::Calibrate {
            esc_index,
            max_run_ms,
            spin_min,
            spin_max,
            print_samples,
        } => {
            let report = calibrate::run_calibrate(
                &cfg,
                calibrate::Overrides {
                    esc_index,
                    max_run_ms,
                    spin_min,
                    spin_max,
                },
                shutdown,
            )?;
            print_report(&report, args.json, print_samples);
            Ok(())
        }
        Commands::SelfCheck => self_check(&cfg),
    }
}

fn main() {
    color_eyre::install().ok();

    if let Err(err) = run() {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("Error: {}", error_fmt::humanize(&err));
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}
