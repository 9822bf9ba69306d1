//! Tick-driven triangular sweep controller.
//!
//! Generates a bounded, rate-limited setpoint trajectory for one ESC and
//! gates telemetry recording to the stable part of the run. The triangular
//! wave (alternating up/down legs) densifies samples in the region of
//! interest and keeps any up/down asymmetry visible to the fit instead of
//! averaging it away; a monotone-only sweep could not separate static
//! friction and hysteresis from the steady-state response.
//!
//! The controller is non-reentrant by construction: `tick` and
//! `on_telemetry` take `&mut self`, so the "record the setpoint in effect
//! at delivery time" contract holds as long as the caller serializes them
//! (the runner does, on a single thread).

use crossbeam_channel as xch;
use eyre::WrapErr;
use thrustcal_traits::{CommandSink, EscTelemetry};

use crate::config::SweepCfg;
use crate::error::{BuildError, Result, SweepError};
use crate::types::{FULL_SCALE_COMMAND, TelemetrySample};

/// Phase of the sweep run.
///
/// Warm-up (the "settling" period) is the counter phase of `Idle`: the
/// setpoint is pinned to zero either way, so a distinct state would carry
/// no information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    /// Holding zero while the warm-up counter runs down.
    Idle,
    /// Triangular wave between the configured bounds.
    Active,
    /// Ramping down to zero after a stop request.
    Stopping,
    /// Terminal; setpoint fixed at zero, buffer frozen.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStatus {
    Running,
    Done,
}

/// The sweep state machine. Owns the sample buffer for the lifetime of
/// one calibration run; discard after `into_samples`.
pub struct SweepController<K: CommandSink> {
    sink: K,
    cfg: SweepCfg,
    phase: SweepPhase,
    direction: Direction,
    setpoint: i32,
    warmup_left: u32,
    samples: Vec<TelemetrySample>,
    // Optional observer of buffer growth; keeps visualization out of the
    // recording path.
    watcher: Option<xch::Sender<TelemetrySample>>,
}

impl<K: CommandSink> core::fmt::Debug for SweepController<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SweepController")
            .field("phase", &self.phase)
            .field("setpoint", &self.setpoint)
            .field("samples", &self.samples.len())
            .finish()
    }
}

impl<K: CommandSink> SweepController<K> {
    pub fn new(cfg: SweepCfg, sink: K) -> core::result::Result<Self, BuildError> {
        if cfg.esc_count == 0 {
            return Err(BuildError::InvalidConfig("esc_count must be >= 1"));
        }
        if cfg.esc_index >= cfg.esc_count {
            return Err(BuildError::InvalidConfig("esc_index must be < esc_count"));
        }
        if cfg.step < 1 {
            return Err(BuildError::InvalidConfig("step must be >= 1"));
        }
        if cfg.lower < 0 || cfg.upper <= cfg.lower {
            return Err(BuildError::InvalidConfig("need 0 <= lower < upper"));
        }
        if cfg.upper >= FULL_SCALE_COMMAND {
            return Err(BuildError::InvalidConfig("upper must be below full scale"));
        }
        if cfg.step > cfg.upper - cfg.lower {
            return Err(BuildError::InvalidConfig("step exceeds the sweep span"));
        }
        if cfg.warmup_ticks == 0 {
            return Err(BuildError::InvalidConfig("warmup_ticks must be >= 1"));
        }
        let warmup_left = cfg.warmup_ticks;
        Ok(Self {
            sink,
            cfg,
            phase: SweepPhase::Idle,
            direction: Direction::Up,
            setpoint: 0,
            warmup_left,
            samples: Vec::new(),
            watcher: None,
        })
    }

    pub fn phase(&self) -> SweepPhase {
        self.phase
    }

    pub fn setpoint(&self) -> i32 {
        self.setpoint
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Subscribe to sample-buffer growth. Every recorded sample is also
    /// sent to the returned channel, best effort.
    pub fn watch(&mut self) -> xch::Receiver<TelemetrySample> {
        let (tx, rx) = xch::unbounded();
        self.watcher = Some(tx);
        rx
    }

    /// Request a ramp-down to zero. Idempotent; takes effect at the next
    /// tick. An abort never ends the run at a high command: `Active` goes
    /// through `Stopping`, and during warm-up the setpoint is already
    /// zero so the run completes immediately.
    pub fn request_stop(&mut self) {
        match self.phase {
            SweepPhase::Idle => {
                self.phase = SweepPhase::Done;
                tracing::info!("stop requested during warm-up; sweep done");
            }
            SweepPhase::Active => {
                self.phase = SweepPhase::Stopping;
                tracing::info!(setpoint = self.setpoint, "stop requested; ramping down");
            }
            SweepPhase::Stopping | SweepPhase::Done => {}
        }
    }

    /// Advance the state machine by one scheduler tick and broadcast the
    /// resulting setpoint. Exactly one broadcast per call; a broadcast
    /// failure is returned but the state transition already happened, so
    /// the caller decides whether to keep ticking or abort.
    pub fn tick(&mut self) -> Result<SweepStatus> {
        match self.phase {
            SweepPhase::Idle => {
                self.setpoint = 0;
                self.warmup_left = self.warmup_left.saturating_sub(1);
                if self.warmup_left == 0 {
                    self.phase = SweepPhase::Active;
                    self.direction = Direction::Up;
                    tracing::info!("warm-up complete; sweep active");
                }
            }
            SweepPhase::Active | SweepPhase::Stopping => self.advance_setpoint(),
            SweepPhase::Done => self.setpoint = 0,
        }
        self.broadcast_frame()?;
        if self.phase == SweepPhase::Done {
            Ok(SweepStatus::Done)
        } else {
            Ok(SweepStatus::Running)
        }
    }

    /// Ingest one telemetry event. Records a sample only while the sweep
    /// is in its recording phases and the setpoint is strictly positive;
    /// the warm-up/shutdown plateau carries no curve information.
    pub fn on_telemetry(&mut self, ev: EscTelemetry) {
        let recording = matches!(self.phase, SweepPhase::Active | SweepPhase::Stopping);
        if !recording || self.setpoint <= 0 {
            tracing::trace!(rpm = ev.rpm, current = ev.current, "plateau telemetry ignored");
            return;
        }
        let sample = TelemetrySample {
            setpoint: self.setpoint,
            rpm: ev.rpm,
            current: ev.current,
        };
        tracing::debug!(
            setpoint = sample.setpoint,
            rpm = sample.rpm,
            current = sample.current,
            "sample recorded"
        );
        if let Some(tx) = &self.watcher {
            let _ = tx.send(sample);
        }
        self.samples.push(sample);
    }

    /// Consume the controller, yielding the immutable sample snapshot.
    pub fn into_samples(self) -> Vec<TelemetrySample> {
        self.samples
    }

    fn advance_setpoint(&mut self) {
        if self.phase == SweepPhase::Stopping {
            // Abort always ramps down, never up.
            self.direction = Direction::Down;
            if self.setpoint <= self.cfg.step {
                self.setpoint = 0;
                self.phase = SweepPhase::Done;
                tracing::info!(samples = self.samples.len(), "ramp-down reached zero");
            } else {
                self.setpoint -= self.cfg.step;
            }
            return;
        }
        match self.direction {
            Direction::Up => {
                if self.setpoint + self.cfg.step >= self.cfg.upper {
                    self.setpoint = self.cfg.upper;
                    self.direction = Direction::Down;
                } else {
                    self.setpoint += self.cfg.step;
                }
            }
            Direction::Down => {
                if self.setpoint - self.cfg.step <= self.cfg.lower {
                    self.setpoint = self.cfg.lower;
                    self.direction = Direction::Up;
                } else {
                    self.setpoint -= self.cfg.step;
                }
            }
        }
    }

    fn broadcast_frame(&mut self) -> Result<()> {
        // Fresh frame every tick; a shared buffer would leak state across
        // ticks and callers.
        let mut frame = vec![0i32; self.cfg.esc_count];
        frame[self.cfg.esc_index] = self.setpoint;
        self.sink
            .broadcast(&frame)
            .map_err(|e| SweepError::Transport(e.to_string()))
            .wrap_err("broadcasting command frame")
    }
}
