//! Test doubles and the simulated ESC link.
//!
//! The simulation is first-class, not test-only: the CLI runs against it
//! for bench-free smoke testing, so it lives here rather than behind
//! `cfg(test)`.

use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use thrustcal_traits::{CommandSink, EscTelemetry, TelemetrySource};

use crate::fit::expo_model;
use crate::types::FULL_SCALE_COMMAND;

/// Accepts every frame and remembers the last one. For sweep tests.
#[derive(Debug, Default)]
pub struct NullSink {
    pub frames: Vec<Vec<i32>>,
}

impl CommandSink for NullSink {
    fn broadcast(&mut self, frame: &[i32]) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.frames.push(frame.to_vec());
        Ok(())
    }
}

/// Fails every broadcast after an optional grace count.
#[derive(Debug)]
pub struct FailingSink {
    pub succeed_first: usize,
    sent: usize,
}

impl FailingSink {
    pub fn new(succeed_first: usize) -> Self {
        Self {
            succeed_first,
            sent: 0,
        }
    }
}

impl CommandSink for FailingSink {
    fn broadcast(&mut self, _frame: &[i32]) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.sent += 1;
        if self.sent <= self.succeed_first {
            Ok(())
        } else {
            Err("bus write failed".into())
        }
    }
}

const SIM_RPM_FULL_SCALE: f64 = 6000.0;
const SIM_THRUST_GAIN: f64 = 500.0;

/// Command side of the simulated link. Publishes the monitored output's
/// setpoint for the telemetry side to observe.
pub struct SimCommandSink {
    esc_index: usize,
    setpoint: Arc<AtomicI32>,
}

impl CommandSink for SimCommandSink {
    fn broadcast(&mut self, frame: &[i32]) -> Result<(), Box<dyn Error + Send + Sync>> {
        let value = frame
            .get(self.esc_index)
            .copied()
            .ok_or("frame shorter than the monitored output index")?;
        self.setpoint.store(value, Ordering::Relaxed);
        Ok(())
    }
}

/// Telemetry side of the simulated link. Emits one event per `interval`,
/// synthesized from the current setpoint with an ideal expo response:
/// rpm is proportional to throttle, and current is back-derived so that
/// `(current·rpm)^(2/3)` reproduces `expo_model(throttle, expo)`.
pub struct SimulatedEsc {
    expo: f64,
    interval: Duration,
    setpoint: Arc<AtomicI32>,
}

impl TelemetrySource for SimulatedEsc {
    fn recv(&mut self, timeout: Duration) -> Result<EscTelemetry, Box<dyn Error + Send + Sync>> {
        std::thread::sleep(self.interval.min(timeout));
        let setpoint = self.setpoint.load(Ordering::Relaxed);
        if setpoint <= 0 {
            return Ok(EscTelemetry {
                rpm: 0.0,
                current: 0.0,
            });
        }
        let x = f64::from(setpoint) / f64::from(FULL_SCALE_COMMAND);
        let thrust = SIM_THRUST_GAIN * expo_model(x, self.expo);
        let rpm = SIM_RPM_FULL_SCALE * x;
        let current = thrust.powf(1.5) / rpm;
        Ok(EscTelemetry {
            rpm: rpm as f32,
            current: current as f32,
        })
    }
}

/// Build a connected simulated link: a command sink and a telemetry
/// source sharing one setpoint cell.
pub fn simulated_esc(
    esc_index: usize,
    expo: f64,
    interval: Duration,
) -> (SimCommandSink, SimulatedEsc) {
    let setpoint = Arc::new(AtomicI32::new(0));
    (
        SimCommandSink {
            esc_index,
            setpoint: Arc::clone(&setpoint),
        },
        SimulatedEsc {
            expo,
            interval,
            setpoint,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_link_reflects_the_broadcast_setpoint() {
        let (mut sink, mut esc) = simulated_esc(1, 0.5, Duration::from_millis(1));
        sink.broadcast(&[0, 4096, 0, 0]).unwrap();
        let ev = esc.recv(Duration::from_millis(10)).unwrap();
        assert!(ev.rpm > 0.0);
        assert!(ev.current > 0.0);

        sink.broadcast(&[0, 0, 0, 0]).unwrap();
        let quiet = esc.recv(Duration::from_millis(10)).unwrap();
        assert_eq!(quiet.rpm, 0.0);
        assert_eq!(quiet.current, 0.0);
    }

    #[test]
    fn short_frame_is_rejected() {
        let (mut sink, _esc) = simulated_esc(3, 0.5, Duration::from_millis(1));
        assert!(sink.broadcast(&[0, 0]).is_err());
    }
}
