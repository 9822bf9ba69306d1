//! Collaborator seams for the thrust-curve calibration core.
//!
//! The core never talks to a concrete transport. It sees exactly two
//! capabilities: `CommandSink` (push one command frame per tick) and
//! `TelemetrySource` (pull the next ESC status event). Any node/session
//! stack (DroneCAN, serial bridge, simulation) plugs in behind these.

pub mod clock;

pub use clock::{Clock, FakeClock, MonotonicClock};

/// One ESC status event: rotational speed and current draw, in whatever
/// monotone proxy units the link reports. No physical calibration is
/// assumed anywhere downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EscTelemetry {
    pub rpm: f32,
    pub current: f32,
}

/// Sink for per-tick command frames.
///
/// `frame[i]` is the raw command for output `i`; exactly one index carries
/// a non-zero value during a sweep. Implementations should send and
/// return promptly; the tick loop treats `broadcast` as fire-and-forget.
pub trait CommandSink {
    fn broadcast(
        &mut self,
        frame: &[i32],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Source of telemetry events for the monitored ESC.
///
/// `recv` blocks until the next event arrives or `timeout` expires.
/// Events must be delivered in arrival order; no alignment with the
/// command tick rate is guaranteed or expected.
pub trait TelemetrySource {
    fn recv(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<EscTelemetry, Box<dyn std::error::Error + Send + Sync>>;
}
