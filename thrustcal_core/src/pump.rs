//! Background telemetry pump.
//!
//! A dedicated thread blocks on the telemetry source and forwards events
//! over a channel, so the tick loop never blocks on I/O. The channel is
//! bounded; if the consumer stalls, the newest events are dropped with a
//! warning rather than growing without bound.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel as xch;
use thrustcal_traits::{EscTelemetry, TelemetrySource};

const CHANNEL_CAPACITY: usize = 256;

/// Owns the pump thread and the receiving side of the event channel.
/// Dropping the pump signals shutdown and joins the thread.
pub struct TelemetryPump {
    rx: xch::Receiver<EscTelemetry>,
    shutdown: Arc<AtomicBool>,
    // Millis since `started` of the last successful receive.
    last_ok: Arc<AtomicU64>,
    started: Instant,
    handle: Option<JoinHandle<()>>,
}

impl TelemetryPump {
    /// Spawn the pump thread. `timeout` bounds each blocking receive so
    /// the thread notices shutdown promptly.
    pub fn spawn<S>(mut source: S, timeout: Duration) -> Self
    where
        S: TelemetrySource + Send + 'static,
    {
        let (tx, rx) = xch::bounded(CHANNEL_CAPACITY);
        let shutdown = Arc::new(AtomicBool::new(false));
        let last_ok = Arc::new(AtomicU64::new(0));
        let started = Instant::now();

        let thread_shutdown = Arc::clone(&shutdown);
        let thread_last_ok = Arc::clone(&last_ok);
        let handle = std::thread::spawn(move || {
            while !thread_shutdown.load(Ordering::Relaxed) {
                match source.recv(timeout) {
                    Ok(ev) => {
                        let ms = started.elapsed().as_millis() as u64;
                        thread_last_ok.store(ms, Ordering::Relaxed);
                        match tx.try_send(ev) {
                            Ok(()) => {}
                            Err(xch::TrySendError::Full(_)) => {
                                tracing::warn!("telemetry channel full; event dropped");
                            }
                            Err(xch::TrySendError::Disconnected(_)) => break,
                        }
                    }
                    Err(e) => {
                        // Timeouts are expected while the link is quiet.
                        tracing::trace!(error = %e, "telemetry receive failed");
                    }
                }
            }
            tracing::debug!("telemetry pump thread exiting");
        });

        Self {
            rx,
            shutdown,
            last_ok,
            started,
            handle: Some(handle),
        }
    }

    /// Drain all currently queued events without blocking.
    pub fn drain(&self) -> Vec<EscTelemetry> {
        let mut out = Vec::new();
        while let Ok(ev) = self.rx.try_recv() {
            out.push(ev);
        }
        out
    }

    /// Milliseconds since the last successful receive. Returns the time
    /// since spawn if nothing has ever arrived.
    pub fn stalled_for(&self) -> u64 {
        let now = self.started.elapsed().as_millis() as u64;
        now.saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }
}

impl Drop for TelemetryPump {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
