//! Keep-alive watchdog
//!
//! A single supervised background task that periodically verifies the
//! printer is reachable so it never drops into its low-power idle state.
//! Failures feed an exponential backoff; a stop request interrupts any
//! wait immediately through the cancellation token.

use crate::keepalive::probe::{ProbeStrategy, ProbeTarget};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Ceiling for the backoff delay between failed probes
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Consecutive failures after which logging drops from error to warn
const LOG_DOWNGRADE_AFTER: u32 = 3;

struct RunningWatchdog {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Process-wide keep-alive owner
///
/// At most one loop is live at a time: starting while running performs a
/// full stop-and-join before the fresh task is spawned.
pub struct Watchdog {
    slot: Mutex<Option<RunningWatchdog>>,
}

impl Watchdog {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Start the keep-alive loop, replacing any running instance
    pub async fn start(
        &self,
        target: ProbeTarget,
        interval: Duration,
        strategies: Vec<Box<dyn ProbeStrategy>>,
    ) {
        let mut slot = self.slot.lock().await;
        stop_running(slot.take()).await;

        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();

        info!(
            printer_uri = %target.uri,
            printer_model = %target.model,
            interval_secs = interval.as_secs(),
            "Keep alive started"
        );

        let task = tokio::spawn(run_loop(target, interval, strategies, loop_cancel));
        *slot = Some(RunningWatchdog { cancel, task });
    }

    /// Stop the loop if it is running; safe to call at any time
    ///
    /// Returns whether a loop was actually running.
    pub async fn stop(&self) -> bool {
        let mut slot = self.slot.lock().await;
        match slot.take() {
            Some(running) => {
                stop_running(Some(running)).await;
                info!("Keep alive stopped");
                true
            }
            None => {
                debug!("Keep alive stop requested while not running");
                false
            }
        }
    }

    /// Whether a loop is currently live
    pub async fn is_running(&self) -> bool {
        let slot = self.slot.lock().await;
        matches!(&*slot, Some(running) if !running.task.is_finished())
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}

async fn stop_running(running: Option<RunningWatchdog>) {
    let Some(running) = running else {
        return;
    };
    running.cancel.cancel();
    if let Err(e) = running.task.await {
        if !e.is_cancelled() {
            error!(error = ?e, "Keep alive task panicked");
        }
    }
}

/// Backoff delay after `failures` consecutive failed probes
///
/// `min(interval * 2^failures, 300s)`. The counter itself is unbounded;
/// only the delay is capped.
fn backoff_delay(interval: Duration, failures: u32) -> Duration {
    let factor = 1u64.checked_shl(failures).unwrap_or(u64::MAX);
    let secs = interval.as_secs().saturating_mul(factor);
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

/// Sleep that returns true when interrupted by cancellation
async fn wait_cancellable(cancel: &CancellationToken, duration: Duration) -> bool {
    if duration.is_zero() {
        return cancel.is_cancelled();
    }
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

async fn run_loop(
    target: ProbeTarget,
    interval: Duration,
    strategies: Vec<Box<dyn ProbeStrategy>>,
    cancel: CancellationToken,
) {
    let host = target.uri.host().to_string();
    info!(printer_uri = %target.uri, host = %host, "Keep alive worker started");

    let mut consecutive_failures: u32 = 0;
    // Unavailable strategies are logged on the first pass only.
    let mut log_unavailable = true;

    loop {
        if consecutive_failures > 0 {
            let backoff = backoff_delay(interval, consecutive_failures);
            // The normal interval was already waited out at the end of the
            // previous tick, so only the remainder is added here.
            let extra = backoff.saturating_sub(interval);
            warn!(
                consecutive_failures,
                backoff_secs = backoff.as_secs(),
                "Backing off before next keep alive probe"
            );
            if wait_cancellable(&cancel, extra).await {
                break;
            }
        }

        let success = run_probes(&strategies, &target, log_unavailable).await;
        log_unavailable = false;

        if success {
            consecutive_failures = 0;
            debug!(host = %host, "Keep alive probe successful");
        } else {
            consecutive_failures += 1;
            if consecutive_failures <= LOG_DOWNGRADE_AFTER {
                error!(
                    printer_uri = %target.uri,
                    host = %host,
                    consecutive_failures,
                    "Keep alive probe failed"
                );
            } else {
                warn!(
                    printer_uri = %target.uri,
                    host = %host,
                    consecutive_failures,
                    "Keep alive probe failed (repeated)"
                );
            }
        }

        if wait_cancellable(&cancel, interval).await {
            break;
        }
    }

    info!(printer_uri = %target.uri, "Keep alive worker stopped");
}

/// Walk the strategies in order until one reports the printer alive
async fn run_probes(
    strategies: &[Box<dyn ProbeStrategy>],
    target: &ProbeTarget,
    log_unavailable: bool,
) -> bool {
    for strategy in strategies {
        if !strategy.available() {
            if log_unavailable {
                info!(
                    strategy = strategy.name(),
                    "Probe strategy unavailable in this environment, skipping"
                );
            }
            continue;
        }
        if strategy.probe(target).await {
            debug!(strategy = strategy.name(), "Probe succeeded");
            return true;
        }
        debug!(strategy = strategy.name(), "Probe failed, trying next");
    }
    false
}
