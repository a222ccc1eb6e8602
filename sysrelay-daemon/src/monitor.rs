//! Periodic stats reporter.
//!
//! Emits a `stats` admin datagram to the downstream collector every
//! `[monitor] interval_secs`, until the shutdown broadcast fires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use sysrelay_relay_pipeline::{AdminMessage, AdminSender, RelayStats};

/// Spawn the stats monitor task.
///
/// The first report is sent one full `interval` after spawning.
/// Send failures are logged and the task keeps running.
pub fn spawn_stats_monitor(
    stats: Arc<RelayStats>,
    admin: Arc<AdminSender>,
    interval: Duration,
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!(
            interval_secs = interval.as_secs(),
            target = %admin.target(),
            "stats monitor started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = stats.snapshot();
                    let uptime_secs = start_time.elapsed().as_secs();
                    let message = AdminMessage::stats(&snapshot, uptime_secs);
                    if let Err(e) = admin.send(&message).await {
                        tracing::warn!(error = %e, "failed to send stats report");
                    } else {
                        tracing::debug!(
                            messages = snapshot.processed,
                            received = snapshot.received,
                            uptime_secs,
                            "stats report sent"
                        );
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("stats monitor shutting down");
                    break;
                }
            }
        }
    })
}
