//! Relay control surface.
//!
//! [`RelayController`] owns the current [`RelayLoop`] and the shared
//! [`RelayStats`]. A stopped loop cannot be started again, so a restart
//! builds a fresh loop around the same counters.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;

use sysrelay_core::error::SysrelayError;
use sysrelay_core::metrics as m;
use sysrelay_core::pipeline::{HealthStatus, Pipeline};
use sysrelay_relay_pipeline::{
    PipelineConfig, RelayLoop, RelayLoopBuilder, RelayPipelineError, RelayState, RelayStats,
    RelayStatus,
};

use crate::health::DaemonHealth;

/// Commands accepted by the orchestrator's control loop.
#[derive(Debug)]
pub enum ControlCommand {
    /// Stop the relay and shut the daemon down.
    Stop,
    /// Stop the relay and start a fresh loop with the same counters.
    Restart,
    /// Log the current health and emit a `health` admin datagram.
    ///
    /// The report is also sent back when a reply channel is attached.
    Status(Option<oneshot::Sender<DaemonHealth>>),
}

/// Owner of the relay loop lifecycle.
pub struct RelayController {
    config: PipelineConfig,
    stats: Arc<RelayStats>,
    relay: Option<RelayLoop>,
    restarts: u64,
}

impl RelayController {
    /// Create a controller with fresh counters. The relay is not started.
    pub fn new(config: PipelineConfig) -> Result<Self, RelayPipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            stats: Arc::new(RelayStats::new()),
            relay: None,
            restarts: 0,
        })
    }

    /// Build and start a relay loop.
    ///
    /// # Errors
    ///
    /// - A relay loop is already running
    /// - Socket bind or collector resolution fails
    pub async fn start(&mut self) -> Result<(), SysrelayError> {
        if self.is_running() {
            return Err(
                RelayPipelineError::InvalidState("relay loop already running".to_owned()).into(),
            );
        }

        let mut relay = RelayLoopBuilder::new()
            .config(self.config.clone())
            .stats(Arc::clone(&self.stats))
            .build()?;
        let started = relay.start().await;
        // a failed loop is kept; health reports it as stopped
        self.relay = Some(relay);
        started
    }

    /// Stop the relay loop if it is running. Stopping an idle controller is a no-op.
    pub async fn request_stop(&mut self) -> Result<(), SysrelayError> {
        let Some(mut relay) = self.relay.take() else {
            return Ok(());
        };
        if matches!(relay.state(), RelayState::Running | RelayState::Stopping) {
            relay.stop().await?;
        }
        Ok(())
    }

    /// Stop the current loop and start a fresh one sharing the same counters.
    pub async fn request_restart(&mut self) -> Result<(), SysrelayError> {
        tracing::info!(restarts = self.restarts, "restarting relay loop");
        self.request_stop().await?;

        self.restarts += 1;
        metrics::counter!(m::DAEMON_RELAY_RESTARTS_TOTAL).increment(1);

        self.start().await
    }

    /// Current running flag and message counters.
    pub fn query_status(&self) -> RelayStatus {
        RelayStatus::new(self.is_running(), &self.stats)
    }

    /// Whether the relay task is alive.
    pub fn is_running(&self) -> bool {
        self.relay.as_ref().is_some_and(RelayLoop::is_running)
    }

    /// Relay loop health.
    pub async fn health(&self) -> HealthStatus {
        match &self.relay {
            Some(relay) => relay.health_check().await,
            None => HealthStatus::Unhealthy("not started".to_owned()),
        }
    }

    /// Bound inbound address of the running loop.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.relay.as_ref().and_then(RelayLoop::local_addr)
    }

    /// Shared counters.
    pub fn stats(&self) -> Arc<RelayStats> {
        Arc::clone(&self.stats)
    }

    /// Number of restarts performed.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Pipeline configuration used for every loop.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
