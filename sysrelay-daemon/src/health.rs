//! Aggregated health reporting.
//!
//! Combines the relay loop and the stats monitor into a single
//! [`DaemonHealth`] report. The overall daemon status is the worst
//! status among all enabled components.
//!
//! # Aggregation Rule
//!
//! - All Healthy -> Healthy
//! - Any Degraded, none Unhealthy -> Degraded(reason)
//! - Any Unhealthy -> Unhealthy(reason)

use std::net::SocketAddr;

use serde::Serialize;

use sysrelay_core::pipeline::HealthStatus;
use sysrelay_relay_pipeline::RelayStatus;

/// Component name of the UDP relay loop.
pub const RELAY_COMPONENT: &str = "relay-loop";

/// Component name of the periodic stats reporter.
pub const MONITOR_COMPONENT: &str = "stats-monitor";

/// Aggregated health report for the entire daemon.
#[derive(Debug, Clone, Serialize)]
pub struct DaemonHealth {
    /// Overall daemon health status (worst of all components).
    pub status: HealthStatus,
    /// Daemon uptime in seconds since start.
    pub uptime_secs: u64,
    /// Relay counters at the time of the report.
    pub relay: RelayStatus,
    /// Bound inbound address of the running relay loop.
    pub listen_addr: Option<SocketAddr>,
    /// Number of relay restarts since the daemon started.
    pub restarts: u64,
    /// Per-component health reports.
    pub components: Vec<ComponentHealth>,
}

/// Health status for a single component.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    /// Component name (e.g., "relay-loop", "stats-monitor").
    pub name: String,
    /// Whether the component is enabled in configuration.
    pub enabled: bool,
    /// Current health status of the component.
    pub status: HealthStatus,
}

impl ComponentHealth {
    /// Create a component report.
    pub fn new(name: impl Into<String>, enabled: bool, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            enabled,
            status,
        }
    }
}

/// Aggregate multiple component health statuses into a single status.
///
/// Returns the worst status found: Unhealthy > Degraded > Healthy.
/// Only considers enabled components.
pub fn aggregate_status(components: &[ComponentHealth]) -> HealthStatus {
    let mut worst = HealthStatus::Healthy;
    let mut reasons = Vec::new();

    for component in components.iter().filter(|c| c.enabled) {
        match &component.status {
            HealthStatus::Healthy => {}
            HealthStatus::Degraded(reason) => {
                if !worst.is_unhealthy() {
                    reasons.push(format!("{}: {}", component.name, reason));
                    worst = HealthStatus::Degraded(String::new());
                }
            }
            HealthStatus::Unhealthy(reason) => {
                reasons.push(format!("{}: {}", component.name, reason));
                worst = HealthStatus::Unhealthy(String::new());
            }
        }
    }

    match worst {
        HealthStatus::Healthy => HealthStatus::Healthy,
        HealthStatus::Degraded(_) => HealthStatus::Degraded(reasons.join("; ")),
        HealthStatus::Unhealthy(_) => HealthStatus::Unhealthy(reasons.join("; ")),
    }
}
