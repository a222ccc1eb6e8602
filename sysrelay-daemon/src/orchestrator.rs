//! Daemon orchestration -- assembly, control loop, and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `sysrelay-daemon`.
//! It loads configuration, builds the relay controller, connects the admin
//! datagram sender, and runs the control loop driven by Unix signals and
//! the in-process command channel.
//!
//! # Control Signals
//!
//! | Signal            | Action                                             |
//! |-------------------|----------------------------------------------------|
//! | `SIGINT`/`SIGTERM`| stop the relay and exit                            |
//! | `SIGHUP`          | restart the relay (fresh loop, counters preserved) |
//! | `SIGUSR1`         | log health and emit a `health` admin datagram      |
//!
//! # Startup Order
//!
//! 1. PID file
//! 2. Relay loop (a bind failure is logged; a later restart can recover)
//! 3. `startup` admin datagram
//! 4. Stats monitor and uptime updater
//!
//! # Shutdown Order
//!
//! 1. `shutdown` admin datagram
//! 2. Background tasks (broadcast)
//! 3. Relay loop
//! 4. PID file removal

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use sysrelay_core::config::SysrelayConfig;
use sysrelay_core::metrics as m;
use sysrelay_core::pipeline::HealthStatus;
use sysrelay_relay_pipeline::{
    AdminIdentity, AdminKind, AdminMessage, AdminSender, PipelineConfig,
};

use crate::control::{ControlCommand, RelayController};
use crate::health::{
    ComponentHealth, DaemonHealth, MONITOR_COMPONENT, RELAY_COMPONENT, aggregate_status,
};
use crate::metrics_server;
use crate::monitor::spawn_stats_monitor;

/// Control command channel capacity.
const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Uptime gauge refresh interval.
const UPTIME_UPDATE_INTERVAL: Duration = Duration::from_secs(10);

/// The main daemon orchestrator.
///
/// Manages the complete lifecycle of the relay:
/// configuration, ordered startup, control commands,
/// health reporting, and graceful shutdown.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: SysrelayConfig,
    /// Relay loop owner.
    controller: RelayController,
    /// Admin datagram sender (None if the collector address could not be resolved).
    admin: Option<Arc<AdminSender>>,
    /// Shutdown broadcast sender (signals all background tasks).
    shutdown_tx: broadcast::Sender<()>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
    command_tx: mpsc::Sender<ControlCommand>,
    command_rx: mpsc::Receiver<ControlCommand>,
    monitor_task: Option<JoinHandle<()>>,
    uptime_task: Option<JoinHandle<()>>,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// This performs the following steps:
    /// 1. Load `sysrelay.toml` and apply environment variable overrides
    /// 2. Validate the configuration
    /// 3. Build the relay controller and admin sender
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or parsed
    /// - Configuration validation fails
    /// - The relay pipeline cannot be built
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = SysrelayConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    ///
    /// Useful for testing or when CLI overrides have already been applied.
    pub async fn build_from_config(config: SysrelayConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        let pipeline_config = PipelineConfig::from_core(&config)
            .map_err(|e| anyhow::anyhow!("invalid relay configuration: {}", e))?;

        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            tracing::info!(port = config.metrics.port, "metrics endpoint enabled");
        }
        record_daemon_metrics();

        let controller = RelayController::new(pipeline_config)
            .map_err(|e| anyhow::anyhow!("failed to build relay controller: {}", e))?;

        let identity = AdminIdentity::from_config(&config.monitor);
        let admin = match AdminSender::connect(&config.relay.forward_addr, identity).await {
            Ok(sender) => Some(Arc::new(sender)),
            Err(e) => {
                tracing::warn!(
                    forward = %config.relay.forward_addr,
                    error = %e,
                    "admin datagrams disabled"
                );
                None
            }
        };

        let (shutdown_tx, _) = broadcast::channel(16);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        tracing::info!(
            listen = %config.relay.listen_addr,
            forward = %config.relay.forward_addr,
            ip_offsets = config.sources.ip_offsets.len(),
            hostname_offsets = config.sources.hostname_offsets.len(),
            containers = config.containers.len(),
            "orchestrator built"
        );

        Ok(Self {
            config,
            controller,
            admin,
            shutdown_tx,
            start_time: Instant::now(),
            command_tx,
            command_rx,
            monitor_task: None,
            uptime_task: None,
        })
    }

    /// Sender for in-process control commands.
    ///
    /// Commands are handled by [`run`](Self::run) in the same way as signals.
    pub fn command_sender(&self) -> mpsc::Sender<ControlCommand> {
        self.command_tx.clone()
    }

    /// Start the relay and enter the control loop.
    ///
    /// This method returns after `SIGINT`, `SIGTERM`, or a
    /// [`ControlCommand::Stop`] has been handled.
    pub async fn run(&mut self) -> Result<()> {
        let pid_path = (!self.config.general.pid_file.is_empty())
            .then(|| self.config.general.pid_file.clone());
        if let Some(path) = &pid_path {
            write_pid_file(Path::new(path))?;
        }

        let result = self.run_until_stopped().await;

        if let Some(path) = &pid_path {
            remove_pid_file(Path::new(path));
        }
        result
    }

    async fn run_until_stopped(&mut self) -> Result<()> {
        let mut signals = ControlSignals::install()?;

        match self.controller.start().await {
            Ok(()) => tracing::info!(
                listen = ?self.controller.local_addr(),
                "relay loop started"
            ),
            Err(e) => tracing::error!(
                error = %e,
                "relay loop failed to start; send SIGHUP to retry"
            ),
        }

        self.send_admin(
            AdminMessage::new(AdminKind::Startup)
                .field("version", env!("CARGO_PKG_VERSION"))
                .field("listen", &self.config.relay.listen_addr)
                .field("forward", &self.config.relay.forward_addr)
                .field("running", self.controller.is_running()),
        )
        .await;

        self.spawn_background_tasks();

        tracing::info!("entering control loop");
        loop {
            let command = tokio::select! {
                command = signals.recv() => command,
                command = self.command_rx.recv() => command.unwrap_or(ControlCommand::Stop),
            };

            match command {
                ControlCommand::Stop => break,
                ControlCommand::Restart => self.restart_relay().await,
                ControlCommand::Status(reply) => {
                    let health = self.report_status().await;
                    if let Some(reply) = reply {
                        let _ = reply.send(health);
                    }
                }
            }
        }

        self.shutdown().await
    }

    fn spawn_background_tasks(&mut self) {
        if self.config.monitor.enabled {
            match &self.admin {
                Some(admin) => {
                    self.monitor_task = Some(spawn_stats_monitor(
                        self.controller.stats(),
                        Arc::clone(admin),
                        Duration::from_secs(self.config.monitor.interval_secs),
                        self.start_time,
                        self.shutdown_tx.subscribe(),
                    ));
                }
                None => tracing::warn!("stats monitor enabled but admin sender unavailable"),
            }
        }

        if self.config.metrics.enabled {
            self.uptime_task = Some(spawn_uptime_updater(
                self.start_time,
                self.shutdown_tx.subscribe(),
            ));
        }
    }

    async fn restart_relay(&mut self) {
        let message = match self.controller.request_restart().await {
            Ok(()) => {
                tracing::info!(
                    restarts = self.controller.restarts(),
                    listen = ?self.controller.local_addr(),
                    "relay loop restarted"
                );
                AdminMessage::new(AdminKind::Restart)
                    .field("result", "ok")
                    .field("restarts", self.controller.restarts())
            }
            Err(e) => {
                tracing::error!(error = %e, "relay restart failed");
                AdminMessage::new(AdminKind::Restart)
                    .field("result", "failed")
                    .field("error", e)
            }
        };
        self.send_admin(message).await;
    }

    async fn report_status(&self) -> DaemonHealth {
        let health = self.health().await;
        match serde_json::to_string(&health) {
            Ok(json) => tracing::info!(health = %json, "status requested"),
            Err(e) => tracing::warn!(error = %e, "failed to serialize health report"),
        }
        self.send_admin(AdminMessage::health(&health.relay)).await;
        health
    }

    /// Perform graceful shutdown of the relay and background tasks.
    async fn shutdown(&mut self) -> Result<()> {
        let snapshot = self.controller.stats().snapshot();
        self.send_admin(
            AdminMessage::new(AdminKind::Shutdown)
                .field("messages", snapshot.processed)
                .field("uptime", format!("{}s", self.start_time.elapsed().as_secs())),
        )
        .await;

        tracing::info!("broadcasting shutdown signal to all tasks");
        let _ = self.shutdown_tx.send(());

        for task in [self.monitor_task.take(), self.uptime_task.take()]
            .into_iter()
            .flatten()
        {
            let _ = task.await;
        }

        tracing::info!("stopping relay loop");
        self.controller
            .request_stop()
            .await
            .map_err(|e| anyhow::anyhow!("failed to stop relay loop: {}", e))
    }

    async fn send_admin(&self, message: AdminMessage) {
        let Some(admin) = &self.admin else {
            return;
        };
        if let Err(e) = admin.send(&message).await {
            tracing::warn!(
                kind = %message.kind(),
                error = %e,
                "failed to send admin datagram"
            );
        }
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        let monitor_status = match (&self.monitor_task, &self.admin) {
            (Some(task), _) if !task.is_finished() => HealthStatus::Healthy,
            (Some(_), _) => HealthStatus::Unhealthy("task exited".to_owned()),
            (None, None) => HealthStatus::Unhealthy("admin sender unavailable".to_owned()),
            (None, Some(_)) => HealthStatus::Unhealthy("not started".to_owned()),
        };

        let components = vec![
            ComponentHealth::new(RELAY_COMPONENT, true, self.controller.health().await),
            ComponentHealth::new(
                MONITOR_COMPONENT,
                self.config.monitor.enabled,
                monitor_status,
            ),
        ];

        let uptime_secs = self.start_time.elapsed().as_secs();
        if self.config.metrics.enabled {
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
        }

        DaemonHealth {
            status: aggregate_status(&components),
            uptime_secs,
            relay: self.controller.query_status(),
            listen_addr: self.controller.local_addr(),
            restarts: self.controller.restarts(),
            components,
        }
    }

    /// Relay controller (status queries, bound address).
    pub fn controller(&self) -> &RelayController {
        &self.controller
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &SysrelayConfig {
        &self.config
    }
}

/// Unix signal handlers mapped onto control commands.
struct ControlSignals {
    sigterm: Signal,
    sigint: Signal,
    sighup: Signal,
    sigusr1: Signal,
}

impl ControlSignals {
    /// Install handlers for SIGTERM, SIGINT, SIGHUP and SIGUSR1.
    ///
    /// # Errors
    ///
    /// Returns an error if a signal handler cannot be installed.
    fn install() -> Result<Self> {
        let install = |kind: SignalKind, name: &str| {
            signal(kind).map_err(|e| anyhow::anyhow!("failed to install {} handler: {}", name, e))
        };
        Ok(Self {
            sigterm: install(SignalKind::terminate(), "SIGTERM")?,
            sigint: install(SignalKind::interrupt(), "SIGINT")?,
            sighup: install(SignalKind::hangup(), "SIGHUP")?,
            sigusr1: install(SignalKind::user_defined1(), "SIGUSR1")?,
        })
    }

    /// Wait for the next signal.
    async fn recv(&mut self) -> ControlCommand {
        let (name, command) = tokio::select! {
            _ = self.sigterm.recv() => ("SIGTERM", ControlCommand::Stop),
            _ = self.sigint.recv() => ("SIGINT", ControlCommand::Stop),
            _ = self.sighup.recv() => ("SIGHUP", ControlCommand::Restart),
            _ = self.sigusr1.recv() => ("SIGUSR1", ControlCommand::Status(None)),
        };
        tracing::info!(signal = name, "control signal received");
        command
    }
}

/// Write the current process PID to a file.
///
/// Used to prevent duplicate daemon instances.
///
/// # Security
///
/// - Uses `create_new(true)` to atomically create file (prevents TOCTOU races)
/// - Verifies the created file is a regular file (prevents symlink attacks)
/// - Creates parent directory with restrictive permissions (0o700)
///
/// # Errors
///
/// Returns an error if the PID file cannot be written.
fn write_pid_file(path: &Path) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};
    use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

    if let Some(parent) = path.parent() {
        fs::DirBuilder::new()
            .mode(0o700)
            .recursive(true)
            .create(parent)?;
    }

    let pid = std::process::id();

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let existing_pid = fs::read_to_string(path).unwrap_or_else(|_| "unknown".to_owned());
            return Err(anyhow::anyhow!(
                "PID file {} already exists with PID: {}. Is another instance running?",
                path.display(),
                existing_pid.trim()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if !file.metadata()?.is_file() {
        let _ = fs::remove_file(path);
        return Err(anyhow::anyhow!(
            "PID file {} is not a regular file (possible symlink attack)",
            path.display()
        ));
    }

    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    writeln!(file, "{}", pid)?;

    tracing::info!(pid = pid, path = %path.display(), "PID file written");
    Ok(())
}

/// Remove the PID file on daemon shutdown.
///
/// Logs a warning but does not fail if the file cannot be removed.
fn remove_pid_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "failed to remove PID file"
        );
    } else {
        tracing::info!(path = %path.display(), "PID file removed");
    }
}

/// Record daemon-level metrics (build info).
fn record_daemon_metrics() {
    metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "daemon metrics recorded");
}

/// Spawn a background task that periodically updates the uptime metric.
fn spawn_uptime_updater(
    start_time: Instant,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPTIME_UPDATE_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let uptime_secs = start_time.elapsed().as_secs();
                    #[allow(clippy::cast_precision_loss)]
                    metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
                }
                _ = shutdown_rx.recv() => {
                    tracing::debug!("uptime updater shutting down");
                    break;
                }
            }
        }
    })
}
