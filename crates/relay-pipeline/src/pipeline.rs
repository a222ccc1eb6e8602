//! 릴레이 루프 생명주기 -- 수신 소켓, 변환기, 카운터를 묶어 시작/정지를 관리합니다.
//!
//! [`RelayLoop`]은 core의 [`Pipeline`](sysrelay_core::pipeline::Pipeline) trait을 구현하여
//! `sysrelay-daemon`에서 start/stop/health_check로 관리됩니다.
//!
//! # 상태 전이
//! ```text
//! Idle --start()--> Running --request_stop()--> Stopping --task exit--> Stopped
//! ```
//! 정지된 루프는 다시 시작할 수 없습니다. 재시작은 같은 [`RelayStats`]로 새 루프를 만듭니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;

use sysrelay_core::error::SysrelayError;
use sysrelay_core::pipeline::{HealthStatus, Pipeline};

use crate::collector::syslog_udp::{RelaySockets, RelayTask};
use crate::config::PipelineConfig;
use crate::error::RelayPipelineError;
use crate::stats::{RelayStats, RelayStatus};
use crate::transform::MessageTransformer;

/// 릴레이 루프 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// 생성됨, 아직 시작하지 않음
    Idle,
    /// 수신 중
    Running,
    /// 정지 요청됨, 태스크 종료 대기
    Stopping,
    /// 정지됨 (재시작 불가)
    Stopped,
}

impl RelayState {
    /// 로그용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

/// UDP 릴레이 루프
///
/// # 사용 예시
/// ```ignore
/// use sysrelay_core::pipeline::Pipeline;
/// use sysrelay_relay_pipeline::RelayLoopBuilder;
///
/// let mut relay = RelayLoopBuilder::new().config(config).build()?;
/// relay.start().await?;
/// // ...
/// relay.stop().await?;
/// ```
pub struct RelayLoop {
    config: PipelineConfig,
    transformer: Arc<MessageTransformer>,
    stats: Arc<RelayStats>,
    running: Arc<AtomicBool>,
    state: RelayState,
    local_addr: Option<SocketAddr>,
    task: Option<JoinHandle<()>>,
}

impl RelayLoop {
    /// 현재 상태
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// 수신 태스크가 살아 있고 실행 플래그가 켜져 있는지 확인합니다.
    pub fn is_running(&self) -> bool {
        self.state == RelayState::Running
            && self.running.load(Ordering::Acquire)
            && self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// 실행 플래그를 내립니다. 태스크는 다음 수신 대기 만료 시 종료됩니다.
    pub fn request_stop(&mut self) {
        self.running.store(false, Ordering::Release);
        if self.state == RelayState::Running {
            self.state = RelayState::Stopping;
        }
    }

    /// 실제 바인드된 수신 주소 (시작 후에만 존재)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// 공유 카운터
    pub fn stats(&self) -> Arc<RelayStats> {
        Arc::clone(&self.stats)
    }

    /// 상태 조회
    pub fn status(&self) -> RelayStatus {
        RelayStatus::new(self.is_running(), &self.stats)
    }

    /// 설정
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    async fn open_and_spawn(&mut self) -> Result<(), RelayPipelineError> {
        let sockets = RelaySockets::open(&self.config.listen_addr, &self.config.forward_addr).await?;
        let local_addr = sockets.local_addr()?;

        tracing::info!(
            listen = %local_addr,
            forward = %sockets.forward,
            dual_send = self.config.dual_send,
            "starting relay loop"
        );

        self.running.store(true, Ordering::Release);
        let task = RelayTask {
            sockets,
            transformer: Arc::clone(&self.transformer),
            stats: Arc::clone(&self.stats),
            running: Arc::clone(&self.running),
            recv_timeout: self.config.recv_timeout,
            max_datagram_size: self.config.max_datagram_size,
        };
        self.task = Some(tokio::spawn(task.run()));
        self.local_addr = Some(local_addr);
        Ok(())
    }
}

impl Pipeline for RelayLoop {
    async fn start(&mut self) -> Result<(), SysrelayError> {
        match self.state {
            RelayState::Idle => {}
            RelayState::Running | RelayState::Stopping => {
                return Err(RelayPipelineError::InvalidState("relay loop already running".to_owned()).into());
            }
            RelayState::Stopped => {
                return Err(RelayPipelineError::InvalidState(
                    "stopped relay loop cannot be restarted".to_owned(),
                )
                .into());
            }
        }

        if let Err(e) = self.open_and_spawn().await {
            self.state = RelayState::Stopped;
            tracing::error!(error = %e, "relay loop failed to start");
            return Err(e.into());
        }

        self.state = RelayState::Running;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), SysrelayError> {
        if !matches!(self.state, RelayState::Running | RelayState::Stopping) {
            return Err(RelayPipelineError::InvalidState(format!(
                "relay loop is {}",
                self.state.as_str()
            ))
            .into());
        }

        tracing::info!("stopping relay loop");
        self.request_stop();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "relay task ended abnormally");
            }
        }

        self.state = RelayState::Stopped;
        tracing::info!("relay loop stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            RelayState::Running if self.is_running() => HealthStatus::Healthy,
            RelayState::Running => HealthStatus::Unhealthy("relay task exited".to_owned()),
            RelayState::Stopping => HealthStatus::Degraded("stopping".to_owned()),
            RelayState::Idle => HealthStatus::Unhealthy("not started".to_owned()),
            RelayState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

impl Drop for RelayLoop {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// 릴레이 루프 빌더
pub struct RelayLoopBuilder {
    config: PipelineConfig,
    stats: Option<Arc<RelayStats>>,
}

impl RelayLoopBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            stats: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 기존 카운터를 공유합니다. 재시작 시 카운터를 유지할 때 사용합니다.
    pub fn stats(mut self, stats: Arc<RelayStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    /// 릴레이 루프를 빌드합니다.
    pub fn build(self) -> Result<RelayLoop, RelayPipelineError> {
        self.config.validate()?;
        let transformer = MessageTransformer::new(&self.config)?;

        Ok(RelayLoop {
            config: self.config,
            transformer: Arc::new(transformer),
            stats: self.stats.unwrap_or_default(),
            running: Arc::new(AtomicBool::new(false)),
            state: RelayState::Idle,
            local_addr: None,
            task: None,
        })
    }
}

impl Default for RelayLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
