//! 릴레이 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`SysrelayConfig`]를 기반으로
//! 릴레이 내부에서 바로 조회할 수 있는 형태(IP 키, 소스 집합 등)로 변환된 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use sysrelay_core::config::SysrelayConfig;
//! use sysrelay_relay_pipeline::config::PipelineConfig;
//!
//! let core_config = SysrelayConfig::default();
//! let config = PipelineConfig::from_core(&core_config)?;
//! ```

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use sysrelay_core::config::{MAX_OFFSET_HOURS, SysrelayConfig, is_container_id};

use crate::error::RelayPipelineError;
use crate::source::{SourceIdentity, SourceSet};

/// 릴레이 파이프라인 설정
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 수신 바인드 주소
    pub listen_addr: String,
    /// 다운스트림 수집기 주소 (host:port)
    pub forward_addr: String,
    /// 수신 대기 제한 시간 (정지 요청 확인 주기)
    pub recv_timeout: Duration,
    /// 데이터그램 1건 최대 크기 (초과분은 잘림)
    pub max_datagram_size: usize,
    /// 변환본과 원본 동시 전송 여부
    pub dual_send: bool,
    /// 송신 IP별 시간 보정값
    pub ip_offsets: HashMap<IpAddr, i32>,
    /// RFC 5424 헤더 호스트명별 시간 보정값
    pub hostname_offsets: HashMap<String, i32>,
    /// 컨테이너 ID → 이름
    pub containers: HashMap<String, String>,
    /// `name[pid]:` 간격 보정 대상
    pub container_hosts: SourceSet,
    /// 본문 타임스탬프 제거 대상
    pub date_strip: SourceSet,
    /// 확장 타임스탬프 제거 대상
    pub date_strip_extended: SourceSet,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:513".to_owned(),
            forward_addr: "127.0.0.1:514".to_owned(),
            recv_timeout: Duration::from_secs(1),
            max_datagram_size: 1024,
            dual_send: true,
            ip_offsets: HashMap::new(),
            hostname_offsets: HashMap::new(),
            containers: HashMap::new(),
            container_hosts: SourceSet::new(),
            date_strip: SourceSet::new(),
            date_strip_extended: SourceSet::new(),
        }
    }
}

impl PipelineConfig {
    /// core 설정에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &SysrelayConfig) -> Result<Self, RelayPipelineError> {
        let mut ip_offsets = HashMap::with_capacity(core.sources.ip_offsets.len());
        for (ip, hours) in &core.sources.ip_offsets {
            let parsed: IpAddr = ip.parse().map_err(|_| RelayPipelineError::Config {
                field: "sources.ip_offsets".to_owned(),
                reason: format!("'{}' is not an IP address", ip),
            })?;
            ip_offsets.insert(parsed.to_canonical(), *hours);
        }

        let config = Self {
            listen_addr: core.relay.listen_addr.clone(),
            forward_addr: core.relay.forward_addr.clone(),
            recv_timeout: Duration::from_millis(core.relay.recv_timeout_ms),
            max_datagram_size: core.relay.max_datagram_size,
            dual_send: core.relay.dual_send,
            ip_offsets,
            hostname_offsets: core
                .sources
                .hostname_offsets
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            containers: core
                .containers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            container_hosts: core.sources.container_hosts.iter().collect(),
            date_strip: core.sources.date_strip.iter().collect(),
            date_strip_extended: core.sources.date_strip_extended.iter().collect(),
        };
        config.validate()?;
        Ok(config)
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), RelayPipelineError> {
        if self.recv_timeout.is_zero() {
            return Err(RelayPipelineError::Config {
                field: "recv_timeout".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_datagram_size == 0 {
            return Err(RelayPipelineError::Config {
                field: "max_datagram_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        let offsets = self
            .ip_offsets
            .values()
            .chain(self.hostname_offsets.values());
        for hours in offsets {
            if hours.unsigned_abs() > MAX_OFFSET_HOURS.unsigned_abs() {
                return Err(RelayPipelineError::Config {
                    field: "offsets".to_owned(),
                    reason: format!("{} exceeds +/-{} hours", hours, MAX_OFFSET_HOURS),
                });
            }
        }

        if let Some(id) = self.containers.keys().find(|id| !is_container_id(id)) {
            return Err(RelayPipelineError::Config {
                field: "containers".to_owned(),
                reason: format!("'{}' is not a container id", id),
            });
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
///
/// 테스트와 임베딩 용도로 코어 설정 파일 없이 설정을 조립합니다.
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 수신 바인드 주소를 설정합니다.
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// 전달 주소를 설정합니다.
    pub fn forward_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.forward_addr = addr.into();
        self
    }

    /// 수신 대기 제한 시간을 설정합니다.
    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.config.recv_timeout = timeout;
        self
    }

    /// 최대 데이터그램 크기를 설정합니다.
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.config.max_datagram_size = size;
        self
    }

    /// 동시 전송 여부를 설정합니다.
    pub fn dual_send(mut self, enabled: bool) -> Self {
        self.config.dual_send = enabled;
        self
    }

    /// IP 시간 보정값을 추가합니다.
    pub fn ip_offset(mut self, ip: IpAddr, hours: i32) -> Self {
        self.config.ip_offsets.insert(ip.to_canonical(), hours);
        self
    }

    /// 호스트명 시간 보정값을 추가합니다.
    pub fn hostname_offset(mut self, hostname: impl Into<String>, hours: i32) -> Self {
        self.config.hostname_offsets.insert(hostname.into(), hours);
        self
    }

    /// 컨테이너 ID 매핑을 추가합니다.
    pub fn container(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.config.containers.insert(id.into(), name.into());
        self
    }

    /// 간격 보정 대상 장비를 추가합니다.
    pub fn container_host(mut self, source: &str) -> Self {
        self.config
            .container_hosts
            .insert(SourceIdentity::parse(source));
        self
    }

    /// 타임스탬프 제거 대상 장비를 추가합니다.
    pub fn date_strip(mut self, source: &str) -> Self {
        self.config.date_strip.insert(SourceIdentity::parse(source));
        self
    }

    /// 확장 타임스탬프 제거 대상 장비를 추가합니다.
    pub fn date_strip_extended(mut self, source: &str) -> Self {
        self.config
            .date_strip_extended
            .insert(SourceIdentity::parse(source));
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, RelayPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
