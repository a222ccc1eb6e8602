//! 설정 관리 -- sysrelay.toml 파싱 및 런타임 설정
//!
//! [`SysrelayConfig`]는 릴레이의 모든 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SYSRELAY_RELAY_LISTEN_ADDR=0.0.0.0:5140` 형식)
//! 3. 설정 파일 (`sysrelay.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), sysrelay_core::error::SysrelayError> {
//! use sysrelay_core::config::SysrelayConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SysrelayConfig::load("sysrelay.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SysrelayConfig::parse("[relay]\ndual_send = false")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SysrelayError};

/// 허용되는 시간 오프셋 절댓값 (시간)
pub const MAX_OFFSET_HOURS: i32 = 24;

/// 컨테이너 ID 길이 (docker short id)
pub const CONTAINER_ID_LEN: usize = 12;

/// sysrelay 통합 설정
///
/// `sysrelay.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SysrelayConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 릴레이 소켓 설정
    #[serde(default)]
    pub relay: RelayConfig,
    /// 소스별 오프셋 및 재작성 대상
    #[serde(default)]
    pub sources: SourcesConfig,
    /// 컨테이너 ID → 표시 이름 매핑
    #[serde(default)]
    pub containers: BTreeMap<String, String>,
    /// 통계 모니터 / 관리 메시지 설정
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Prometheus 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl SysrelayConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SysrelayError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SysrelayError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SysrelayError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SysrelayError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SysrelayError> {
        toml::from_str(toml_str).map_err(|e| {
            SysrelayError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SYSRELAY_{SECTION}_{FIELD}`
    /// 테이블 형태의 설정(오프셋, 컨테이너 매핑)은 파일에서만 읽습니다.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SYSRELAY_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SYSRELAY_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.pid_file, "SYSRELAY_GENERAL_PID_FILE");

        // Relay
        override_string(&mut self.relay.listen_addr, "SYSRELAY_RELAY_LISTEN_ADDR");
        override_string(&mut self.relay.forward_addr, "SYSRELAY_RELAY_FORWARD_ADDR");
        override_u64(
            &mut self.relay.recv_timeout_ms,
            "SYSRELAY_RELAY_RECV_TIMEOUT_MS",
        );
        override_usize(
            &mut self.relay.max_datagram_size,
            "SYSRELAY_RELAY_MAX_DATAGRAM_SIZE",
        );
        override_bool(&mut self.relay.dual_send, "SYSRELAY_RELAY_DUAL_SEND");

        // Sources
        override_csv(
            &mut self.sources.container_hosts,
            "SYSRELAY_SOURCES_CONTAINER_HOSTS",
        );
        override_csv(&mut self.sources.date_strip, "SYSRELAY_SOURCES_DATE_STRIP");
        override_csv(
            &mut self.sources.date_strip_extended,
            "SYSRELAY_SOURCES_DATE_STRIP_EXTENDED",
        );

        // Monitor
        override_bool(&mut self.monitor.enabled, "SYSRELAY_MONITOR_ENABLED");
        override_u64(
            &mut self.monitor.interval_secs,
            "SYSRELAY_MONITOR_INTERVAL_SECS",
        );
        override_string(&mut self.monitor.hostname, "SYSRELAY_MONITOR_HOSTNAME");

        // Metrics
        override_bool(&mut self.metrics.enabled, "SYSRELAY_METRICS_ENABLED");
        override_string(
            &mut self.metrics.listen_addr,
            "SYSRELAY_METRICS_LISTEN_ADDR",
        );
        override_u16(&mut self.metrics.port, "SYSRELAY_METRICS_PORT");
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SysrelayError> {
        self.validate_general()?;
        self.validate_relay()?;
        self.validate_sources()?;
        self.validate_containers()?;
        self.validate_monitor()?;
        self.validate_metrics()?;
        Ok(())
    }

    fn validate_general(&self) -> Result<(), SysrelayError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        Ok(())
    }

    fn validate_relay(&self) -> Result<(), SysrelayError> {
        const MAX_RECV_TIMEOUT_MS: u64 = 60_000;
        const MIN_DATAGRAM_SIZE: usize = 64;
        const MAX_DATAGRAM_SIZE: usize = 65_535;

        if self.relay.listen_addr.parse::<SocketAddr>().is_err() {
            return Err(invalid(
                "relay.listen_addr",
                format!("'{}' is not a socket address", self.relay.listen_addr),
            ));
        }

        validate_host_port("relay.forward_addr", &self.relay.forward_addr)?;

        if self.relay.recv_timeout_ms == 0 || self.relay.recv_timeout_ms > MAX_RECV_TIMEOUT_MS {
            return Err(invalid(
                "relay.recv_timeout_ms",
                format!("must be 1-{}", MAX_RECV_TIMEOUT_MS),
            ));
        }

        if !(MIN_DATAGRAM_SIZE..=MAX_DATAGRAM_SIZE).contains(&self.relay.max_datagram_size) {
            return Err(invalid(
                "relay.max_datagram_size",
                format!("must be {}-{}", MIN_DATAGRAM_SIZE, MAX_DATAGRAM_SIZE),
            ));
        }

        Ok(())
    }

    fn validate_sources(&self) -> Result<(), SysrelayError> {
        for (ip, hours) in &self.sources.ip_offsets {
            if ip.parse::<IpAddr>().is_err() {
                return Err(invalid(
                    "sources.ip_offsets",
                    format!("'{}' is not an IP address", ip),
                ));
            }
            validate_offset("sources.ip_offsets", ip, *hours)?;
        }

        for (host, hours) in &self.sources.hostname_offsets {
            if host.is_empty() || host.chars().any(char::is_whitespace) {
                return Err(invalid(
                    "sources.hostname_offsets",
                    format!("hostname '{}' must be a single non-empty token", host),
                ));
            }
            validate_offset("sources.hostname_offsets", host, *hours)?;
        }

        let sets = [
            ("sources.container_hosts", &self.sources.container_hosts),
            ("sources.date_strip", &self.sources.date_strip),
            ("sources.date_strip_extended", &self.sources.date_strip_extended),
        ];
        for (field, entries) in sets {
            if let Some(bad) = entries.iter().find(|e| e.trim().is_empty()) {
                return Err(invalid(field, format!("empty source identity '{}'", bad)));
            }
        }

        Ok(())
    }

    fn validate_containers(&self) -> Result<(), SysrelayError> {
        for (id, name) in &self.containers {
            if !is_container_id(id) {
                return Err(invalid(
                    "containers",
                    format!(
                        "'{}' must be {} lowercase hex characters",
                        id, CONTAINER_ID_LEN
                    ),
                ));
            }
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return Err(invalid(
                    "containers",
                    format!("name for '{}' must be a single non-empty token", id),
                ));
            }
        }
        Ok(())
    }

    fn validate_monitor(&self) -> Result<(), SysrelayError> {
        const MAX_SYSLOG_PRI: u8 = 191;

        if self.monitor.enabled && self.monitor.interval_secs == 0 {
            return Err(invalid(
                "monitor.interval_secs",
                "must be greater than 0".to_owned(),
            ));
        }

        if self.monitor.priority > MAX_SYSLOG_PRI {
            return Err(invalid(
                "monitor.priority",
                format!("must be 0-{}", MAX_SYSLOG_PRI),
            ));
        }

        let tokens = [
            ("monitor.hostname", &self.monitor.hostname),
            ("monitor.app_name", &self.monitor.app_name),
        ];
        for (field, value) in tokens {
            if value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(invalid(field, "must be a single non-empty token".to_owned()));
            }
        }

        Ok(())
    }

    fn validate_metrics(&self) -> Result<(), SysrelayError> {
        if !self.metrics.enabled {
            return Ok(());
        }

        if self.metrics.listen_addr.parse::<IpAddr>().is_err() {
            return Err(invalid(
                "metrics.listen_addr",
                format!("'{}' is not an IP address", self.metrics.listen_addr),
            ));
        }

        if self.metrics.port == 0 {
            return Err(invalid("metrics.port", "must not be 0".to_owned()));
        }

        Ok(())
    }
}

/// 12자리 소문자 16진수 컨테이너 ID인지 확인합니다.
pub fn is_container_id(value: &str) -> bool {
    value.len() == CONTAINER_ID_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn invalid(field: &str, reason: String) -> SysrelayError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

fn validate_offset(field: &str, key: &str, hours: i32) -> Result<(), SysrelayError> {
    if hours.unsigned_abs() > MAX_OFFSET_HOURS.unsigned_abs() {
        return Err(invalid(
            field,
            format!(
                "offset {} for '{}' exceeds +/-{} hours",
                hours, key, MAX_OFFSET_HOURS
            ),
        ));
    }
    Ok(())
}

/// `host:port` 형식을 검증합니다. 호스트 이름은 DNS 조회 없이 허용합니다.
fn validate_host_port(field: &str, value: &str) -> Result<(), SysrelayError> {
    if value.parse::<SocketAddr>().is_ok() {
        return Ok(());
    }

    match value.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
        _ => Err(invalid(
            field,
            format!("'{}' must be in host:port form", value),
        )),
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// PID 파일 경로 (빈 문자열이면 사용하지 않음)
    pub pid_file: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            pid_file: String::new(),
        }
    }
}

/// 릴레이 소켓 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// 수신 바인드 주소
    pub listen_addr: String,
    /// 다운스트림 수집기 주소 (host:port)
    pub forward_addr: String,
    /// 수신 대기 타임아웃 (밀리초). 종료 요청 감지 주기를 결정합니다.
    pub recv_timeout_ms: u64,
    /// 수신 데이터그램 최대 크기 (바이트)
    pub max_datagram_size: usize,
    /// RFC 5424 원본 동시 전송 여부
    pub dual_send: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:513".to_owned(),
            forward_addr: "127.0.0.1:514".to_owned(),
            recv_timeout_ms: 1000,
            max_datagram_size: 1024,
            dual_send: true,
        }
    }
}

/// 소스별 오프셋 및 재작성 대상 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// 소스 IP → 시간 오프셋
    pub ip_offsets: BTreeMap<String, i32>,
    /// RFC 5424 헤더 호스트명 → 시간 오프셋 (IP가 고정되지 않은 장비용)
    pub hostname_offsets: BTreeMap<String, i32>,
    /// 컨테이너 호스트 (`name[pid]:` 간격 보정 대상)
    pub container_hosts: Vec<String>,
    /// 본문 내 보조 타임스탬프 제거 대상
    pub date_strip: Vec<String>,
    /// 확장 타임스탬프 패턴 제거 대상
    pub date_strip_extended: Vec<String>,
}

/// 통계 모니터 및 관리 메시지 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// 주기적 통계 메시지 전송 여부
    pub enabled: bool,
    /// 통계 메시지 전송 주기 (초)
    pub interval_secs: u64,
    /// 관리 메시지의 호스트명 필드
    pub hostname: String,
    /// 관리 메시지의 앱 이름 필드
    pub app_name: String,
    /// 관리 메시지 PRI 값
    pub priority: u8,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 300,
            hostname: "sysrelay".to_owned(),
            app_name: "SyslogRelay".to_owned(),
            priority: 14,
        }
    }
}

/// Prometheus 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 메트릭 엔드포인트 활성화 여부
    pub enabled: bool,
    /// 리스닝 IP
    pub listen_addr: String,
    /// 리스닝 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9187,
            endpoint: "/metrics".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u16(target: &mut u16, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u16>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u16 from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = SysrelayConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.relay.listen_addr, "0.0.0.0:513");
        assert_eq!(config.relay.forward_addr, "127.0.0.1:514");
        assert_eq!(config.relay.max_datagram_size, 1024);
        assert!(config.relay.dual_send);
        assert!(config.sources.ip_offsets.is_empty());
        assert!(config.containers.is_empty());
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        SysrelayConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = SysrelayConfig::parse("").unwrap();
        assert_eq!(config.relay.recv_timeout_ms, 1000);
        assert_eq!(config.monitor.app_name, "SyslogRelay");
    }

    #[test]
    fn parses_offset_tables_and_container_map() {
        let toml = r#"
[sources]
container_hosts = ["192.168.2.110"]
date_strip = ["192.168.2.110", "HubitatC8Pro"]

[sources.ip_offsets]
"192.168.2.110" = 5
"192.168.2.113" = -3

[sources.hostname_offsets]
HubitatC8Pro = 5

[containers]
5183c0a146c0 = "immichFrame-All"
"#;
        let config = SysrelayConfig::parse(toml).unwrap();
        assert_eq!(config.sources.ip_offsets.get("192.168.2.110"), Some(&5));
        assert_eq!(config.sources.ip_offsets.get("192.168.2.113"), Some(&-3));
        assert_eq!(
            config.sources.hostname_offsets.get("HubitatC8Pro"),
            Some(&5)
        );
        assert_eq!(
            config.containers.get("5183c0a146c0").map(String::as_str),
            Some("immichFrame-All")
        );
        assert_eq!(config.sources.date_strip.len(), 2);
        config.validate().unwrap();
    }

    #[test]
    fn invalid_toml_returns_parse_error() {
        let err = SysrelayConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            SysrelayError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = SysrelayConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_bad_listen_addr() {
        let mut config = SysrelayConfig::default();
        config.relay.listen_addr = "not-an-addr".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("listen_addr"));
    }

    #[test]
    fn validate_accepts_hostname_forward_addr() {
        let mut config = SysrelayConfig::default();
        config.relay.forward_addr = "collector.lan:514".to_owned();
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_forward_addr_without_port() {
        let mut config = SysrelayConfig::default();
        config.relay.forward_addr = "collector.lan".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("forward_addr"));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = SysrelayConfig::default();
        config.relay.recv_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_ip_offset_key() {
        let mut config = SysrelayConfig::default();
        config
            .sources
            .ip_offsets
            .insert("hubitat.local".to_owned(), 5);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ip_offsets"));
    }

    #[test]
    fn validate_rejects_out_of_range_offset() {
        let mut config = SysrelayConfig::default();
        config
            .sources
            .hostname_offsets
            .insert("HubitatC7".to_owned(), 30);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_minimum_offset() {
        let mut config = SysrelayConfig::default();
        config
            .sources
            .ip_offsets
            .insert("192.168.2.108".to_owned(), i32::MIN);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ip_offsets"));
    }

    #[test]
    fn validate_accepts_offset_bounds() {
        let mut config = SysrelayConfig::default();
        config
            .sources
            .hostname_offsets
            .insert("east".to_owned(), MAX_OFFSET_HOURS);
        config
            .sources
            .hostname_offsets
            .insert("west".to_owned(), -MAX_OFFSET_HOURS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_malformed_container_id() {
        let mut config = SysrelayConfig::default();
        config
            .containers
            .insert("5183C0A146C0".to_owned(), "frame".to_owned());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("containers"));
    }

    #[test]
    fn validate_rejects_priority_above_191() {
        let mut config = SysrelayConfig::default();
        config.monitor.priority = 192;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_skips_metrics_when_disabled() {
        let mut config = SysrelayConfig::default();
        config.metrics.listen_addr = "nope".to_owned();
        config.validate().unwrap();
        config.metrics.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn container_id_shape() {
        assert!(is_container_id("5183c0a146c0"));
        assert!(!is_container_id("5183c0a146c"));
        assert!(!is_container_id("5183c0a146cg"));
        assert!(!is_container_id("HubitatC8Pro"));
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: serial 테스트로 실행되어 다른 스레드가 환경변수를 읽지 않습니다.
        unsafe { std::env::set_var("TEST_SYSRELAY_STR", "overridden") };
        override_string(&mut val, "TEST_SYSRELAY_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_SYSRELAY_STR") };
    }

    #[test]
    #[serial]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = true;
        // SAFETY: serial 테스트로 실행되어 다른 스레드가 환경변수를 읽지 않습니다.
        unsafe { std::env::set_var("TEST_SYSRELAY_BOOL_BAD", "maybe") };
        override_bool(&mut val, "TEST_SYSRELAY_BOOL_BAD");
        assert!(val);
        unsafe { std::env::remove_var("TEST_SYSRELAY_BOOL_BAD") };
    }

    #[test]
    #[serial]
    fn env_override_csv_skips_empty_entries() {
        let mut val = vec!["a".to_owned()];
        // SAFETY: serial 테스트로 실행되어 다른 스레드가 환경변수를 읽지 않습니다.
        unsafe { std::env::set_var("TEST_SYSRELAY_CSV", "192.168.2.110, ,HubitatC7") };
        override_csv(&mut val, "TEST_SYSRELAY_CSV");
        assert_eq!(val, vec!["192.168.2.110", "HubitatC7"]);
        unsafe { std::env::remove_var("TEST_SYSRELAY_CSV") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = 1000u64;
        override_u64(&mut val, "TEST_SYSRELAY_NONEXISTENT_12345");
        assert_eq!(val, 1000);
    }

    #[test]
    fn config_serialize_roundtrip() {
        let mut config = SysrelayConfig::default();
        config
            .sources
            .ip_offsets
            .insert("192.168.2.19".to_owned(), 5);
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = SysrelayConfig::parse(&toml_str).unwrap();
        assert_eq!(parsed.sources.ip_offsets.get("192.168.2.19"), Some(&5));
        assert_eq!(parsed.relay.forward_addr, config.relay.forward_addr);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = SysrelayConfig::from_file("/nonexistent/path/sysrelay.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SysrelayError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
