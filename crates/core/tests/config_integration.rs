//! sysrelay.toml 통합 설정 테스트
//!
//! - sysrelay.toml.example 파싱 테스트
//! - 파일 로딩 및 환경변수 우선순위 테스트
//! - 잘못된 형식 에러 테스트

use std::io::Write;

use serial_test::serial;
use sysrelay_core::config::SysrelayConfig;
use sysrelay_core::error::{ConfigError, SysrelayError};

// =============================================================================
// sysrelay.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_and_validates() {
    let content = include_str!("../../../sysrelay.toml.example");
    let config = SysrelayConfig::parse(content).expect("example config should parse");
    config
        .validate()
        .expect("example config should pass validation");

    assert_eq!(config.general.pid_file, "/var/run/sysrelay/sysrelay.pid");
    assert_eq!(config.relay.listen_addr, "0.0.0.0:513");
    assert_eq!(config.relay.forward_addr, "127.0.0.1:514");
    assert!(config.relay.dual_send);
}

#[test]
fn example_config_has_device_offsets() {
    let content = include_str!("../../../sysrelay.toml.example");
    let config = SysrelayConfig::parse(content).expect("should parse");

    assert_eq!(config.sources.ip_offsets.len(), 6);
    assert!(config.sources.ip_offsets.values().all(|h| *h == 5));
    assert_eq!(
        config.sources.hostname_offsets.get("HubitatC8Pro"),
        Some(&5)
    );
    assert_eq!(
        config.containers.get("5183c0a146c0").map(String::as_str),
        Some("immichFrame-All")
    );
    assert_eq!(config.sources.container_hosts, vec!["192.168.2.110"]);
}

// =============================================================================
// 파일 로딩 테스트
// =============================================================================

#[tokio::test]
#[serial]
async fn load_reads_file_and_validates() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        "[relay]\nlisten_addr = \"127.0.0.1:5514\"\n\n[sources.ip_offsets]\n\"10.0.0.7\" = -2"
    )
    .expect("write config");

    let config = SysrelayConfig::load(file.path()).await.expect("should load");
    assert_eq!(config.relay.listen_addr, "127.0.0.1:5514");
    assert_eq!(config.sources.ip_offsets.get("10.0.0.7"), Some(&-2));
}

#[tokio::test]
#[serial]
async fn load_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[containers]\nnot-hex-at-all = \"x\"").expect("write config");

    let err = SysrelayConfig::load(file.path()).await.unwrap_err();
    assert!(matches!(
        err,
        SysrelayError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[tokio::test]
#[serial]
async fn env_overrides_take_precedence_over_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[relay]\nforward_addr = \"127.0.0.1:514\"\ndual_send = true")
        .expect("write config");

    // SAFETY: serial 테스트로 실행되어 다른 스레드가 환경변수를 읽지 않습니다.
    unsafe {
        std::env::set_var("SYSRELAY_RELAY_FORWARD_ADDR", "10.1.1.1:1514");
        std::env::set_var("SYSRELAY_RELAY_DUAL_SEND", "false");
    }

    let result = SysrelayConfig::load(file.path()).await;

    unsafe {
        std::env::remove_var("SYSRELAY_RELAY_FORWARD_ADDR");
        std::env::remove_var("SYSRELAY_RELAY_DUAL_SEND");
    }

    let config = result.expect("should load");
    assert_eq!(config.relay.forward_addr, "10.1.1.1:1514");
    assert!(!config.relay.dual_send);
}

#[tokio::test]
#[serial]
async fn invalid_env_override_fails_validation() {
    let file = tempfile::NamedTempFile::new().expect("temp file");

    // SAFETY: serial 테스트로 실행되어 다른 스레드가 환경변수를 읽지 않습니다.
    unsafe { std::env::set_var("SYSRELAY_GENERAL_LOG_FORMAT", "xml") };
    let result = SysrelayConfig::load(file.path()).await;
    unsafe { std::env::remove_var("SYSRELAY_GENERAL_LOG_FORMAT") };

    let err = result.unwrap_err();
    assert!(err.to_string().contains("log_format"));
}

#[test]
fn malformed_toml_is_parse_error() {
    let err = SysrelayConfig::parse("[relay\nlisten_addr = ").unwrap_err();
    assert!(matches!(
        err,
        SysrelayError::Config(ConfigError::ParseFailed { .. })
    ));
}
