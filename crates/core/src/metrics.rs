//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `sysrelay_`
//! - 모듈명: `relay_`, `monitor_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 입력 형식 레이블 키 (rfc5424, rfc3164, unrecognized)
pub const LABEL_FORMAT: &str = "format";

/// 관리 메시지 종류 레이블 키 (startup, shutdown, restart, health, stats)
pub const LABEL_KIND: &str = "kind";

// ─── Relay 메트릭 ───────────────────────────────────────────────────

/// Relay: 수신한 데이터그램 수 (counter, label: format)
pub const RELAY_DATAGRAMS_RECEIVED_TOTAL: &str = "sysrelay_relay_datagrams_received_total";

/// Relay: 변환(타임스탬프 보정) 성공 수 (counter)
pub const RELAY_MESSAGES_CONVERTED_TOTAL: &str = "sysrelay_relay_messages_converted_total";

/// Relay: 변환 없이 통과한 메시지 수 (counter)
pub const RELAY_MESSAGES_PASSTHROUGH_TOTAL: &str = "sysrelay_relay_messages_passthrough_total";

/// Relay: 타임스탬프 파싱 실패 수 (counter)
pub const RELAY_CONVERSION_FAILURES_TOTAL: &str = "sysrelay_relay_conversion_failures_total";

/// Relay: 다운스트림으로 전송한 데이터그램 수 (counter)
pub const RELAY_DATAGRAMS_FORWARDED_TOTAL: &str = "sysrelay_relay_datagrams_forwarded_total";

/// Relay: 원본 동시 전송 횟수 (counter)
pub const RELAY_DUAL_EMIT_TOTAL: &str = "sysrelay_relay_dual_emit_total";

/// Relay: 수신/전송 에러 수 (counter)
pub const RELAY_ERRORS_TOTAL: &str = "sysrelay_relay_errors_total";

/// Relay: 데이터그램 1건 변환 소요 시간 (histogram, 초)
pub const RELAY_TRANSFORM_DURATION_SECONDS: &str = "sysrelay_relay_transform_duration_seconds";

// ─── Monitor 메트릭 ─────────────────────────────────────────────────

/// Monitor: 전송한 관리 메시지 수 (counter, label: kind)
pub const MONITOR_ADMIN_MESSAGES_TOTAL: &str = "sysrelay_monitor_admin_messages_total";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "sysrelay_daemon_uptime_seconds";

/// Daemon: 릴레이 재시작 횟수 (counter)
pub const DAEMON_RELAY_RESTARTS_TOTAL: &str = "sysrelay_daemon_relay_restarts_total";

/// Daemon: 빌드 정보 (gauge, 항상 1, label: version)
pub const DAEMON_BUILD_INFO: &str = "sysrelay_daemon_build_info";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 변환 지연 시간 히스토그램 버킷 (초)
///
/// 1us ~ 10ms 범위. 1KB 이하 메시지의 패턴 매칭 비용 기준
pub const TRANSFORM_DURATION_BUCKETS: [f64; 8] = [
    0.000_001, 0.000_005, 0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.01,
];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Relay
    describe_counter!(
        RELAY_DATAGRAMS_RECEIVED_TOTAL,
        "Total number of syslog datagrams received, by detected format"
    );
    describe_counter!(
        RELAY_MESSAGES_CONVERTED_TOTAL,
        "Total number of messages whose timestamp was corrected"
    );
    describe_counter!(
        RELAY_MESSAGES_PASSTHROUGH_TOTAL,
        "Total number of messages forwarded without conversion"
    );
    describe_counter!(
        RELAY_CONVERSION_FAILURES_TOTAL,
        "Total number of messages whose embedded timestamp could not be parsed"
    );
    describe_counter!(
        RELAY_DATAGRAMS_FORWARDED_TOTAL,
        "Total number of datagrams sent to the downstream collector"
    );
    describe_counter!(
        RELAY_DUAL_EMIT_TOTAL,
        "Total number of inputs forwarded in both converted and original form"
    );
    describe_counter!(
        RELAY_ERRORS_TOTAL,
        "Total number of receive or send errors inside the relay loop"
    );
    describe_histogram!(
        RELAY_TRANSFORM_DURATION_SECONDS,
        "Time to transform a single datagram in seconds"
    );

    // Monitor
    describe_counter!(
        MONITOR_ADMIN_MESSAGES_TOTAL,
        "Total number of administrative datagrams emitted, by kind"
    );

    // Daemon
    describe_gauge!(DAEMON_UPTIME_SECONDS, "sysrelay daemon uptime in seconds");
    describe_counter!(
        DAEMON_RELAY_RESTARTS_TOTAL,
        "Total number of relay loop restarts requested"
    );
    describe_gauge!(
        DAEMON_BUILD_INFO,
        "Build information (always 1, with version label)"
    );
}
