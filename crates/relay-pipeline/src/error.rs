//! 릴레이 파이프라인 에러 타입
//!
//! [`RelayPipelineError`]는 릴레이 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<RelayPipelineError> for SysrelayError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use sysrelay_core::error::{ConfigError, RelayError, SysrelayError};

/// 릴레이 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum RelayPipelineError {
    /// 메시지에 포함된 타임스탬프 파싱/보정 실패
    #[error("timestamp error: '{value}': {reason}")]
    Timestamp {
        /// 원본 타임스탬프 문자열
        value: String,
        /// 실패 사유
        reason: String,
    },

    /// 재작성 규칙 적용 실패
    #[error("rewrite error: rule '{rule}': {reason}")]
    Rewrite {
        /// 규칙 이름
        rule: String,
        /// 실패 사유
        reason: String,
    },

    /// 소켓 생성/바인드/주소 해석 실패
    #[error("socket error: {addr}: {reason}")]
    Socket {
        /// 대상 주소
        addr: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 허용되지 않는 상태 전환
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<RelayPipelineError> for SysrelayError {
    fn from(err: RelayPipelineError) -> Self {
        match err {
            RelayPipelineError::Config { field, reason } => {
                SysrelayError::Config(ConfigError::InvalidValue { field, reason })
            }
            RelayPipelineError::Socket { addr, reason } => {
                SysrelayError::Relay(RelayError::Bind { addr, reason })
            }
            RelayPipelineError::InvalidState(reason) => {
                SysrelayError::Relay(RelayError::InvalidState(reason))
            }
            RelayPipelineError::Io(e) => SysrelayError::Io(e),
            other => SysrelayError::Relay(RelayError::InitFailed(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_error_display() {
        let err = RelayPipelineError::Timestamp {
            value: "2025-13-03T10:15:30.123+00:00".to_owned(),
            reason: "input is out of range".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("2025-13-03"));
        assert!(msg.contains("out of range"));
    }

    #[test]
    fn socket_error_maps_to_bind() {
        let err = RelayPipelineError::Socket {
            addr: "0.0.0.0:513".to_owned(),
            reason: "permission denied".to_owned(),
        };
        let top: SysrelayError = err.into();
        assert!(matches!(top, SysrelayError::Relay(RelayError::Bind { .. })));
    }

    #[test]
    fn config_error_maps_to_invalid_value() {
        let err = RelayPipelineError::Config {
            field: "forward_addr".to_owned(),
            reason: "unresolvable".to_owned(),
        };
        let top: SysrelayError = err.into();
        assert!(matches!(
            top,
            SysrelayError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn rewrite_error_maps_to_init_failed() {
        let err = RelayPipelineError::Rewrite {
            rule: "container_spacing".to_owned(),
            reason: "empty result".to_owned(),
        };
        let top: SysrelayError = err.into();
        assert!(matches!(top, SysrelayError::Relay(RelayError::InitFailed(_))));
    }
}
