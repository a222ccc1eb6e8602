//! 에러 타입 -- 도메인별 에러 정의

/// sysrelay 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SysrelayError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 릴레이 처리 에러
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 릴레이 생명주기 에러
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// 소켓 바인드 실패
    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    /// 다운스트림 전송 실패
    #[error("send to {addr} failed: {reason}")]
    Send { addr: String, reason: String },

    /// 현재 상태에서 허용되지 않는 전환
    #[error("invalid state transition: {0}")]
    InvalidState(String),

    /// 초기화 실패
    #[error("relay init failed: {0}")]
    InitFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_to_top_level() {
        let err: SysrelayError = ConfigError::InvalidValue {
            field: "relay.listen_addr".to_owned(),
            reason: "not a socket address".to_owned(),
        }
        .into();
        assert!(matches!(err, SysrelayError::Config(_)));
        assert!(err.to_string().contains("relay.listen_addr"));
    }

    #[test]
    fn bind_error_display_includes_addr() {
        let err = RelayError::Bind {
            addr: "0.0.0.0:513".to_owned(),
            reason: "address in use".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("0.0.0.0:513"));
        assert!(msg.contains("address in use"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err: SysrelayError = io.into();
        assert!(matches!(err, SysrelayError::Io(_)));
    }
}
