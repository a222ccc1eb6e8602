//! 파이프라인 trait -- 생명주기 관리 확장 포인트 정의

use std::fmt;
use std::future::Future;

use serde::Serialize;

use crate::error::SysrelayError;

/// 컴포넌트 건강 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작 중이나 성능 저하
    Degraded(String),
    /// 비정상
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 비정상 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded ({reason})"),
            Self::Unhealthy(reason) => write!(f, "unhealthy ({reason})"),
        }
    }
}

/// 시작/정지/헬스 체크 생명주기를 가지는 컴포넌트
///
/// `sysrelay-daemon`은 이 trait을 통해 릴레이 루프를 동일한 방식으로 관리합니다.
pub trait Pipeline: Send {
    /// 컴포넌트를 시작합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), SysrelayError>> + Send;

    /// 컴포넌트를 정지합니다. 실행 중이 아니면 에러를 반환합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), SysrelayError>> + Send;

    /// 현재 건강 상태를 반환합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}
