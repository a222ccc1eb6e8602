//! sysrelay 공통 크레이트
//!
//! 릴레이 파이프라인과 데몬이 함께 사용하는 설정, 에러, 메트릭 이름,
//! 생명주기 trait을 정의합니다.
//!
//! # 모듈 구성
//!
//! - [`config`]: `sysrelay.toml` 파싱, 환경변수 오버라이드, 검증
//! - [`error`]: 도메인별 에러 타입
//! - [`metrics`]: Prometheus 메트릭 이름과 설명
//! - [`pipeline`]: 생명주기 trait과 [`HealthStatus`]

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, RelayError, SysrelayError};

// 설정
pub use config::SysrelayConfig;

// 파이프라인 trait
pub use pipeline::{HealthStatus, Pipeline};
