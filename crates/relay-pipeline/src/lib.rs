#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`collector`]: 원시 데이터그램과 UDP 수신/전달 루프
//! - [`parser`]: 형식 판별, RFC 5424 필드 분리, 타임스탬프 보정
//! - [`transform`]: 보정값 조회, RFC 5424 → RFC 3164 변환, 외형 보정, 동시 전송 결정
//! - [`admin`]: 관리 데이터그램 구성 및 전송
//! - [`stats`]: 공유 카운터와 상태 조회
//! - [`pipeline`]: 릴레이 루프 생명주기 (Pipeline trait 구현)
//! - [`config`]: 파이프라인 설정 (core 설정 변환)
//! - [`source`]: 송신 장비 식별자와 소스 집합
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! UDP recv -> FormatClassifier -> TimestampResolver -> Converter -> CosmeticRewriter -> UDP send (1~2)
//!                                       |                                                  |
//!                                 IP / hostname                                   converted, original
//! ```

pub mod admin;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod stats;

pub mod collector;
pub mod parser;
pub mod transform;

// --- 주요 타입 re-export ---

// 릴레이 루프
pub use pipeline::{RelayLoop, RelayLoopBuilder, RelayState};

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::RelayPipelineError;

// 파서
pub use parser::{FormatClassifier, MessageFormat, ParsedRfc5424Fields};

// 변환
pub use transform::{
    CosmeticRewriter, Disposition, DualEmitDecider, MessageTransformer, ProcessedDatagram,
    ResolvedOffset, Rfc5424ToRfc3164Converter, TimestampResolver,
};

// 수집
pub use collector::RawDatagram;

// 카운터
pub use stats::{RelayStats, RelayStatus, StatsSnapshot};

// 관리 메시지
pub use admin::{AdminIdentity, AdminKind, AdminMessage, AdminSender};

// 소스 식별
pub use source::{SourceIdentity, SourceSet};
