//! 릴레이 카운터
//!
//! [`RelayStats`]는 `Arc`로 공유되며 수신 루프가 유일한 기록자입니다.
//! 모니터와 제어 표면은 [`RelayStats::snapshot`]으로 근사값을 읽습니다.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 릴레이 공유 카운터
#[derive(Debug, Default)]
pub struct RelayStats {
    received: AtomicU64,
    processed: AtomicU64,
    passthrough: AtomicU64,
    failures: AtomicU64,
    forwarded: AtomicU64,
    dual_emitted: AtomicU64,
    errors: AtomicU64,
    /// 마지막 변환 시각 (Unix ms, 0이면 없음)
    last_activity_ms: AtomicI64,
}

impl RelayStats {
    /// 빈 카운터를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 데이터그램 수신
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    /// 변환 성공. 마지막 처리 시각도 갱신합니다.
    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.last_activity_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    /// 변환 없이 통과
    pub fn record_passthrough(&self) {
        self.passthrough.fetch_add(1, Ordering::Relaxed);
    }

    /// 타임스탬프 파싱 실패 (원문 전달)
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// 다운스트림 전송 성공
    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// 동시 전송
    pub fn record_dual_emit(&self) {
        self.dual_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// 수신/전송 에러
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// 변환된 메시지 수
    pub fn message_count(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// 마지막 변환 시각
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        match self.last_activity_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => DateTime::from_timestamp_millis(ms),
        }
    }

    /// 현재 카운터 스냅샷
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            passthrough: self.passthrough.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            dual_emitted: self.dual_emitted.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            last_activity: self.last_activity(),
        }
    }
}

/// 카운터 스냅샷
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub received: u64,
    pub processed: u64,
    pub passthrough: u64,
    pub failures: u64,
    pub forwarded: u64,
    pub dual_emitted: u64,
    pub errors: u64,
    pub last_activity: Option<DateTime<Utc>>,
}

/// 상태 조회 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayStatus {
    /// 수신 루프 실행 여부
    pub running: bool,
    /// 변환된 메시지 수
    pub message_count: u64,
    /// 마지막 변환 시각
    pub last_message_time: Option<DateTime<Utc>>,
}

impl RelayStatus {
    /// 카운터와 실행 여부로 상태를 구성합니다.
    pub fn new(running: bool, stats: &RelayStats) -> Self {
        Self {
            running,
            message_count: stats.message_count(),
            last_message_time: stats.last_activity(),
        }
    }
}
