//! 타임스탬프 보정 및 렌더링
//!
//! 보정은 항상 메시지에 기록된 시각 기준이며 수신 시각은 사용하지 않습니다.
//! 결과는 RFC 3164 헤더 형식(`Mon DD HH:MM:SS`, 일자 0 채움)으로 렌더링합니다.

use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone};

use crate::error::RelayPipelineError;

/// RFC 3164 헤더 타임스탬프 형식
pub const TRADITIONAL_FORMAT: &str = "%b %d %H:%M:%S";

/// ISO-8601 타임스탬프에 시간 보정값을 더해 전통 형식으로 렌더링합니다.
///
/// 메시지 자체의 UTC 오프셋을 벽시계 기준으로 유지합니다.
/// (`10:15:30+00:00` + 5시간 → `15:15:30`)
pub fn shift_iso(timestamp: &str, hours: i32) -> Result<String, RelayPipelineError> {
    let parsed =
        DateTime::parse_from_rfc3339(timestamp).map_err(|e| RelayPipelineError::Timestamp {
            value: timestamp.to_owned(),
            reason: e.to_string(),
        })?;
    let shifted = parsed
        .checked_add_signed(TimeDelta::hours(i64::from(hours)))
        .ok_or_else(|| out_of_range(timestamp))?;
    Ok(shifted.format(TRADITIONAL_FORMAT).to_string())
}

/// 전통 형식 타임스탬프(`Mon D HH:MM:SS`)를 주어진 연도로 해석하여 보정합니다.
///
/// 연도가 없는 형식이므로 윤년 2월 29일 등은 `year`에 따라 실패할 수 있습니다.
pub fn shift_traditional(
    timestamp: &str,
    hours: i32,
    year: i32,
) -> Result<String, RelayPipelineError> {
    let normalized = timestamp.split_whitespace().collect::<Vec<_>>().join(" ");
    let parsed = NaiveDateTime::parse_from_str(
        &format!("{year} {normalized}"),
        &format!("%Y {TRADITIONAL_FORMAT}"),
    )
    .map_err(|e| RelayPipelineError::Timestamp {
        value: timestamp.to_owned(),
        reason: e.to_string(),
    })?;
    let shifted = parsed
        .checked_add_signed(TimeDelta::hours(i64::from(hours)))
        .ok_or_else(|| out_of_range(timestamp))?;
    Ok(shifted.format(TRADITIONAL_FORMAT).to_string())
}

/// 주어진 시각을 전통 형식으로 렌더링합니다 (관리 메시지 헤더용).
pub fn render_traditional<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    at.format(TRADITIONAL_FORMAT).to_string()
}

fn out_of_range(timestamp: &str) -> RelayPipelineError {
    RelayPipelineError::Timestamp {
        value: timestamp.to_owned(),
        reason: "shifted time out of range".to_owned(),
    }
}
