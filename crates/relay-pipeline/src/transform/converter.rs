//! RFC 5424 → RFC 3164 변환
//!
//! 타임스탬프를 보정하고, 헤더를 다운스트림 수집기가 기대하는
//! `<PRI>Mon DD HH:MM:SS host app: app (procid) - body` 형태로 재구성합니다.
//! 필드가 8개 미만이면 타임스탬프 부분만 교체하는 축소 변환을 수행합니다.

use std::collections::HashMap;

use regex::Regex;
use sysrelay_core::config::is_container_id;

use crate::error::RelayPipelineError;
use crate::parser::timestamp::{shift_iso, shift_traditional};
use crate::parser::{HeaderMatch, ParsedRfc5424Fields};

/// 앱 이름에서 제거할 `<...>` 태그
const APP_TAG_PATTERN: &str = r"<[^>]+>";

/// 변환 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    /// 변환된 메시지
    pub text: String,
    /// 필드 부족으로 타임스탬프만 교체했는지 여부
    pub degraded: bool,
}

/// RFC 5424 → RFC 3164 변환기
pub struct Rfc5424ToRfc3164Converter {
    containers: HashMap<String, String>,
    app_tag: Regex,
}

impl Rfc5424ToRfc3164Converter {
    /// 컨테이너 ID 매핑으로 변환기를 생성합니다.
    pub fn new(containers: HashMap<String, String>) -> Result<Self, RelayPipelineError> {
        Ok(Self {
            containers,
            app_tag: Regex::new(APP_TAG_PATTERN)?,
        })
    }

    /// RFC 5424 메시지를 변환합니다.
    ///
    /// 타임스탬프 파싱에 실패하면 에러를 반환하며, 호출자는 원문을 그대로 전달합니다.
    /// 헤더 앞에 붙은 바이트는 재구성된 메시지에서 제외됩니다.
    pub fn convert(
        &self,
        text: &str,
        header: &HeaderMatch<'_>,
        hours: i32,
    ) -> Result<Converted, RelayPipelineError> {
        let adjusted = shift_iso(header.timestamp, hours)?;

        let fields = ParsedRfc5424Fields::split(header.from_header(text))
            .filter(|f| f.timestamp == header.timestamp);
        let Some(fields) = fields else {
            return Ok(Converted {
                text: replace_timestamp(text, header, &adjusted),
                degraded: true,
            });
        };

        let hostname = self.container_name(fields.hostname);
        let app = self.sanitize_app_name(fields.app_name);
        Ok(Converted {
            text: format!(
                "{}{} {} {}: {} ({}) - {}",
                fields.priority(),
                adjusted,
                hostname,
                app,
                app,
                fields.proc_id,
                fields.body
            ),
            degraded: false,
        })
    }

    /// RFC 3164 헤더 타임스탬프만 보정합니다. 연도는 `year`로 해석합니다.
    pub fn adjust_rfc3164(
        &self,
        text: &str,
        header: &HeaderMatch<'_>,
        hours: i32,
        year: i32,
    ) -> Result<String, RelayPipelineError> {
        let adjusted = shift_traditional(header.timestamp, hours, year)?;
        Ok(replace_timestamp(text, header, &adjusted))
    }

    /// 12자리 16진수 호스트명이 매핑에 있으면 컨테이너 이름으로 바꿉니다.
    pub fn container_name<'a>(&'a self, hostname: &'a str) -> &'a str {
        if !is_container_id(hostname) {
            return hostname;
        }
        self.containers
            .get(hostname)
            .map_or(hostname, String::as_str)
    }

    /// `<...>` 태그를 제거하고 `[A-Za-z0-9_.-]` 외 문자를 `_`로 바꿉니다.
    pub fn sanitize_app_name(&self, app: &str) -> String {
        self.app_tag
            .replace_all(app, "")
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

fn replace_timestamp(text: &str, header: &HeaderMatch<'_>, adjusted: &str) -> String {
    let leading = header.leading(text);
    let rest = header.rest(text);
    let mut out = String::with_capacity(
        leading.len() + header.prefix.len() + adjusted.len() + rest.len(),
    );
    out.push_str(leading);
    out.push_str(header.prefix);
    out.push_str(adjusted);
    out.push_str(rest);
    out
}
