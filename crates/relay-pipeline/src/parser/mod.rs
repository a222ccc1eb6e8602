//! 메시지 형식 판별 및 헤더 파싱
//!
//! # 구성
//! - [`FormatClassifier`]: 정렬된 규칙 목록으로 RFC 5424 / RFC 3164 / 미인식을 판별
//! - [`rfc5424`]: RFC 5424 필드 분리
//! - [`timestamp`]: ISO-8601 / 전통 syslog 타임스탬프 보정 및 렌더링

pub mod rfc5424;
pub mod timestamp;

pub use rfc5424::ParsedRfc5424Fields;

use regex::Regex;

use crate::error::RelayPipelineError;

/// RFC 5424 헤더: `<PRI>1 YYYY-MM-DDTHH:MM:SS.mmm+HH:MM`
///
/// 메시지 시작에 고정하지 않으며, 헤더 앞의 바이트는 [`HeaderMatch::start`]로 구분합니다.
const RFC5424_HEADER_PATTERN: &str =
    r"(<\d{1,3}>1\s+)(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}[+-]\d{2}:\d{2})";

/// RFC 3164 헤더: `<PRI>Mon D HH:MM:SS` (월 이름 대소문자 무관)
const RFC3164_HEADER_PATTERN: &str = r"(<\d{1,3}>)([A-Za-z]{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})";

/// 판별된 메시지 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageFormat {
    /// ISO-8601 타임스탬프를 가진 구조화 syslog
    Rfc5424,
    /// `Mon D HH:MM:SS` 타임스탬프를 가진 전통 syslog
    Rfc3164,
    /// 어느 형식에도 해당하지 않음 (그대로 전달)
    Unrecognized,
}

impl MessageFormat {
    /// 메트릭 레이블 및 로그용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rfc5424 => "rfc5424",
            Self::Rfc3164 => "rfc3164",
            Self::Unrecognized => "unrecognized",
        }
    }
}

/// 헤더 타임스탬프 위치 정보
///
/// `prefix`는 타임스탬프 앞의 `<PRI>` (RFC 5424는 버전과 공백 포함) 부분입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMatch<'a> {
    /// 판별된 형식
    pub format: MessageFormat,
    /// 헤더(`<PRI>`) 시작 바이트 위치
    pub start: usize,
    /// 타임스탬프 앞부분
    pub prefix: &'a str,
    /// 타임스탬프 원문
    pub timestamp: &'a str,
    /// 타임스탬프 다음 바이트 위치
    pub end: usize,
}

impl<'a> HeaderMatch<'a> {
    /// 타임스탬프 이후의 나머지 텍스트
    pub fn rest(&self, text: &'a str) -> &'a str {
        &text[self.end..]
    }

    /// 헤더부터 시작하는 텍스트 (헤더 앞 바이트 제외)
    pub fn from_header(&self, text: &'a str) -> &'a str {
        &text[self.start..]
    }

    /// 헤더 앞에 붙은 텍스트
    pub fn leading(&self, text: &'a str) -> &'a str {
        &text[..self.start]
    }
}

/// 형식 판별 규칙 (평가 순서대로)
struct ClassifierRule {
    format: MessageFormat,
    pattern: Regex,
}

/// 메시지 형식 판별기
///
/// RFC 5424 규칙이 먼저 평가되고, 실패한 경우에만 RFC 3164 규칙을 시도합니다.
pub struct FormatClassifier {
    rules: Vec<ClassifierRule>,
}

impl FormatClassifier {
    /// 기본 규칙으로 판별기를 생성합니다.
    pub fn new() -> Result<Self, RelayPipelineError> {
        Ok(Self {
            rules: vec![
                ClassifierRule {
                    format: MessageFormat::Rfc5424,
                    pattern: Regex::new(RFC5424_HEADER_PATTERN)?,
                },
                ClassifierRule {
                    format: MessageFormat::Rfc3164,
                    pattern: Regex::new(RFC3164_HEADER_PATTERN)?,
                },
            ],
        })
    }

    /// 메시지 형식을 판별합니다.
    pub fn classify(&self, text: &str) -> MessageFormat {
        self.header(text)
            .map_or(MessageFormat::Unrecognized, |h| h.format)
    }

    /// 형식 판별과 함께 헤더 타임스탬프 위치를 반환합니다.
    pub fn header<'a>(&self, text: &'a str) -> Option<HeaderMatch<'a>> {
        self.rules.iter().find_map(|rule| {
            let caps = rule.pattern.captures(text)?;
            let prefix = caps.get(1)?;
            let timestamp = caps.get(2)?;
            Some(HeaderMatch {
                format: rule.format,
                start: prefix.start(),
                prefix: prefix.as_str(),
                timestamp: timestamp.as_str(),
                end: timestamp.end(),
            })
        })
    }
}

/// 메시지에 기록된 송신 호스트명을 추출합니다.
///
/// RFC 5424는 세 번째 토큰, RFC 3164는 타임스탬프 다음 토큰입니다.
pub fn header_hostname<'a>(text: &'a str, header: &HeaderMatch<'a>) -> Option<&'a str> {
    match header.format {
        MessageFormat::Rfc5424 => header.from_header(text).split_whitespace().nth(2),
        MessageFormat::Rfc3164 => header.rest(text).split_whitespace().next(),
        MessageFormat::Unrecognized => None,
    }
}
