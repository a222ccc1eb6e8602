//! RFC 5424 필드 분리
//!
//! 헤더를 첫 7개의 단일 공백 경계로 나누어 8개 필드를 얻습니다.
//! 본문(8번째 필드)은 공백을 포함한 원문 그대로 보존됩니다.

/// RFC 5424 메시지 필드
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedRfc5424Fields<'a> {
    /// `<PRI>VERSION` (예: `<14>1`)
    pub priority_version: &'a str,
    /// ISO-8601 타임스탬프
    pub timestamp: &'a str,
    /// 호스트명 (컨테이너 ID일 수 있음)
    pub hostname: &'a str,
    /// 애플리케이션 이름
    pub app_name: &'a str,
    /// 프로세스 ID
    pub proc_id: &'a str,
    /// 메시지 ID
    pub msg_id: &'a str,
    /// 구조화 데이터
    pub structured_data: &'a str,
    /// 본문
    pub body: &'a str,
}

impl<'a> ParsedRfc5424Fields<'a> {
    /// 필드 개수
    pub const FIELD_COUNT: usize = 8;

    /// 메시지를 필드로 분리합니다. 필드가 8개 미만이면 `None`.
    pub fn split(text: &'a str) -> Option<Self> {
        let mut parts = text.splitn(Self::FIELD_COUNT, ' ');
        Some(Self {
            priority_version: parts.next()?,
            timestamp: parts.next()?,
            hostname: parts.next()?,
            app_name: parts.next()?,
            proc_id: parts.next()?,
            msg_id: parts.next()?,
            structured_data: parts.next()?,
            body: parts.next()?,
        })
    }

    /// 버전 숫자를 제외한 `<PRI>` 토큰
    ///
    /// 마지막 문자 하나만 제거하며, `>` 앞에서 멈추지 않으면 원문을 반환합니다.
    pub fn priority(&self) -> &'a str {
        self.priority_version
            .strip_suffix('1')
            .filter(|p| p.ends_with('>'))
            .unwrap_or(self.priority_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_full_message() {
        let msg = "<14>1 2025-08-03T10:15:30.123+00:00 host app 123 ID47 - hello world";
        let f = ParsedRfc5424Fields::split(msg).unwrap();
        assert_eq!(f.priority_version, "<14>1");
        assert_eq!(f.timestamp, "2025-08-03T10:15:30.123+00:00");
        assert_eq!(f.hostname, "host");
        assert_eq!(f.app_name, "app");
        assert_eq!(f.proc_id, "123");
        assert_eq!(f.msg_id, "ID47");
        assert_eq!(f.structured_data, "-");
        assert_eq!(f.body, "hello world");
    }

    #[test]
    fn body_preserves_inner_spacing() {
        let msg = "<14>1 2025-08-03T10:15:30.123+00:00 h a 1 - -   spaced   out ";
        let f = ParsedRfc5424Fields::split(msg).unwrap();
        assert_eq!(f.body, "  spaced   out ");
    }

    #[test]
    fn split_rejects_short_messages() {
        assert!(ParsedRfc5424Fields::split("<14>1 2025-08-03T10:15:30.123+00:00 host").is_none());
        assert!(ParsedRfc5424Fields::split("").is_none());
    }

    #[test]
    fn split_accepts_empty_body() {
        let msg = "<14>1 2025-08-03T10:15:30.123+00:00 h a 1 - - ";
        let f = ParsedRfc5424Fields::split(msg).unwrap();
        assert_eq!(f.body, "");
    }

    #[test]
    fn priority_strips_only_version_digit() {
        let msg = "<11>1 2025-08-03T10:15:30.123+00:00 h a 1 - - x";
        let f = ParsedRfc5424Fields::split(msg).unwrap();
        assert_eq!(f.priority(), "<11>");

        let msg = "<191>1 2025-08-03T10:15:30.123+00:00 h a 1 - - x";
        let f = ParsedRfc5424Fields::split(msg).unwrap();
        assert_eq!(f.priority(), "<191>");
    }

    #[test]
    fn priority_without_version_is_kept() {
        let msg = "<14> 2025-08-03T10:15:30.123+00:00 h a 1 - - x";
        let f = ParsedRfc5424Fields::split(msg).unwrap();
        assert_eq!(f.priority(), "<14>");
    }
}
