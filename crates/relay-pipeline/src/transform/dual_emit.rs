//! 변환본/원본 동시 전송 결정

use crate::parser::MessageFormat;
use crate::transform::resolver::ResolvedOffset;

/// 동시 전송 판단기
///
/// 설정이 켜져 있고, 보정값이 조회되었으며, 원문이 RFC 5424일 때만 동시 전송합니다.
#[derive(Debug, Clone, Copy)]
pub struct DualEmitDecider {
    enabled: bool,
}

impl DualEmitDecider {
    /// 판단기를 생성합니다.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// 동시 전송 여부
    pub fn should_dual_emit(&self, raw_format: MessageFormat, offset: Option<&ResolvedOffset>) -> bool {
        self.enabled && offset.is_some() && raw_format == MessageFormat::Rfc5424
    }

    /// 설정 활성화 여부
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceIdentity;

    fn offset() -> ResolvedOffset {
        ResolvedOffset {
            hours: 5,
            matched: SourceIdentity::Hostname("HubitatC8Pro".to_owned()),
        }
    }

    #[test]
    fn triggers_for_resolved_rfc5424() {
        let d = DualEmitDecider::new(true);
        assert!(d.should_dual_emit(MessageFormat::Rfc5424, Some(&offset())));
    }

    #[test]
    fn disabled_never_triggers() {
        let d = DualEmitDecider::new(false);
        assert!(!d.is_enabled());
        assert!(!d.should_dual_emit(MessageFormat::Rfc5424, Some(&offset())));
    }

    #[test]
    fn requires_offset_and_rfc5424() {
        let d = DualEmitDecider::new(true);
        assert!(!d.should_dual_emit(MessageFormat::Rfc5424, None));
        assert!(!d.should_dual_emit(MessageFormat::Rfc3164, Some(&offset())));
        assert!(!d.should_dual_emit(MessageFormat::Unrecognized, Some(&offset())));
    }
}
