//! 메시지 변환 단계
//!
//! ```text
//! text -> FormatClassifier -> TimestampResolver -> Converter -> CosmeticRewriter -> DualEmitDecider
//! ```
//!
//! 보정값이 조회되지 않은 소스와 미인식 형식은 원문 그대로 통과합니다.
//! [`MessageTransformer`]는 소켓과 카운터에 의존하지 않는 순수 변환기입니다.

pub mod converter;
pub mod dual_emit;
pub mod resolver;
pub mod rewriter;

pub use converter::{Converted, Rfc5424ToRfc3164Converter};
pub use dual_emit::DualEmitDecider;
pub use resolver::{ResolvedOffset, TimestampResolver};
pub use rewriter::{CosmeticRewriter, RewriteTargets};

use std::borrow::Cow;
use std::net::IpAddr;

use bytes::Bytes;
use chrono::{Datelike, Local};

use crate::collector::RawDatagram;
use crate::config::PipelineConfig;
use crate::error::RelayPipelineError;
use crate::parser::{FormatClassifier, MessageFormat, header_hostname};

/// 변환 처리 결과 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// 변경 없이 통과
    Passthrough,
    /// RFC 5424 → RFC 3164 변환
    Converted,
    /// 필드 부족으로 타임스탬프만 교체
    Degraded,
    /// RFC 3164 헤더 타임스탬프 보정
    Adjusted,
    /// 타임스탬프 보정 없이 외형 보정만 적용
    Rewritten,
    /// 타임스탬프 파싱 실패로 원문 전달
    Failed,
}

impl Disposition {
    /// 타임스탬프가 보정되었는지 여부
    pub fn is_corrected(&self) -> bool {
        matches!(self, Self::Converted | Self::Degraded | Self::Adjusted)
    }

    /// 로그용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::Converted => "converted",
            Self::Degraded => "degraded",
            Self::Adjusted => "adjusted",
            Self::Rewritten => "rewritten",
            Self::Failed => "failed",
        }
    }
}

/// 텍스트 변환 결과
#[derive(Debug, Clone)]
pub struct TransformOutcome<'a> {
    /// 원문 형식
    pub format: MessageFormat,
    /// 조회된 보정값
    pub offset: Option<ResolvedOffset>,
    /// 처리 분류
    pub disposition: Disposition,
    /// 최종 메시지
    pub output: Cow<'a, str>,
    /// 원문도 함께 전송할지 여부
    pub dual_emit: bool,
}

/// 데이터그램 처리 결과
#[derive(Debug, Clone)]
pub struct ProcessedDatagram {
    /// 원문 형식
    pub format: MessageFormat,
    /// 처리 분류
    pub disposition: Disposition,
    /// 조회된 보정값
    pub offset: Option<ResolvedOffset>,
    /// 전송할 데이터그램 (변환본 먼저, 원본 나중)
    pub datagrams: Vec<Bytes>,
}

/// 메시지 변환기
pub struct MessageTransformer {
    classifier: FormatClassifier,
    resolver: TimestampResolver,
    converter: Rfc5424ToRfc3164Converter,
    rewriter: CosmeticRewriter,
    dual_emit: DualEmitDecider,
    /// RFC 3164 해석 연도 (None이면 현재 연도)
    reference_year: Option<i32>,
}

impl MessageTransformer {
    /// 파이프라인 설정으로 변환기를 생성합니다.
    pub fn new(config: &PipelineConfig) -> Result<Self, RelayPipelineError> {
        Ok(Self {
            classifier: FormatClassifier::new()?,
            resolver: TimestampResolver::new(
                config.ip_offsets.clone(),
                config.hostname_offsets.clone(),
            ),
            converter: Rfc5424ToRfc3164Converter::new(config.containers.clone())?,
            rewriter: CosmeticRewriter::new(RewriteTargets {
                container_hosts: config.container_hosts.clone(),
                date_strip: config.date_strip.clone(),
                date_strip_extended: config.date_strip_extended.clone(),
            })?,
            dual_emit: DualEmitDecider::new(config.dual_send),
            reference_year: None,
        })
    }

    /// RFC 3164 타임스탬프 해석 연도를 고정합니다.
    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// 형식 판별기
    pub fn classifier(&self) -> &FormatClassifier {
        &self.classifier
    }

    /// 텍스트를 변환합니다.
    pub fn transform<'a>(&self, text: &'a str, source_ip: IpAddr) -> TransformOutcome<'a> {
        let header = self.classifier.header(text);
        let format = header.map_or(MessageFormat::Unrecognized, |h| h.format);

        let Some(offset) = self.resolver.resolve(source_ip, text, header.as_ref()) else {
            return TransformOutcome {
                format,
                offset: None,
                disposition: Disposition::Passthrough,
                output: Cow::Borrowed(text),
                dual_emit: false,
            };
        };

        let (base, mut disposition) = match header {
            Some(h) if h.format == MessageFormat::Rfc5424 => {
                match self.converter.convert(text, &h, offset.hours) {
                    Ok(converted) => {
                        let disposition = if converted.degraded {
                            Disposition::Degraded
                        } else {
                            Disposition::Converted
                        };
                        (Cow::Owned(converted.text), disposition)
                    }
                    Err(e) => {
                        tracing::warn!(source = %source_ip, error = %e, "timestamp conversion failed, forwarding original");
                        (Cow::Borrowed(text), Disposition::Failed)
                    }
                }
            }
            Some(h) if h.format == MessageFormat::Rfc3164 => {
                let year = self.reference_year.unwrap_or_else(|| Local::now().year());
                match self.converter.adjust_rfc3164(text, &h, offset.hours, year) {
                    Ok(adjusted) => (Cow::Owned(adjusted), Disposition::Adjusted),
                    Err(e) => {
                        tracing::warn!(source = %source_ip, error = %e, "timestamp adjustment failed, forwarding original");
                        (Cow::Borrowed(text), Disposition::Failed)
                    }
                }
            }
            _ => (Cow::Borrowed(text), Disposition::Passthrough),
        };

        let output = if disposition == Disposition::Failed {
            base
        } else {
            let hostname = header.as_ref().and_then(|h| header_hostname(text, h));
            let rewritten = match self.rewriter.rewrite(&base, source_ip, hostname) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            match rewritten {
                Some(s) => {
                    if disposition == Disposition::Passthrough {
                        disposition = Disposition::Rewritten;
                    }
                    Cow::Owned(s)
                }
                None => base,
            }
        };

        let dual_emit =
            self.dual_emit.should_dual_emit(format, Some(&offset)) && *output != *text;

        TransformOutcome {
            format,
            offset: Some(offset),
            disposition,
            output,
            dual_emit,
        }
    }

    /// 데이터그램을 변환하여 전송할 페이로드 목록을 만듭니다.
    ///
    /// 비어 있는 데이터그램은 전송하지 않습니다.
    pub fn process(&self, datagram: &RawDatagram) -> ProcessedDatagram {
        let text = datagram.text();
        let outcome = self.transform(&text, datagram.source_ip());

        let mut datagrams = Vec::with_capacity(2);
        if !outcome.output.is_empty() {
            datagrams.push(encode(&outcome.output, &datagram.payload));
            if outcome.dual_emit {
                datagrams.push(encode(&text, &datagram.payload));
            }
        }

        ProcessedDatagram {
            format: outcome.format,
            disposition: outcome.disposition,
            offset: outcome.offset,
            datagrams,
        }
    }
}

/// 원문과 같으면 수신 버퍼를 그대로 재사용합니다.
fn encode(text: &str, payload: &Bytes) -> Bytes {
    if text.as_bytes() == payload.as_ref() {
        payload.clone()
    } else {
        Bytes::copy_from_slice(text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfigBuilder;
    use std::net::SocketAddr;

    const DEVICE: &str = "192.168.2.108";
    const UNRAID: &str = "192.168.2.110";

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn transformer() -> MessageTransformer {
        let config = PipelineConfigBuilder::new()
            .ip_offset(ip(DEVICE), 5)
            .ip_offset(ip(UNRAID), 5)
            .hostname_offset("HubitatC8Pro", 5)
            .container("5183c0a146c0", "immichFrame-All")
            .container_host(UNRAID)
            .date_strip(UNRAID)
            .build()
            .unwrap();
        MessageTransformer::new(&config)
            .unwrap()
            .with_reference_year(2025)
    }

    fn datagram(text: &str, from: &str) -> RawDatagram {
        let addr: SocketAddr = format!("{from}:40000").parse().unwrap();
        RawDatagram::new(Bytes::copy_from_slice(text.as_bytes()), addr)
    }

    #[test]
    fn scenario_a_converts_with_ip_offset() {
        let t = transformer();
        let msg = "<14>1 2025-08-03T10:15:30.123+00:00 HubitatC8Pro Watchdog.-.Motion x - - Sensor triggered";
        let out = t.transform(msg, ip(DEVICE));
        assert_eq!(out.format, MessageFormat::Rfc5424);
        assert_eq!(out.disposition, Disposition::Converted);
        assert_eq!(
            out.output,
            "<14>Aug 03 15:15:30 HubitatC8Pro Watchdog.-.Motion: Watchdog.-.Motion (x) - Sensor triggered"
        );
        assert!(out.dual_emit);
    }

    #[test]
    fn scenario_b_maps_container_hostname() {
        let t = transformer();
        let msg = "<30>1 2025-08-03T10:15:30.123+00:00 5183c0a146c0 frame 9 - - up";
        let out = t.transform(msg, ip(DEVICE));
        assert!(out.output.contains(" immichFrame-All frame: frame (9) - up"));
    }

    #[test]
    fn scenario_c_container_host_cleanup() {
        let t = transformer();
        let msg = "myapp[1234]: 2025-08-24 08:54:23.339023614 started";
        let out = t.transform(msg, ip(UNRAID));
        assert_eq!(out.format, MessageFormat::Unrecognized);
        assert_eq!(out.disposition, Disposition::Rewritten);
        assert_eq!(out.output, "myapp [1234]: started");
        assert!(!out.dual_emit);
    }

    #[test]
    fn converts_rfc5424_with_leading_space() {
        let t = transformer();
        let msg = " <14>1 2025-08-03T10:15:30.123+00:00 HubitatC8Pro app 1 - - x";
        let out = t.transform(msg, ip(DEVICE));
        assert_eq!(out.format, MessageFormat::Rfc5424);
        assert_eq!(out.disposition, Disposition::Converted);
        assert_eq!(out.output, "<14>Aug 03 15:15:30 HubitatC8Pro app: app (1) - x");
        assert!(out.dual_emit);
    }

    #[test]
    fn prefixed_rfc5424_resolves_by_hostname() {
        let t = transformer();
        let msg = "relay: <14>1 2025-08-03T10:15:30.123+00:00 HubitatC8Pro app 1 - - x";
        let out = t.transform(msg, ip("10.0.0.99"));
        assert_eq!(out.disposition, Disposition::Converted);
        assert!(out.output.starts_with("<14>Aug 03 15:15:30 HubitatC8Pro"));
    }

    #[test]
    fn scenario_d_degraded_timestamp_substitution() {
        let t = transformer();
        let msg = "<14>1 2025-08-03T10:15:30.123+00:00 HubitatC8Pro short";
        let out = t.transform(msg, ip(DEVICE));
        assert_eq!(out.disposition, Disposition::Degraded);
        assert_eq!(out.output, "<14>1 Aug 03 15:15:30 HubitatC8Pro short");
    }

    #[test]
    fn scenario_e_unrecognized_passes_through() {
        let t = transformer();
        let msg = "plain text without priority";
        let out = t.transform(msg, ip(DEVICE));
        assert_eq!(out.format, MessageFormat::Unrecognized);
        assert!(matches!(out.output, Cow::Borrowed(_)));
        assert_eq!(out.output, msg);
        assert!(!out.dual_emit);
    }

    #[test]
    fn unmapped_source_passes_through() {
        let t = transformer();
        let msg = "<14>1 2025-08-03T10:15:30.123+00:00 other app 1 - - x";
        let out = t.transform(msg, ip("10.0.0.1"));
        assert_eq!(out.disposition, Disposition::Passthrough);
        assert!(out.offset.is_none());
        assert_eq!(out.output, msg);
    }

    #[test]
    fn hostname_offset_applies_when_ip_unknown() {
        let t = transformer();
        let msg = "<14>1 2025-08-03T10:15:30.123+00:00 HubitatC8Pro app 1 - - x";
        let out = t.transform(msg, ip("10.0.0.1"));
        assert_eq!(out.disposition, Disposition::Converted);
        assert!(out.output.starts_with("<14>Aug 03 15:15:30 "));
    }

    #[test]
    fn rfc3164_header_is_shifted() {
        let t = transformer();
        let msg = "<13>Aug  3 10:15:30 hubitat app: body 10:15:30";
        let out = t.transform(msg, ip(DEVICE));
        assert_eq!(out.disposition, Disposition::Adjusted);
        assert_eq!(out.output, "<13>Aug 03 15:15:30 hubitat app: body 10:15:30");
        assert!(!out.dual_emit);
    }

    #[test]
    fn invalid_timestamp_forwards_original() {
        let t = transformer();
        let msg = "<14>1 2025-02-30T10:15:30.123+00:00 h app 1 - - x";
        let out = t.transform(msg, ip(DEVICE));
        assert_eq!(out.disposition, Disposition::Failed);
        assert_eq!(out.output, msg);
        assert!(!out.dual_emit);
    }

    #[test]
    fn process_emits_converted_then_original() {
        let t = transformer();
        let msg = "<14>1 2025-08-03T10:15:30.123+00:00 h app 1 - - x";
        let processed = t.process(&datagram(msg, DEVICE));
        assert_eq!(processed.datagrams.len(), 2);
        assert_eq!(
            processed.datagrams[0].as_ref(),
            b"<14>Aug 03 15:15:30 h app: app (1) - x"
        );
        assert_eq!(processed.datagrams[1].as_ref(), msg.as_bytes());
    }

    #[test]
    fn process_single_datagram_when_dual_send_off() {
        let config = PipelineConfigBuilder::new()
            .ip_offset(ip(DEVICE), 5)
            .dual_send(false)
            .build()
            .unwrap();
        let t = MessageTransformer::new(&config).unwrap();
        let msg = "<14>1 2025-08-03T10:15:30.123+00:00 h app 1 - - x";
        let processed = t.process(&datagram(msg, DEVICE));
        assert_eq!(processed.datagrams.len(), 1);
    }

    #[test]
    fn process_passthrough_reuses_payload() {
        let t = transformer();
        let d = datagram("hello", "10.0.0.1");
        let processed = t.process(&d);
        assert_eq!(processed.datagrams.len(), 1);
        assert_eq!(processed.datagrams[0], d.payload);
    }

    #[test]
    fn process_drops_empty_payload() {
        let t = transformer();
        let processed = t.process(&datagram("", DEVICE));
        assert!(processed.datagrams.is_empty());
    }

    #[test]
    fn process_strips_invalid_utf8() {
        let t = transformer();
        let addr: SocketAddr = "10.0.0.1:40000".parse().unwrap();
        let d = RawDatagram::new(Bytes::from_static(b"ok\xff!"), addr);
        let processed = t.process(&d);
        assert_eq!(processed.datagrams[0].as_ref(), b"ok!");
    }

    #[test]
    fn disposition_names() {
        assert!(Disposition::Converted.is_corrected());
        assert!(Disposition::Adjusted.is_corrected());
        assert!(!Disposition::Rewritten.is_corrected());
        assert_eq!(Disposition::Failed.as_str(), "failed");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn unmapped_sources_pass_through(msg in "\\PC{0,200}") {
                let t = transformer();
                let out = t.transform(&msg, ip("10.255.0.1"));
                prop_assert_eq!(&*out.output, msg.as_str());
                prop_assert!(!out.dual_emit);
            }

            #[test]
            fn offset_arithmetic_matches_wall_clock(
                hour in 0u32..24,
                minute in 0u32..60,
                hours in -12i32..=12,
            ) {
                let t = transformer_with_offset(hours);
                let msg = format!(
                    "<14>1 2025-06-15T{hour:02}:{minute:02}:00.000+00:00 h app 1 - - x"
                );
                let out = t.transform(&msg, ip(DEVICE));
                let total = (hour as i32 + hours).rem_euclid(24);
                let expected = format!("{total:02}:{minute:02}:00 h app:");
                prop_assert!(out.output.contains(&expected), "{}", out.output);
            }

            #[test]
            fn transform_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
                let t = transformer();
                let addr: SocketAddr = format!("{UNRAID}:1").parse().unwrap();
                let processed = t.process(&RawDatagram::new(Bytes::from(bytes), addr));
                prop_assert!(processed.datagrams.len() <= 2);
                for d in &processed.datagrams {
                    prop_assert!(std::str::from_utf8(d).is_ok());
                }
            }
        }

        fn transformer_with_offset(hours: i32) -> MessageTransformer {
            let config = PipelineConfigBuilder::new()
                .ip_offset(ip(DEVICE), hours)
                .build()
                .unwrap();
            MessageTransformer::new(&config).unwrap()
        }
    }
}
