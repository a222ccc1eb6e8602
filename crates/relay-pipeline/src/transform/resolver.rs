//! 송신 장비별 시간 보정값 조회
//!
//! IP 테이블이 항상 우선입니다. IP로 찾지 못한 경우에만
//! RFC 5424 헤더의 호스트명으로 호스트명 테이블을 조회합니다.

use std::collections::HashMap;
use std::net::IpAddr;

use crate::parser::{HeaderMatch, MessageFormat, header_hostname};
use crate::source::SourceIdentity;

/// 조회된 시간 보정값
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOffset {
    /// 더할 시간 (시)
    pub hours: i32,
    /// 일치한 식별자
    pub matched: SourceIdentity,
}

/// 시간 보정값 조회기
#[derive(Debug, Clone, Default)]
pub struct TimestampResolver {
    ip_offsets: HashMap<IpAddr, i32>,
    hostname_offsets: HashMap<String, i32>,
}

impl TimestampResolver {
    /// 보정 테이블로 조회기를 생성합니다.
    pub fn new(ip_offsets: HashMap<IpAddr, i32>, hostname_offsets: HashMap<String, i32>) -> Self {
        Self {
            ip_offsets,
            hostname_offsets,
        }
    }

    /// 송신 IP와 메시지 헤더로 보정값을 조회합니다.
    pub fn resolve(
        &self,
        source_ip: IpAddr,
        text: &str,
        header: Option<&HeaderMatch<'_>>,
    ) -> Option<ResolvedOffset> {
        let ip = source_ip.to_canonical();
        if let Some(hours) = self.ip_offsets.get(&ip) {
            return Some(ResolvedOffset {
                hours: *hours,
                matched: SourceIdentity::Ip(ip),
            });
        }

        let header = header.filter(|h| h.format == MessageFormat::Rfc5424)?;
        let hostname = header_hostname(text, header)?;
        self.hostname_offsets
            .get(hostname)
            .map(|hours| ResolvedOffset {
                hours: *hours,
                matched: SourceIdentity::Hostname(hostname.to_owned()),
            })
    }

    /// 등록된 항목 수 (IP, 호스트명)
    pub fn table_sizes(&self) -> (usize, usize) {
        (self.ip_offsets.len(), self.hostname_offsets.len())
    }
}
