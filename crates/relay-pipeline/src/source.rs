//! 송신 장비 식별자
//!
//! 설정의 소스 목록은 IP 문자열과 호스트명이 섞여 있습니다.
//! [`SourceIdentity`]는 이를 구분하여 보관하고, [`SourceSet`]은
//! 데이터그램의 송신 IP 또는 헤더 호스트명으로 소속 여부를 판단합니다.

use std::collections::HashSet;
use std::fmt;
use std::net::IpAddr;

/// 송신 장비 식별자 (IP 주소 또는 호스트명)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceIdentity {
    /// 데이터그램 송신 주소
    Ip(IpAddr),
    /// 메시지 헤더에 기록된 호스트명
    Hostname(String),
}

impl SourceIdentity {
    /// 설정 문자열을 식별자로 변환합니다.
    ///
    /// IP로 파싱되면 [`SourceIdentity::Ip`], 아니면 호스트명으로 취급합니다.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.parse::<IpAddr>() {
            Ok(ip) => Self::Ip(ip.to_canonical()),
            Err(_) => Self::Hostname(trimmed.to_owned()),
        }
    }
}

impl fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{ip}"),
            Self::Hostname(name) => f.write_str(name),
        }
    }
}

/// 재작성 규칙이 적용되는 장비 집합
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    ips: HashSet<IpAddr>,
    hostnames: HashSet<String>,
}

impl SourceSet {
    /// 빈 집합을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 식별자를 추가합니다.
    pub fn insert(&mut self, identity: SourceIdentity) {
        match identity {
            SourceIdentity::Ip(ip) => {
                self.ips.insert(ip);
            }
            SourceIdentity::Hostname(name) => {
                self.hostnames.insert(name);
            }
        }
    }

    /// 송신 IP 또는 헤더 호스트명이 집합에 속하는지 확인합니다.
    pub fn matches(&self, source_ip: IpAddr, hostname: Option<&str>) -> bool {
        if self.ips.contains(&source_ip.to_canonical()) {
            return true;
        }
        hostname.is_some_and(|h| self.hostnames.contains(h))
    }

    /// 집합이 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.ips.is_empty() && self.hostnames.is_empty()
    }

    /// 식별자 개수
    pub fn len(&self) -> usize {
        self.ips.len() + self.hostnames.len()
    }
}

impl<S: AsRef<str>> FromIterator<S> for SourceSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for entry in iter {
            set.insert(SourceIdentity::parse(entry.as_ref()));
        }
        set
    }
}
