//! 데이터그램 수신 및 전달
//!
//! - [`RawDatagram`]: 소켓에서 읽은 원시 데이터그램
//! - [`syslog_udp`]: UDP 수신 → 변환 → 전달 루프
//!
//! 수신 루프는 자체 tokio 태스크에서 실행되며, 데이터그램 하나를
//! 변환/전달까지 마친 뒤 다음 수신을 진행합니다.

pub mod syslog_udp;

use std::borrow::Cow;
use std::net::{IpAddr, SocketAddr};
use std::time::SystemTime;

use bytes::Bytes;

/// 수신한 원시 데이터그램
///
/// 소켓 읽기가 생성하고 변환기가 소비합니다. 생성 후 변경되지 않습니다.
#[derive(Debug, Clone)]
pub struct RawDatagram {
    /// 원시 바이트
    pub payload: Bytes,
    /// 송신 주소
    pub source: SocketAddr,
    /// 수신 시각
    pub received_at: SystemTime,
}

impl RawDatagram {
    /// 새 RawDatagram을 생성합니다.
    pub fn new(payload: Bytes, source: SocketAddr) -> Self {
        Self {
            payload,
            source,
            received_at: SystemTime::now(),
        }
    }

    /// 정규화된 송신 IP (IPv4-mapped IPv6는 IPv4로 변환)
    pub fn source_ip(&self) -> IpAddr {
        self.source.ip().to_canonical()
    }

    /// 페이로드를 UTF-8로 디코딩합니다. 잘못된 시퀀스는 버립니다.
    pub fn text(&self) -> Cow<'_, str> {
        decode_lossy(&self.payload)
    }
}

/// 잘못된 UTF-8 시퀀스를 제거하며 디코딩합니다.
///
/// 입력이 올바른 UTF-8이면 복사 없이 빌려옵니다.
pub fn decode_lossy(bytes: &[u8]) -> Cow<'_, str> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    Cow::Owned(out)
}
