#![no_main]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use sysrelay_relay_pipeline::{MessageTransformer, PipelineConfigBuilder, RawDatagram};

const MAPPED: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 2, 108));
const CONTAINER_HOST: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 2, 110));

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    payload: Vec<u8>,
    /// 0: 보정 장비, 1: 컨테이너 호스트, 그 외: 미등록 소스
    source: u8,
    /// -24..=24 로 잘라서 사용
    offset: i8,
    dual_send: bool,
}

fuzz_target!(|input: FuzzInput| {
    let offset = i32::from(input.offset).clamp(-24, 24);
    let config = PipelineConfigBuilder::new()
        .ip_offset(MAPPED, offset)
        .ip_offset(CONTAINER_HOST, offset)
        .container_host("192.168.2.110")
        .date_strip("192.168.2.110")
        .date_strip_extended("192.168.2.110")
        .container("5183c0a146c0", "immichFrame-All")
        .dual_send(input.dual_send)
        .build()
        .expect("fuzz pipeline config must be valid");
    let transformer = MessageTransformer::new(&config).expect("transformer must build");

    let ip = match input.source {
        0 => MAPPED,
        1 => CONTAINER_HOST,
        _ => IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
    };
    let datagram = RawDatagram::new(Bytes::from(input.payload), SocketAddr::new(ip, 40514));

    let processed = transformer.process(&datagram);

    // 최대 두 개, 두 번째는 항상 수신 원문
    assert!(processed.datagrams.len() <= 2);
    if processed.datagrams.len() == 2 {
        assert!(input.dual_send);
        assert_ne!(processed.datagrams[0], processed.datagrams[1]);
        assert_eq!(processed.datagrams[1].as_ref(), datagram.text().as_bytes());
    }
    for out in &processed.datagrams {
        assert!(std::str::from_utf8(out).is_ok());
    }
});
