//! UDP syslog 수신 및 전달 루프
//!
//! 수신 소켓에서 데이터그램을 하나씩 읽어 변환한 뒤 다운스트림으로 보냅니다.
//! 수신은 `recv_timeout` 단위로 끊어서 대기하며, 그 사이마다 실행 플래그를 확인합니다.
//! 데이터그램 단위 에러는 기록만 하고 루프는 계속 실행됩니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use bytes::Bytes;
use sysrelay_core::metrics as m;
use tokio::net::UdpSocket;

use super::RawDatagram;
use crate::error::RelayPipelineError;
use crate::stats::RelayStats;
use crate::transform::{Disposition, MessageTransformer};

/// `host:port` 전달 주소를 해석합니다.
pub async fn resolve_forward_addr(forward_addr: &str) -> Result<SocketAddr, RelayPipelineError> {
    let mut addrs =
        tokio::net::lookup_host(forward_addr)
            .await
            .map_err(|e| RelayPipelineError::Socket {
                addr: forward_addr.to_owned(),
                reason: format!("resolve failed: {}", e),
            })?;
    addrs.next().ok_or_else(|| RelayPipelineError::Socket {
        addr: forward_addr.to_owned(),
        reason: "no address resolved".to_owned(),
    })
}

/// 대상 주소 체계에 맞는 임시 송신 소켓을 엽니다.
pub async fn bind_outbound(target: SocketAddr) -> Result<UdpSocket, RelayPipelineError> {
    let local = if target.is_ipv4() {
        "0.0.0.0:0"
    } else {
        "[::]:0"
    };
    UdpSocket::bind(local)
        .await
        .map_err(|e| RelayPipelineError::Socket {
            addr: local.to_owned(),
            reason: e.to_string(),
        })
}

/// 릴레이 소켓 묶음
pub struct RelaySockets {
    /// 수신 소켓
    pub inbound: UdpSocket,
    /// 송신 소켓
    pub outbound: UdpSocket,
    /// 다운스트림 주소
    pub forward: SocketAddr,
}

impl RelaySockets {
    /// 수신 소켓을 바인드하고, 전달 주소를 해석하고, 송신 소켓을 엽니다.
    pub async fn open(listen_addr: &str, forward_addr: &str) -> Result<Self, RelayPipelineError> {
        let inbound =
            UdpSocket::bind(listen_addr)
                .await
                .map_err(|e| RelayPipelineError::Socket {
                    addr: listen_addr.to_owned(),
                    reason: e.to_string(),
                })?;
        let forward = resolve_forward_addr(forward_addr).await?;
        let outbound = bind_outbound(forward).await?;
        Ok(Self {
            inbound,
            outbound,
            forward,
        })
    }

    /// 실제 바인드된 수신 주소
    pub fn local_addr(&self) -> Result<SocketAddr, RelayPipelineError> {
        Ok(self.inbound.local_addr()?)
    }
}

/// 수신 루프 태스크
pub(crate) struct RelayTask {
    pub(crate) sockets: RelaySockets,
    pub(crate) transformer: Arc<MessageTransformer>,
    pub(crate) stats: Arc<RelayStats>,
    pub(crate) running: Arc<AtomicBool>,
    pub(crate) recv_timeout: Duration,
    pub(crate) max_datagram_size: usize,
}

impl RelayTask {
    /// 실행 플래그가 내려갈 때까지 수신/변환/전달을 반복합니다.
    ///
    /// 종료 시 소켓은 무조건 닫힙니다.
    pub(crate) async fn run(self) {
        let mut buf = vec![0u8; self.max_datagram_size];
        tracing::info!(
            forward = %self.sockets.forward,
            "relay loop running"
        );

        while self.running.load(Ordering::Acquire) {
            let received =
                tokio::time::timeout(self.recv_timeout, self.sockets.inbound.recv_from(&mut buf))
                    .await;
            let (len, peer) = match received {
                Err(_elapsed) => continue,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "receive failed");
                    self.stats.record_error();
                    metrics::counter!(m::RELAY_ERRORS_TOTAL).increment(1);
                    continue;
                }
                Ok(Ok(v)) => v,
            };

            let datagram = RawDatagram::new(Bytes::copy_from_slice(&buf[..len]), peer);
            self.relay_one(&datagram).await;
        }

        tracing::info!("relay loop exited");
    }

    /// 데이터그램 하나를 변환하여 전달합니다.
    async fn relay_one(&self, datagram: &RawDatagram) {
        let started = Instant::now();
        let processed = self.transformer.process(datagram);
        metrics::histogram!(m::RELAY_TRANSFORM_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        self.stats.record_received();
        metrics::counter!(m::RELAY_DATAGRAMS_RECEIVED_TOTAL, m::LABEL_FORMAT => processed.format.as_str())
            .increment(1);

        match processed.disposition {
            d if d.is_corrected() => {
                self.stats.record_processed();
                metrics::counter!(m::RELAY_MESSAGES_CONVERTED_TOTAL).increment(1);
            }
            Disposition::Failed => {
                self.stats.record_failure();
                metrics::counter!(m::RELAY_CONVERSION_FAILURES_TOTAL).increment(1);
            }
            _ => {
                self.stats.record_passthrough();
                metrics::counter!(m::RELAY_MESSAGES_PASSTHROUGH_TOTAL).increment(1);
            }
        }

        tracing::debug!(
            source = %datagram.source,
            format = processed.format.as_str(),
            disposition = processed.disposition.as_str(),
            offset_hours = processed.offset.as_ref().map(|o| o.hours),
            outputs = processed.datagrams.len(),
            "datagram processed"
        );

        for payload in &processed.datagrams {
            match self
                .sockets
                .outbound
                .send_to(payload, self.sockets.forward)
                .await
            {
                Ok(_) => {
                    self.stats.record_forwarded();
                    metrics::counter!(m::RELAY_DATAGRAMS_FORWARDED_TOTAL).increment(1);
                }
                Err(e) => {
                    tracing::warn!(
                        forward = %self.sockets.forward,
                        error = %e,
                        "forward failed"
                    );
                    self.stats.record_error();
                    metrics::counter!(m::RELAY_ERRORS_TOTAL).increment(1);
                }
            }
        }

        if processed.datagrams.len() > 1 {
            self.stats.record_dual_emit();
            metrics::counter!(m::RELAY_DUAL_EMIT_TOTAL).increment(1);
        }
    }
}
