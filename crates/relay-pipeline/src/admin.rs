//! 관리 데이터그램
//!
//! 릴레이 자신의 상태(시작/종료/재시작/상태조회/통계)를 다운스트림 수집기로 보냅니다.
//! 형식: `<PRI>Mon DD HH:MM:SS host app: key:value | key:value`

use std::fmt;
use std::net::SocketAddr;

use chrono::{DateTime, Local};
use sysrelay_core::config::MonitorConfig;
use sysrelay_core::metrics as m;
use tokio::net::UdpSocket;

use crate::error::RelayPipelineError;
use crate::parser::timestamp::render_traditional;
use crate::stats::{RelayStatus, StatsSnapshot};

/// 관리 메시지 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminKind {
    Startup,
    Shutdown,
    Restart,
    Health,
    Stats,
}

impl AdminKind {
    /// 메시지 및 메트릭 레이블 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startup => "startup",
            Self::Shutdown => "shutdown",
            Self::Restart => "restart",
            Self::Health => "health",
            Self::Stats => "stats",
        }
    }
}

impl fmt::Display for AdminKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 관리 메시지 헤더 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    /// syslog PRI 값
    pub priority: u8,
    /// 헤더 호스트명
    pub hostname: String,
    /// 헤더 앱 이름
    pub app_name: String,
}

impl AdminIdentity {
    /// `[monitor]` 설정에서 헤더 정보를 가져옵니다.
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            priority: config.priority,
            hostname: config.hostname.clone(),
            app_name: config.app_name.clone(),
        }
    }
}

impl Default for AdminIdentity {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

/// 관리 메시지
///
/// 첫 필드는 항상 `event:<kind>` 입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminMessage {
    kind: AdminKind,
    fields: Vec<(String, String)>,
}

impl AdminMessage {
    /// 새 메시지를 생성합니다.
    pub fn new(kind: AdminKind) -> Self {
        Self {
            kind,
            fields: vec![("event".to_owned(), kind.as_str().to_owned())],
        }
    }

    /// 필드를 추가합니다.
    pub fn field(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.fields.push((key.into(), value.to_string()));
        self
    }

    /// 상태 조회 결과로 `health` 메시지를 만듭니다.
    pub fn health(status: &RelayStatus) -> Self {
        let last = status
            .last_message_time
            .map_or_else(|| "never".to_owned(), |t| t.with_timezone(&Local).to_rfc3339());
        Self::new(AdminKind::Health)
            .field("running", status.running)
            .field("messages", status.message_count)
            .field("last_message", last)
    }

    /// 카운터 스냅샷으로 `stats` 메시지를 만듭니다.
    pub fn stats(snapshot: &StatsSnapshot, uptime_secs: u64) -> Self {
        Self::new(AdminKind::Stats)
            .field("messages", snapshot.processed)
            .field("received", snapshot.received)
            .field("forwarded", snapshot.forwarded)
            .field("dual", snapshot.dual_emitted)
            .field("failures", snapshot.failures)
            .field("errors", snapshot.errors)
            .field("uptime", format!("{uptime_secs}s"))
    }

    /// 메시지 종류
    pub fn kind(&self) -> AdminKind {
        self.kind
    }

    /// 주어진 시각으로 렌더링합니다.
    pub fn render(&self, identity: &AdminIdentity, now: &DateTime<Local>) -> String {
        let body = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}:{}", k, sanitize_value(v)))
            .collect::<Vec<_>>()
            .join(" | ");
        format!(
            "<{}>{} {} {}: {}",
            identity.priority,
            render_traditional(now),
            identity.hostname,
            identity.app_name,
            body
        )
    }
}

/// 값 안의 구분자와 줄바꿈을 치환합니다.
fn sanitize_value(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '|' => '/',
            '\r' | '\n' => ' ',
            other => other,
        })
        .collect()
}

/// 관리 메시지 전송기
///
/// 릴레이 루프와 별개의 송신 소켓을 사용하므로 루프가 정지된 상태에서도 전송할 수 있습니다.
pub struct AdminSender {
    socket: UdpSocket,
    target: SocketAddr,
    identity: AdminIdentity,
}

impl AdminSender {
    /// 전달 주소를 해석하고 송신 소켓을 엽니다.
    pub async fn connect(
        forward_addr: &str,
        identity: AdminIdentity,
    ) -> Result<Self, RelayPipelineError> {
        let target = crate::collector::syslog_udp::resolve_forward_addr(forward_addr).await?;
        let socket = crate::collector::syslog_udp::bind_outbound(target).await?;
        Ok(Self {
            socket,
            target,
            identity,
        })
    }

    /// 메시지를 현재 시각으로 렌더링하여 전송합니다.
    pub async fn send(&self, message: &AdminMessage) -> Result<(), RelayPipelineError> {
        let text = message.render(&self.identity, &Local::now());
        self.socket
            .send_to(text.as_bytes(), self.target)
            .await
            .map_err(|e| RelayPipelineError::Socket {
                addr: self.target.to_string(),
                reason: e.to_string(),
            })?;
        metrics::counter!(m::MONITOR_ADMIN_MESSAGES_TOTAL, m::LABEL_KIND => message.kind().as_str())
            .increment(1);
        tracing::debug!(kind = %message.kind(), "admin datagram sent");
        Ok(())
    }

    /// 전송 대상 주소
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::RelayStats;
    use chrono::TimeZone;
    use regex::Regex;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 8, 3, 15, 15, 30).unwrap()
    }

    fn admin_shape() -> Regex {
        Regex::new(r"^<\d{1,3}>[A-Z][a-z]{2} \d{2} \d{2}:\d{2}:\d{2} \S+ \S+: \w+:[^|]*( \| \w+:[^|]*)*$")
            .unwrap()
    }

    #[test]
    fn render_startup() {
        let msg = AdminMessage::new(AdminKind::Startup)
            .field("version", "0.1.0")
            .field("listen", "0.0.0.0:513");
        let text = msg.render(&AdminIdentity::default(), &now());
        assert_eq!(
            text,
            "<14>Aug 03 15:15:30 sysrelay SyslogRelay: event:startup | version:0.1.0 | listen:0.0.0.0:513"
        );
        assert!(admin_shape().is_match(&text));
    }

    #[test]
    fn render_sanitizes_separators() {
        let msg = AdminMessage::new(AdminKind::Restart).field("reason", "a|b\nc");
        let text = msg.render(&AdminIdentity::default(), &now());
        assert!(text.ends_with("event:restart | reason:a/b c"));
    }

    #[test]
    fn health_message_fields() {
        let stats = RelayStats::new();
        let status = RelayStatus::new(false, &stats);
        let text = AdminMessage::health(&status).render(&AdminIdentity::default(), &now());
        assert!(text.contains("event:health | running:false | messages:0 | last_message:never"));
        assert!(admin_shape().is_match(&text));
    }

    #[test]
    fn stats_message_fields() {
        let stats = RelayStats::new();
        stats.record_received();
        stats.record_processed();
        let text = AdminMessage::stats(&stats.snapshot(), 42)
            .render(&AdminIdentity::default(), &now());
        assert!(text.contains("messages:1 | received:1"));
        assert!(text.ends_with("uptime:42s"));
        assert!(admin_shape().is_match(&text));
    }

    #[test]
    fn identity_from_config() {
        let mut config = MonitorConfig::default();
        config.priority = 30;
        config.hostname = "relay01".to_owned();
        let identity = AdminIdentity::from_config(&config);
        let text = AdminMessage::new(AdminKind::Shutdown).render(&identity, &now());
        assert!(text.starts_with("<30>Aug 03 15:15:30 relay01 SyslogRelay: event:shutdown"));
    }

    #[tokio::test]
    async fn sender_delivers_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap().to_string();

        let sender = AdminSender::connect(&addr, AdminIdentity::default())
            .await
            .unwrap();
        sender
            .send(&AdminMessage::new(AdminKind::Health))
            .await
            .unwrap();

        let mut buf = [0u8; 512];
        let (len, _) = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            receiver.recv_from(&mut buf),
        )
        .await
        .unwrap()
        .unwrap();
        let text = std::str::from_utf8(&buf[..len]).unwrap();
        assert!(text.ends_with("sysrelay SyslogRelay: event:health"));
    }
}
