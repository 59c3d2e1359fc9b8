//! UDP transport (RFC 1035 §4.2.1).
//!
//! Messages are sent as-is, without framing. A reply with the TC bit set is
//! returned like any other; retrying over TCP is the caller's decision.

use super::lookup::resolve_upstream_addr;
use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, warn};
use warden_dns_domain::{DomainError, UpstreamAddr};

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct UdpTransport {
    server_addr: UpstreamAddr,
}

impl UdpTransport {
    pub fn new(server_addr: UpstreamAddr) -> Self {
        Self { server_addr }
    }

    fn label(&self) -> String {
        format!("udp://{}", self.server_addr)
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let deadline = Instant::now() + timeout;
        let server_addr = resolve_upstream_addr(&self.server_addr, timeout).await?;

        let bind_addr = if server_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };

        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(|e| DomainError::network(self.label(), format!("bind failed: {}", e)))?;

        let bytes_sent = socket
            .send_to(message_bytes, server_addr)
            .await
            .map_err(|e| DomainError::network(self.label(), format!("send failed: {}", e)))?;

        debug!(server = %server_addr, bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        loop {
            let (bytes_received, from_addr) =
                tokio::time::timeout_at(deadline, socket.recv_from(&mut recv_buf))
                    .await
                    .map_err(|_| DomainError::UpstreamTimeout {
                        upstream: self.label(),
                    })?
                    .map_err(|e| {
                        DomainError::network(self.label(), format!("receive failed: {}", e))
                    })?;

            if from_addr != server_addr {
                warn!(
                    expected = %server_addr,
                    received_from = %from_addr,
                    "Discarding UDP datagram from unexpected source"
                );
                continue;
            }

            recv_buf.truncate(bytes_received);
            debug!(server = %server_addr, bytes_received, "UDP response received");

            return Ok(TransportResponse {
                bytes: recv_buf,
                protocol_used: "UDP",
            });
        }
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}
