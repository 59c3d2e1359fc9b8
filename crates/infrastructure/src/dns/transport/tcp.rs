//! TCP transport (RFC 1035 §4.2.2): every message carries a two-byte length prefix.

use super::lookup::resolve_upstream_addr;
use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::debug;
use warden_dns_domain::{DomainError, UpstreamAddr};

const MAX_TCP_MESSAGE_SIZE: usize = 65535;

pub struct TcpTransport {
    upstream_addr: UpstreamAddr,
}

impl TcpTransport {
    pub fn new(upstream_addr: UpstreamAddr) -> Self {
        Self { upstream_addr }
    }

    fn label(&self) -> String {
        format!("tcp://{}", self.upstream_addr)
    }

    fn timeout_error(&self) -> DomainError {
        DomainError::UpstreamTimeout {
            upstream: self.label(),
        }
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let deadline = Instant::now() + timeout;
        let server_addr = resolve_upstream_addr(&self.upstream_addr, timeout).await?;

        let mut stream = tokio::time::timeout_at(deadline, TcpStream::connect(server_addr))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| DomainError::network(self.label(), format!("connect failed: {}", e)))?;

        stream
            .set_nodelay(true)
            .map_err(|e| DomainError::network(self.label(), e))?;

        tokio::time::timeout_at(deadline, send_with_length_prefix(&mut stream, message_bytes))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| DomainError::network(self.label(), e))?;

        debug!(server = %server_addr, message_len = message_bytes.len(), "TCP query sent");

        let response_bytes = tokio::time::timeout_at(deadline, read_with_length_prefix(&mut stream))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| DomainError::network(self.label(), e))?;

        debug!(server = %server_addr, response_len = response_bytes.len(), "TCP response received");

        Ok(TransportResponse {
            bytes: response_bytes,
            protocol_used: "TCP",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}

/// Writes one length-prefixed DNS message. Shared with the TLS transport
/// and the TCP listener.
pub async fn send_with_length_prefix<S>(stream: &mut S, message_bytes: &[u8]) -> Result<(), String>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len())
        .map_err(|_| format!("message too large: {} bytes", message_bytes.len()))?;

    stream
        .write_all(&length.to_be_bytes())
        .await
        .map_err(|e| format!("failed to write length prefix: {}", e))?;
    stream
        .write_all(message_bytes)
        .await
        .map_err(|e| format!("failed to write DNS message: {}", e))?;
    stream
        .flush()
        .await
        .map_err(|e| format!("failed to flush stream: {}", e))?;

    Ok(())
}

/// Reads one length-prefixed DNS message.
pub async fn read_with_length_prefix<S>(stream: &mut S) -> Result<Vec<u8>, String>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| format!("failed to read message length: {}", e))?;

    let message_len = u16::from_be_bytes(len_buf) as usize;
    if message_len > MAX_TCP_MESSAGE_SIZE {
        return Err(format!("message too large: {} bytes", message_len));
    }

    let mut message = vec![0u8; message_len];
    stream
        .read_exact(&mut message)
        .await
        .map_err(|e| format!("failed to read message body: {}", e))?;

    Ok(message)
}
