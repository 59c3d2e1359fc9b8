pub mod https;
pub mod lookup;
pub mod tcp;
pub mod tls;
pub mod udp;

use async_trait::async_trait;
use std::time::Duration;
use warden_dns_domain::{DomainError, Upstream};

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,
    pub protocol_used: &'static str,
}

/// One request/response exchange with an upstream server.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;

    fn protocol_name(&self) -> &'static str;
}

pub enum Transport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
    #[cfg(feature = "dns-over-rustls")]
    Tls(tls::TlsTransport),
    #[cfg(feature = "dns-over-https")]
    Https(https::HttpsTransport),
}

impl Transport {
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            #[cfg(feature = "dns-over-rustls")]
            Self::Tls(t) => DnsTransport::send(t, message_bytes, timeout).await,
            #[cfg(feature = "dns-over-https")]
            Self::Https(t) => DnsTransport::send(t, message_bytes, timeout).await,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Udp(t) => t.protocol_name(),
            Self::Tcp(t) => t.protocol_name(),
            #[cfg(feature = "dns-over-rustls")]
            Self::Tls(t) => t.protocol_name(),
            #[cfg(feature = "dns-over-https")]
            Self::Https(t) => t.protocol_name(),
        }
    }
}

pub fn create_transport(upstream: &Upstream) -> Result<Transport, DomainError> {
    match upstream {
        Upstream::Udp { addr } => Ok(Transport::Udp(udp::UdpTransport::new(addr.clone()))),
        Upstream::Tcp { addr } => Ok(Transport::Tcp(tcp::TcpTransport::new(addr.clone()))),

        #[cfg(feature = "dns-over-rustls")]
        Upstream::Tls { addr, hostname } => Ok(Transport::Tls(tls::TlsTransport::new(
            addr.clone(),
            hostname.to_string(),
        ))),

        #[cfg(not(feature = "dns-over-rustls"))]
        Upstream::Tls { addr, .. } => {
            tracing::warn!(upstream = %addr, "TLS feature not enabled, falling back to TCP");
            Ok(Transport::Tcp(tcp::TcpTransport::new(addr.clone())))
        }

        #[cfg(feature = "dns-over-https")]
        Upstream::Https { url, .. } => Ok(Transport::Https(https::HttpsTransport::new(
            url.to_string(),
        ))),

        #[cfg(not(feature = "dns-over-https"))]
        Upstream::Https { url, .. } => Err(DomainError::InvalidUpstream(format!(
            "HTTPS feature not enabled, cannot use {}",
            url
        ))),
    }
}
