//! DNS-over-TLS transport (RFC 7858).
//!
//! The rustls client config is built once and shared, so session resumption
//! works across queries. Idle connections are kept per (host, SNI name) and
//! reused; a stale pooled connection falls back to a fresh handshake.

use super::lookup::resolve_upstream_addr;
use super::tcp::{read_with_length_prefix, send_with_length_prefix};
use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use dashmap::DashMap;
use rustls::pki_types::ServerName;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;
use tokio_rustls::client::TlsStream;
use tracing::debug;
use warden_dns_domain::{DomainError, UpstreamAddr};

const MAX_IDLE_PER_HOST: usize = 2;

static SHARED_TLS_CONFIG: LazyLock<Arc<rustls::ClientConfig>> = LazyLock::new(|| {
    // Both aws-lc-rs and ring are compiled in; rustls needs one installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    let mut root_store = rustls::RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
});

type PoolKey = (String, String);

static TLS_POOL: LazyLock<DashMap<PoolKey, Vec<TlsStream<TcpStream>>>> =
    LazyLock::new(DashMap::new);

pub struct TlsTransport {
    server_addr: UpstreamAddr,
    hostname: String,
}

impl TlsTransport {
    pub fn new(server_addr: UpstreamAddr, hostname: String) -> Self {
        Self {
            server_addr,
            hostname,
        }
    }

    fn label(&self) -> String {
        format!("tls://{}:{}", self.hostname, self.server_addr.port())
    }

    fn pool_key(&self) -> PoolKey {
        (self.server_addr.to_string(), self.hostname.clone())
    }

    fn take_pooled(&self) -> Option<TlsStream<TcpStream>> {
        TLS_POOL.get_mut(&self.pool_key())?.pop()
    }

    fn return_to_pool(&self, stream: TlsStream<TcpStream>) {
        let mut entry = TLS_POOL.entry(self.pool_key()).or_default();
        if entry.len() < MAX_IDLE_PER_HOST {
            entry.push(stream);
        }
    }

    async fn connect_new(&self, deadline: Instant) -> Result<TlsStream<TcpStream>, DomainError> {
        let connector = tokio_rustls::TlsConnector::from(SHARED_TLS_CONFIG.clone());

        let server_name = ServerName::try_from(self.hostname.clone()).map_err(|e| {
            DomainError::InvalidUpstream(format!("invalid TLS name '{}': {}", self.hostname, e))
        })?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        let server_addr = resolve_upstream_addr(&self.server_addr, remaining).await?;

        let tcp_stream = tokio::time::timeout_at(deadline, TcpStream::connect(server_addr))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| DomainError::network(self.label(), format!("connect failed: {}", e)))?;

        let tls_stream = tokio::time::timeout_at(deadline, connector.connect(server_name, tcp_stream))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| DomainError::network(self.label(), format!("TLS handshake failed: {}", e)))?;

        debug!(server = %server_addr, hostname = %self.hostname, "TLS connection established");
        Ok(tls_stream)
    }

    async fn exchange(
        &self,
        stream: &mut TlsStream<TcpStream>,
        message_bytes: &[u8],
        deadline: Instant,
    ) -> Result<Vec<u8>, DomainError> {
        tokio::time::timeout_at(deadline, send_with_length_prefix(stream, message_bytes))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| DomainError::network(self.label(), e))?;

        tokio::time::timeout_at(deadline, read_with_length_prefix(stream))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| DomainError::network(self.label(), e))
    }

    fn timeout_error(&self) -> DomainError {
        DomainError::UpstreamTimeout {
            upstream: self.label(),
        }
    }
}

#[async_trait]
impl DnsTransport for TlsTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let deadline = Instant::now() + timeout;

        if let Some(mut stream) = self.take_pooled() {
            match self.exchange(&mut stream, message_bytes, deadline).await {
                Ok(bytes) => {
                    debug!(upstream = %self.label(), "TLS query via pooled connection");
                    self.return_to_pool(stream);
                    return Ok(TransportResponse {
                        bytes,
                        protocol_used: "TLS",
                    });
                }
                Err(DomainError::UpstreamTimeout { upstream }) => {
                    return Err(DomainError::UpstreamTimeout { upstream });
                }
                Err(_) => {
                    debug!(upstream = %self.label(), "Pooled TLS connection stale, reconnecting");
                }
            }
        }

        let mut stream = self.connect_new(deadline).await?;
        let bytes = self.exchange(&mut stream, message_bytes, deadline).await?;

        debug!(upstream = %self.label(), response_len = bytes.len(), "TLS response received");
        self.return_to_pool(stream);

        Ok(TransportResponse {
            bytes,
            protocol_used: "TLS",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TLS"
    }
}
