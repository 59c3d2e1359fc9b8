//! DNS-over-HTTPS transport (RFC 8484): the wire message is POSTed as
//! `application/dns-message` and the body of the reply is the answer.

use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;
use warden_dns_domain::DomainError;

static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .use_rustls_tls()
        .pool_max_idle_per_host(4)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
});

const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";

pub struct HttpsTransport {
    url: String,
}

impl HttpsTransport {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

#[async_trait]
impl DnsTransport for HttpsTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        debug!(url = %self.url, message_len = message_bytes.len(), "Sending DoH query");

        let exchange = async {
            let response = SHARED_CLIENT
                .post(&self.url)
                .header("Content-Type", DNS_MESSAGE_CONTENT_TYPE)
                .header("Accept", DNS_MESSAGE_CONTENT_TYPE)
                .body(message_bytes.to_vec())
                .send()
                .await
                .map_err(|e| DomainError::network(&self.url, e))?;

            let status = response.status();
            if !status.is_success() {
                return Err(DomainError::InvalidResponse {
                    upstream: self.url.clone(),
                    reason: format!("HTTP {}", status.as_u16()),
                });
            }

            response
                .bytes()
                .await
                .map_err(|e| DomainError::network(&self.url, e))
        };

        let body = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| DomainError::UpstreamTimeout {
                upstream: self.url.clone(),
            })??;

        debug!(url = %self.url, response_len = body.len(), "DoH response received");

        Ok(TransportResponse {
            bytes: body.to_vec(),
            protocol_used: "HTTPS",
        })
    }

    fn protocol_name(&self) -> &'static str {
        "HTTPS"
    }
}
