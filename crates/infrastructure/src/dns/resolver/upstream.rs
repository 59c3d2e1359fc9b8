use crate::dns::forwarding::MessageBuilder;
use crate::dns::transport::{self, Transport};
use async_trait::async_trait;
use hickory_proto::op::Message;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use warden_dns_application::ports::{Request, Resolver, Response, ResponseType};
use warden_dns_domain::{DomainError, Upstream};

/// Terminal stage: one exchange with one upstream server, bounded by the
/// per-query timeout. No retries besides the TCP fallback for truncated
/// UDP replies.
pub struct UpstreamResolver {
    upstream: Upstream,
    transport: Transport,
    timeout: Duration,
}

impl UpstreamResolver {
    pub fn new(upstream: Upstream, timeout: Duration) -> Result<Self, DomainError> {
        let transport = transport::create_transport(&upstream)?;
        Ok(Self {
            upstream,
            transport,
            timeout,
        })
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    fn timeout_error(&self) -> DomainError {
        DomainError::UpstreamTimeout {
            upstream: self.upstream.to_string(),
        }
    }

    async fn exchange(
        &self,
        transport: &Transport,
        id: u16,
        query_bytes: &[u8],
        deadline: Instant,
    ) -> Result<Message, DomainError> {
        let budget = deadline.saturating_duration_since(Instant::now());
        if budget.is_zero() {
            return Err(self.timeout_error());
        }

        let reply = tokio::time::timeout_at(deadline, transport.send(query_bytes, budget))
            .await
            .map_err(|_| self.timeout_error())??;

        let message = Message::from_vec(&reply.bytes).map_err(|e| DomainError::InvalidResponse {
            upstream: self.upstream.to_string(),
            reason: e.to_string(),
        })?;

        if message.id() != id {
            return Err(DomainError::InvalidResponse {
                upstream: self.upstream.to_string(),
                reason: format!("reply id {} does not match query id {}", message.id(), id),
            });
        }

        Ok(message)
    }
}

#[async_trait]
impl Resolver for UpstreamResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        let start = Instant::now();
        let deadline = start + self.timeout;
        let (id, query_bytes) = MessageBuilder::upstream_query(&request.message)?;

        let mut reply = self
            .exchange(&self.transport, id, &query_bytes, deadline)
            .await?;

        if reply.truncated() {
            if let Upstream::Udp { addr } = &self.upstream {
                debug!(upstream = %self.upstream, "Response truncated (TC bit), retrying via TCP");
                let tcp = transport::create_transport(&Upstream::Tcp { addr: addr.clone() })?;
                reply = self.exchange(&tcp, id, &query_bytes, deadline).await?;
            }
        }

        reply
            .set_id(request.message.id())
            .set_recursion_desired(request.message.recursion_desired());

        debug!(
            upstream = %self.upstream,
            protocol = self.transport.protocol_name(),
            rcode = %reply.response_code(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Received upstream response"
        );

        Ok(Response::new(
            reply,
            ResponseType::Resolved,
            format!("RESOLVED ({})", self.upstream),
        ))
    }

    fn configuration(&self) -> Vec<String> {
        vec![
            format!("upstream '{}'", self.upstream),
            format!("timeout = {}ms", self.timeout.as_millis()),
        ]
    }

    fn name(&self) -> String {
        "upstream".to_string()
    }
}
