use hickory_proto::op::{Message, Query};
use hickory_proto::rr::RecordType;
use std::fmt;
use std::net::IpAddr;
use tracing::Span;
use warden_dns_domain::domain_name::normalize_domain;

/// One inbound query as it travels down the pipeline.
///
/// Built once per query by the listener. Stages never mutate a request in
/// place; the client-names stage hands an annotated copy to its successor.
#[derive(Debug, Clone)]
pub struct Request {
    pub client_ip: IpAddr,
    pub client_names: Vec<String>,
    pub message: Message,
    /// Logging context for everything done on behalf of this request.
    pub span: Span,
}

impl Request {
    pub fn new(client_ip: IpAddr, message: Message) -> Self {
        let span = tracing::info_span!(
            "dns_request",
            question = %question_to_string(&message),
            client_ip = %client_ip,
        );
        Self {
            client_ip,
            client_names: Vec::new(),
            message,
            span,
        }
    }

    pub fn with_client_names(&self, client_names: Vec<String>) -> Self {
        Self {
            client_names,
            ..self.clone()
        }
    }

    pub fn question(&self) -> Option<&Query> {
        self.message.queries().first()
    }

    /// Lowercased question name without the trailing dot.
    pub fn domain(&self) -> Option<String> {
        self.question().map(|q| normalize_domain(&q.name().to_utf8()))
    }

    pub fn record_type(&self) -> Option<RecordType> {
        self.question().map(|q| q.query_type())
    }

    /// Client names, falling back to the client address when none are known.
    pub fn client_label(&self) -> String {
        if self.client_names.is_empty() {
            self.client_ip.to_string()
        } else {
            self.client_names.join(",")
        }
    }
}

/// Which stage produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseType {
    Resolved,
    Cached,
    Blocked,
    Conditional,
    CustomDns,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved => "RESOLVED",
            Self::Cached => "CACHED",
            Self::Blocked => "BLOCKED",
            Self::Conditional => "CONDITIONAL",
            Self::CustomDns => "CUSTOMDNS",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved message plus where it came from.
#[derive(Debug, Clone)]
pub struct Response {
    pub message: Message,
    pub response_type: ResponseType,
    pub reason: String,
}

impl Response {
    pub fn new(message: Message, response_type: ResponseType, reason: impl Into<String>) -> Self {
        Self {
            message,
            response_type,
            reason: reason.into(),
        }
    }
}

/// Renders the question section as `A (example.com.)`, comma separated.
pub fn question_to_string(message: &Message) -> String {
    message
        .queries()
        .iter()
        .map(|q| format!("{} ({})", q.query_type(), q.name()))
        .collect::<Vec<_>>()
        .join(", ")
}
