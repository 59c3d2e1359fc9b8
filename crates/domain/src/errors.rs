use std::fmt;
use thiserror::Error;

/// One member's failure inside an aggregated parallel resolution error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    pub upstream: String,
    pub error: Box<DomainError>,
}

impl UpstreamFailure {
    pub fn new(upstream: impl Into<String>, error: DomainError) -> Self {
        Self {
            upstream: upstream.into(),
            error: Box::new(error),
        }
    }
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.upstream, self.error)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Invalid upstream endpoint: {0}")]
    InvalidUpstream(String),

    #[error("Network error talking to {upstream}: {reason}")]
    Network { upstream: String, reason: String },

    #[error("Timeout waiting for {upstream}")]
    UpstreamTimeout { upstream: String },

    #[error("Invalid DNS response from {upstream}: {reason}")]
    InvalidResponse { upstream: String, reason: String },

    #[error("No upstream answered within {timeout_ms}ms")]
    ParallelTimeout { timeout_ms: u64 },

    #[error("All {} upstream resolvers failed: {}", .0.len(), join_failures(.0))]
    AllUpstreamsFailed(Vec<UpstreamFailure>),

    #[error("Query log error: {0}")]
    QueryLog(String),
}

impl DomainError {
    pub fn network(upstream: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::Network {
            upstream: upstream.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::UpstreamTimeout { .. } | Self::ParallelTimeout { .. }
        )
    }
}

fn join_failures(failures: &[UpstreamFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
