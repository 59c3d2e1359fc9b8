use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::net::IpAddr;
use warden_dns_domain::DomainError;

/// One line of the query log.
#[derive(Debug, Clone)]
pub struct QueryLogEntry {
    pub timestamp: DateTime<Local>,
    pub client_ip: IpAddr,
    pub client_names: Vec<String>,
    pub duration_ms: u64,
    pub reason: String,
    pub question: String,
    pub answer: String,
    pub response_code: String,
}

impl QueryLogEntry {
    pub fn client_label(&self) -> String {
        if self.client_names.is_empty() {
            self.client_ip.to_string()
        } else {
            self.client_names.join(",")
        }
    }
}

#[async_trait]
pub trait QueryLogWriter: Send + Sync {
    async fn write(&self, entry: &QueryLogEntry) -> Result<(), DomainError>;

    /// Removes logs older than `days`. Writers without storage do nothing.
    async fn cleanup_older_than(&self, _days: u64) -> Result<(), DomainError> {
        Ok(())
    }
}
