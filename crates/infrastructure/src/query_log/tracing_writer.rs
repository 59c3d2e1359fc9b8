use async_trait::async_trait;
use tracing::info;
use warden_dns_application::ports::{QueryLogEntry, QueryLogWriter};
use warden_dns_domain::DomainError;

/// Writes query log entries to the application log.
#[derive(Debug, Default)]
pub struct TracingQueryLogWriter;

#[async_trait]
impl QueryLogWriter for TracingQueryLogWriter {
    async fn write(&self, entry: &QueryLogEntry) -> Result<(), DomainError> {
        info!(
            target: "query_log",
            client_ip = %entry.client_ip,
            client = %entry.client_label(),
            duration_ms = entry.duration_ms,
            reason = %entry.reason,
            question = %entry.question,
            answer = %entry.answer,
            response_code = %entry.response_code,
            "query resolved"
        );
        Ok(())
    }
}
