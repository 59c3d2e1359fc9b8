use crate::dns::forwarding::{describe_answer, response_code_name};
use crate::query_log::QueryLogEmitter;
use async_trait::async_trait;
use chrono::Local;
use std::sync::Arc;
use tokio::time::Instant;
use warden_dns_application::ports::{
    question_to_string, ChainedResolver, NextResolver, QueryLogEntry, Request, Resolver, Response,
};
use warden_dns_domain::DomainError;

const ERROR_REASON: &str = "ERROR";

/// Records every query with its outcome once the rest of the chain has
/// answered. Errors are logged and passed through unchanged.
pub struct QueryLoggingResolver {
    emitter: QueryLogEmitter,
    target: String,
    next: NextResolver,
}

impl QueryLoggingResolver {
    /// `target` describes where entries end up, for diagnostics only.
    pub fn new(emitter: QueryLogEmitter, target: impl Into<String>) -> Self {
        Self {
            emitter,
            target: target.into(),
            next: NextResolver::default(),
        }
    }
}

#[async_trait]
impl Resolver for QueryLoggingResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        let start = Instant::now();
        let result = self.next.resolve(request).await;

        let (reason, answer, response_code) = match &result {
            Ok(response) => (
                response.reason.clone(),
                describe_answer(&response.message),
                response_code_name(response.message.response_code()),
            ),
            Err(e) => (ERROR_REASON.to_string(), e.to_string(), "SERVFAIL".to_string()),
        };

        self.emitter.emit(QueryLogEntry {
            timestamp: Local::now(),
            client_ip: request.client_ip,
            client_names: request.client_names.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
            reason,
            question: question_to_string(&request.message),
            answer,
            response_code,
        });

        result
    }

    fn configuration(&self) -> Vec<String> {
        vec![format!("target = {}", self.target)]
    }

    fn name(&self) -> String {
        "query_logging".to_string()
    }

    fn as_chained(&self) -> Option<&dyn ChainedResolver> {
        Some(self)
    }
}

impl ChainedResolver for QueryLoggingResolver {
    fn set_next(&mut self, next: Arc<dyn Resolver>) {
        self.next.set(next);
    }

    fn next(&self) -> Option<&Arc<dyn Resolver>> {
        self.next.get()
    }
}
