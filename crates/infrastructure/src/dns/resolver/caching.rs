use crate::dns::cache::{AnswerCache, CacheKey};
use crate::dns::forwarding::min_answer_ttl;
use async_trait::async_trait;
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::Record;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use warden_dns_application::ports::{
    ChainedResolver, NextResolver, Request, Resolver, Response, ResponseType,
};
use warden_dns_domain::{CachingConfig, DomainError};

/// Answers repeated questions from the shared [`AnswerCache`] until the
/// answer's TTL runs out. Only successful responses with answers are stored;
/// failures pass through uncached. A hit reports the remaining lifetime on
/// every record in the response.
pub struct CachingResolver {
    cache: Arc<AnswerCache>,
    config: CachingConfig,
    next: NextResolver,
}

impl CachingResolver {
    pub fn new(cache: Arc<AnswerCache>, config: CachingConfig) -> Self {
        Self {
            cache,
            config,
            next: NextResolver::default(),
        }
    }

    fn store(&self, key: CacheKey, message: &Message) {
        if message.response_code() != ResponseCode::NoError {
            return;
        }
        let Some(ttl) = min_answer_ttl(message) else {
            return;
        };

        let ttl = self.config.clamp_ttl(ttl);
        if ttl > 0 {
            self.cache
                .insert(key, message.clone(), Duration::from_secs(u64::from(ttl)));
        }
    }
}

fn with_ttl(records: Vec<Record>, ttl: u32) -> Vec<Record> {
    records
        .into_iter()
        .map(|mut record| {
            record.set_ttl(ttl);
            record
        })
        .collect()
}

#[async_trait]
impl Resolver for CachingResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        let Some(key) = request.question().map(CacheKey::from_query) else {
            return self.next.resolve(request).await;
        };

        if let Some((mut message, remaining)) = self.cache.get(&key) {
            debug!(domain = %key.domain, remaining_ttl = remaining, "Cache hit");
            message
                .set_id(request.message.id())
                .set_recursion_desired(request.message.recursion_desired());
            let answers = with_ttl(message.take_answers(), remaining);
            let authority = with_ttl(message.take_name_servers(), remaining);
            let additionals = with_ttl(message.take_additionals(), remaining);
            message.insert_answers(answers);
            message.insert_name_servers(authority);
            message.insert_additionals(additionals);
            return Ok(Response::new(message, ResponseType::Cached, "CACHED"));
        }

        let response = self.next.resolve(request).await?;
        self.store(key, &response.message);
        Ok(response)
    }

    fn configuration(&self) -> Vec<String> {
        vec![
            format!("max_entries = {}", self.config.max_entries),
            format!("min_ttl = {}s", self.config.min_ttl_secs),
            format!("max_ttl = {}s", self.config.max_ttl_secs),
            format!("entries = {}", self.cache.len()),
        ]
    }

    fn name(&self) -> String {
        "caching".to_string()
    }

    fn as_chained(&self) -> Option<&dyn ChainedResolver> {
        Some(self)
    }
}

impl ChainedResolver for CachingResolver {
    fn set_next(&mut self, next: Arc<dyn Resolver>) {
        self.next.set(next);
    }

    fn next(&self) -> Option<&Arc<dyn Resolver>> {
        self.next.get()
    }
}
