//! Assembles the resolver chain from configuration.
//!
//! Stage order: client names, query logging, conditional upstream, custom
//! DNS, blocking, caching, then the terminal resolver (a lone upstream, or a
//! parallel race when several are configured).

use crate::dns::cache::AnswerCache;
use crate::dns::resolver::{
    BlockingResolver, CachingResolver, ClientNamesResolver, ConditionalUpstreamResolver,
    CustomDnsResolver, ParallelBestResolver, QueryLoggingResolver, UpstreamResolver,
};
use crate::query_log::{
    spawn_retention_task, FileQueryLogWriter, QueryLogEmitter, TracingQueryLogWriter,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use warden_dns_application::ports::{chain_resolvers, ChainedResolver, QueryLogWriter, Resolver};
use warden_dns_domain::{Config, DomainError, QueryLogConfig, Upstream};

/// Builds the chain and returns its head.
///
/// Fails with [`DomainError::Config`] when no upstream is configured.
pub async fn build_pipeline(config: &Config) -> Result<Arc<dyn Resolver>, DomainError> {
    let query_timeout = Duration::from_millis(config.upstream.query_timeout_ms);
    let terminal = build_terminal(config, query_timeout)?;

    let ptr_resolver = match &config.client_lookup.upstream {
        Some(endpoint) => {
            let upstream = endpoint
                .parse::<Upstream>()
                .map_err(DomainError::InvalidUpstream)?;
            Some(Arc::new(UpstreamResolver::new(upstream, query_timeout)?) as Arc<dyn Resolver>)
        }
        None => None,
    };

    let mut stages: Vec<Box<dyn ChainedResolver>> = vec![
        Box::new(ClientNamesResolver::new(&config.client_lookup, ptr_resolver)),
        Box::new(build_query_logging(&config.query_log).await?),
        Box::new(ConditionalUpstreamResolver::new(
            &config.conditional,
            query_timeout,
        )?),
        Box::new(CustomDnsResolver::new(&config.custom_dns)?),
        Box::new(BlockingResolver::new(&config.blocking).await?),
    ];

    if config.caching.enabled {
        let cache = Arc::new(AnswerCache::new(config.caching.max_entries));
        stages.push(Box::new(CachingResolver::new(cache, config.caching.clone())));
    } else {
        info!("Caching disabled");
    }

    info!(stages = stages.len(), terminal = %terminal.name(), "Resolver chain assembled");
    Ok(chain_resolvers(stages, terminal))
}

fn build_terminal(
    config: &Config,
    query_timeout: Duration,
) -> Result<Arc<dyn Resolver>, DomainError> {
    let upstreams = config
        .upstream
        .parsed_servers()
        .map_err(DomainError::InvalidUpstream)?;

    match upstreams.as_slice() {
        [] => Err(DomainError::Config(
            "no upstream servers configured".to_string(),
        )),
        [single] => Ok(Arc::new(UpstreamResolver::new(single.clone(), query_timeout)?)),
        many => Ok(Arc::new(ParallelBestResolver::from_upstreams(
            many,
            query_timeout,
            Duration::from_millis(config.upstream.parallel_timeout_ms),
        )?)),
    }
}

async fn build_query_logging(config: &QueryLogConfig) -> Result<QueryLoggingResolver, DomainError> {
    if config.channel_capacity == 0 {
        return Err(DomainError::Config(
            "query log channel capacity must be greater than 0".to_string(),
        ));
    }

    let (writer, target): (Arc<dyn QueryLogWriter>, String) = match &config.dir {
        Some(dir) => (
            Arc::new(FileQueryLogWriter::open(dir, config.per_client).await?),
            format!("dir {} (per_client = {})", dir.display(), config.per_client),
        ),
        None => (Arc::new(TracingQueryLogWriter), "console".to_string()),
    };

    if config.log_retention_days > 0 {
        spawn_retention_task(Arc::clone(&writer), config.log_retention_days);
    }

    let (emitter, _consumer) = QueryLogEmitter::spawn(writer, config.channel_capacity);
    Ok(QueryLoggingResolver::new(emitter, target))
}
