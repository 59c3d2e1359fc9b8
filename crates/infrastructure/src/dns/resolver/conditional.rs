use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use warden_dns_application::ports::{
    ChainedResolver, NextResolver, Request, Resolver, Response, ResponseType,
};
use warden_dns_domain::domain_name::{domain_and_parents, normalize_domain};
use warden_dns_domain::{ConditionalConfig, DomainError, Upstream};

use super::upstream::UpstreamResolver;

struct ConditionalRoute {
    upstream: String,
    resolver: Arc<dyn Resolver>,
}

/// Sends queries inside configured domains to a dedicated upstream.
///
/// The most specific configured domain wins; everything else continues
/// down the chain.
pub struct ConditionalUpstreamResolver {
    routes: FxHashMap<String, ConditionalRoute>,
    next: NextResolver,
}

impl ConditionalUpstreamResolver {
    pub fn new(config: &ConditionalConfig, query_timeout: Duration) -> Result<Self, DomainError> {
        let mut routes = FxHashMap::default();
        for (domain, endpoint) in &config.mapping {
            let upstream = endpoint
                .parse::<Upstream>()
                .map_err(DomainError::InvalidUpstream)?;
            let resolver = UpstreamResolver::new(upstream.clone(), query_timeout)?;
            routes.insert(
                normalize_domain(domain),
                ConditionalRoute {
                    upstream: upstream.to_string(),
                    resolver: Arc::new(resolver),
                },
            );
        }

        Ok(Self {
            routes,
            next: NextResolver::default(),
        })
    }

    /// Routes `domain` (and its subdomains) to `resolver`.
    pub fn with_route(
        mut self,
        domain: &str,
        label: impl Into<String>,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        self.routes.insert(
            normalize_domain(domain),
            ConditionalRoute {
                upstream: label.into(),
                resolver,
            },
        );
        self
    }

    fn route_for(&self, domain: &str) -> Option<(&str, &ConditionalRoute)> {
        domain_and_parents(domain)
            .find_map(|candidate| self.routes.get_key_value(candidate))
            .map(|(zone, route)| (zone.as_str(), route))
    }
}

#[async_trait]
impl Resolver for ConditionalUpstreamResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        let route = request
            .domain()
            .and_then(|domain| self.route_for(&domain).map(|(_, route)| route));

        let Some(route) = route else {
            return self.next.resolve(request).await;
        };

        debug!(upstream = %route.upstream, "Forwarding query to conditional upstream");
        let response = route.resolver.resolve(request).await?;

        Ok(Response::new(
            response.message,
            ResponseType::Conditional,
            format!("CONDITIONAL ({})", route.upstream),
        ))
    }

    fn configuration(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .routes
            .iter()
            .map(|(domain, route)| format!("{} = \"{}\"", domain, route.upstream))
            .collect();
        lines.sort();
        if lines.is_empty() {
            lines.push("deactivated".to_string());
        }
        lines
    }

    fn name(&self) -> String {
        "conditional_upstream".to_string()
    }

    fn as_chained(&self) -> Option<&dyn ChainedResolver> {
        Some(self)
    }
}

impl ChainedResolver for ConditionalUpstreamResolver {
    fn set_next(&mut self, next: Arc<dyn Resolver>) {
        self.next.set(next);
    }

    fn next(&self) -> Option<&Arc<dyn Resolver>> {
        self.next.get()
    }
}
