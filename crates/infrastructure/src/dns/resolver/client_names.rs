use async_trait::async_trait;
use dashmap::DashMap;
use hickory_proto::op::{Message, Query};
use hickory_proto::rr::{Name, RData, RecordType};
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use warden_dns_application::ports::{ChainedResolver, NextResolver, Request, Resolver, Response};
use warden_dns_domain::domain_name::normalize_domain;
use warden_dns_domain::{ClientLookupConfig, DomainError};

const NAME_CACHE_TTL: Duration = Duration::from_secs(3600);

struct CachedNames {
    names: Vec<String>,
    expires_at: Instant,
}

/// Annotates each request with the client's names before passing it on.
///
/// Static mappings win; otherwise the client address is reverse-resolved
/// through the lookup upstream and remembered for an hour. When no name can
/// be found the address itself is used.
pub struct ClientNamesResolver {
    static_names: FxHashMap<IpAddr, Vec<String>>,
    ptr_resolver: Option<Arc<dyn Resolver>>,
    single_name_order: Vec<usize>,
    cache: DashMap<IpAddr, CachedNames, FxBuildHasher>,
    next: NextResolver,
}

impl ClientNamesResolver {
    pub fn new(config: &ClientLookupConfig, ptr_resolver: Option<Arc<dyn Resolver>>) -> Self {
        let mut static_names: FxHashMap<IpAddr, Vec<String>> = FxHashMap::default();
        for (name, addresses) in &config.clients {
            for ip in addresses.iter().filter_map(|a| a.parse::<IpAddr>().ok()) {
                static_names.entry(ip).or_default().push(name.clone());
            }
        }

        Self {
            static_names,
            ptr_resolver,
            single_name_order: config.single_name_order.clone(),
            cache: DashMap::with_hasher(FxBuildHasher),
            next: NextResolver::default(),
        }
    }

    async fn names_for(&self, request: &Request) -> Vec<String> {
        let ip = request.client_ip;
        if let Some(names) = self.static_names.get(&ip) {
            return names.clone();
        }

        let Some(ptr_resolver) = &self.ptr_resolver else {
            return vec![ip.to_string()];
        };

        if let Some(cached) = self.cache.get(&ip) {
            if cached.expires_at > Instant::now() {
                return cached.names.clone();
            }
        }

        let names = match self.reverse_lookup(ptr_resolver.as_ref(), request).await {
            Ok(names) => {
                let names = self.pick_names(names);
                self.cache.insert(
                    ip,
                    CachedNames {
                        names: names.clone(),
                        expires_at: Instant::now() + NAME_CACHE_TTL,
                    },
                );
                names
            }
            Err(e) => {
                debug!(client = %ip, error = %e, "Reverse lookup of client failed");
                Vec::new()
            }
        };

        if names.is_empty() {
            vec![ip.to_string()]
        } else {
            names
        }
    }

    async fn reverse_lookup(
        &self,
        resolver: &dyn Resolver,
        request: &Request,
    ) -> Result<Vec<String>, DomainError> {
        let mut message = Message::new();
        message.set_id(fastrand::u16(..)).set_recursion_desired(true);
        message.add_query(Query::query(
            Name::from(request.client_ip),
            RecordType::PTR,
        ));

        let lookup = Request {
            client_ip: request.client_ip,
            client_names: Vec::new(),
            message,
            span: request.span.clone(),
        };
        let response = resolver.resolve(&lookup).await?;

        Ok(response
            .message
            .answers()
            .iter()
            .filter_map(|record| match record.data() {
                Some(RData::PTR(ptr)) => Some(normalize_domain(&ptr.0.to_utf8())),
                _ => None,
            })
            .collect())
    }

    /// Applies `single_name_order` (1-based positions) when a lookup yields
    /// more than one name.
    fn pick_names(&self, names: Vec<String>) -> Vec<String> {
        if names.len() <= 1 || self.single_name_order.is_empty() {
            return names;
        }
        self.single_name_order
            .iter()
            .find_map(|position| position.checked_sub(1).and_then(|i| names.get(i)))
            .map(|name| vec![name.clone()])
            .unwrap_or(names)
    }
}

#[async_trait]
impl Resolver for ClientNamesResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        let names = self.names_for(request).await;
        let annotated = request.with_client_names(names);
        self.next.resolve(&annotated).await
    }

    fn configuration(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "reverse lookup = {}",
                if self.ptr_resolver.is_some() { "enabled" } else { "disabled" }
            ),
            format!("single_name_order = {:?}", self.single_name_order),
        ];
        let mut clients: Vec<String> = self
            .static_names
            .iter()
            .map(|(ip, names)| format!("{} = {}", ip, names.join(",")))
            .collect();
        clients.sort();
        lines.extend(clients);
        lines
    }

    fn name(&self) -> String {
        "client_names".to_string()
    }

    fn as_chained(&self) -> Option<&dyn ChainedResolver> {
        Some(self)
    }
}

impl ChainedResolver for ClientNamesResolver {
    fn set_next(&mut self, next: Arc<dyn Resolver>) {
        self.next.set(next);
    }

    fn next(&self) -> Option<&Arc<dyn Resolver>> {
        self.next.get()
    }
}
