use crate::dns::forwarding::MessageBuilder;
use async_trait::async_trait;
use hickory_proto::rr::RecordType;
use rustc_hash::FxHashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;
use warden_dns_application::ports::{
    ChainedResolver, NextResolver, Request, Resolver, Response, ResponseType,
};
use warden_dns_domain::domain_name::{domain_and_parents, normalize_domain};
use warden_dns_domain::{CustomDnsConfig, DomainError};

/// Answers A/AAAA questions for configured names (and their subdomains)
/// with fixed addresses.
pub struct CustomDnsResolver {
    mapping: FxHashMap<String, Vec<IpAddr>>,
    ttl: u32,
    next: NextResolver,
}

impl CustomDnsResolver {
    pub fn new(config: &CustomDnsConfig) -> Result<Self, DomainError> {
        let mut mapping = FxHashMap::default();
        for (domain, addresses) in &config.mapping {
            let addresses = addresses
                .iter()
                .map(|address| {
                    address.parse::<IpAddr>().map_err(|_| {
                        DomainError::Config(format!(
                            "custom DNS entry '{}' has invalid address '{}'",
                            domain, address
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            mapping.insert(normalize_domain(domain), addresses);
        }

        Ok(Self {
            mapping,
            ttl: config.ttl_secs,
            next: NextResolver::default(),
        })
    }

    fn lookup(&self, domain: &str, record_type: RecordType) -> Option<Vec<IpAddr>> {
        let addresses = domain_and_parents(domain).find_map(|name| self.mapping.get(name))?;
        let matching: Vec<IpAddr> = addresses
            .iter()
            .copied()
            .filter(|ip| match record_type {
                RecordType::A => ip.is_ipv4(),
                _ => ip.is_ipv6(),
            })
            .collect();
        (!matching.is_empty()).then_some(matching)
    }
}

#[async_trait]
impl Resolver for CustomDnsResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        let answer = match (request.domain(), request.record_type()) {
            (Some(domain), Some(record_type @ (RecordType::A | RecordType::AAAA))) => {
                self.lookup(&domain, record_type)
            }
            _ => None,
        };

        let Some(addresses) = answer else {
            return self.next.resolve(request).await;
        };

        debug!(addresses = ?addresses, "Answering from custom DNS mapping");
        Ok(Response::new(
            MessageBuilder::address_reply(&request.message, &addresses, self.ttl),
            ResponseType::CustomDns,
            "CUSTOM DNS",
        ))
    }

    fn configuration(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .mapping
            .iter()
            .map(|(domain, addresses)| {
                let addresses: Vec<String> = addresses.iter().map(ToString::to_string).collect();
                format!("{} = \"{}\"", domain, addresses.join(","))
            })
            .collect();
        lines.sort();
        if lines.is_empty() {
            lines.push("deactivated".to_string());
        }
        lines
    }

    fn name(&self) -> String {
        "custom_dns".to_string()
    }

    fn as_chained(&self) -> Option<&dyn ChainedResolver> {
        Some(self)
    }
}

impl ChainedResolver for CustomDnsResolver {
    fn set_next(&mut self, next: Arc<dyn Resolver>) {
        self.next.set(next);
    }

    fn next(&self) -> Option<&Arc<dyn Resolver>> {
        self.next.get()
    }
}
