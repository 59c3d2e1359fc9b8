use crate::dns::block_list::DomainGroups;
use crate::dns::forwarding::MessageBuilder;
use async_trait::async_trait;
use hickory_proto::rr::RecordType;
use ipnetwork::IpNetwork;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use tracing::debug;
use warden_dns_application::ports::{
    ChainedResolver, NextResolver, Request, Resolver, Response, ResponseType,
};
use warden_dns_domain::config::blocking::DEFAULT_CLIENT_GROUP;
use warden_dns_domain::{BlockingConfig, DomainError};

/// Which blacklist groups apply to which clients.
#[derive(Debug, Default)]
struct ClientGroups {
    by_name: FxHashMap<String, Vec<String>>,
    by_ip: FxHashMap<IpAddr, Vec<String>>,
    by_cidr: Vec<(IpNetwork, Vec<String>)>,
    default: Vec<String>,
}

impl ClientGroups {
    fn from_config(mapping: &BTreeMap<String, Vec<String>>) -> Self {
        let mut groups = Self::default();
        for (client, names) in mapping {
            if client == DEFAULT_CLIENT_GROUP {
                groups.default = names.clone();
            } else if let Ok(ip) = client.parse::<IpAddr>() {
                groups.by_ip.insert(ip, names.clone());
            } else if let Ok(network) = client.parse::<IpNetwork>() {
                groups.by_cidr.push((network, names.clone()));
            } else {
                groups.by_name.insert(client.to_ascii_lowercase(), names.clone());
            }
        }
        groups
    }

    /// Union of the groups matched by client name, IP and CIDR, or the
    /// default groups when nothing matches.
    fn for_request(&self, request: &Request) -> Vec<&str> {
        let mut sources: Vec<&Vec<String>> = Vec::new();
        for client_name in &request.client_names {
            if let Some(names) = self.by_name.get(&client_name.to_ascii_lowercase()) {
                sources.push(names);
            }
        }
        if let Some(names) = self.by_ip.get(&request.client_ip) {
            sources.push(names);
        }
        for (network, names) in &self.by_cidr {
            if network.contains(request.client_ip) {
                sources.push(names);
            }
        }

        let mut matched: Vec<&str> = Vec::new();
        for name in sources.into_iter().flatten() {
            if !matched.contains(&name.as_str()) {
                matched.push(name);
            }
        }

        if matched.is_empty() {
            self.default.iter().map(String::as_str).collect()
        } else {
            matched
        }
    }
}

/// Blocks queries for domains on the client's blacklist groups.
///
/// A domain is blocked when it or a parent domain is listed in one of the
/// client's blacklist groups, unless the same groups whitelist it. A and
/// AAAA questions get the unspecified address, everything else NXDOMAIN.
pub struct BlockingResolver {
    black_lists: DomainGroups,
    white_lists: DomainGroups,
    client_groups: ClientGroups,
    block_ttl: u32,
    next: NextResolver,
}

impl BlockingResolver {
    pub async fn new(config: &BlockingConfig) -> Result<Self, DomainError> {
        Ok(Self {
            black_lists: DomainGroups::load(&config.black_lists).await?,
            white_lists: DomainGroups::load(&config.white_lists).await?,
            client_groups: ClientGroups::from_config(&config.client_groups_block),
            block_ttl: config.block_ttl_secs,
            next: NextResolver::default(),
        })
    }

    fn blocking_group<'a>(&self, groups: &[&'a str], domain: &str) -> Option<&'a str> {
        if groups.iter().any(|group| self.white_lists.contains(group, domain)) {
            return None;
        }
        groups
            .iter()
            .find(|group| self.black_lists.contains(group, domain))
            .copied()
    }
}

#[async_trait]
impl Resolver for BlockingResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        let Some(domain) = request.domain() else {
            return self.next.resolve(request).await;
        };

        let groups = self.client_groups.for_request(request);
        let Some(group) = self.blocking_group(&groups, &domain) else {
            return self.next.resolve(request).await;
        };

        debug!(domain = %domain, group = %group, client = %request.client_label(), "Query blocked");

        let message = match request.record_type() {
            Some(RecordType::A) => MessageBuilder::address_reply(
                &request.message,
                &[IpAddr::V4(Ipv4Addr::UNSPECIFIED)],
                self.block_ttl,
            ),
            Some(RecordType::AAAA) => MessageBuilder::address_reply(
                &request.message,
                &[IpAddr::V6(Ipv6Addr::UNSPECIFIED)],
                self.block_ttl,
            ),
            _ => MessageBuilder::nxdomain_reply(&request.message),
        };

        Ok(Response::new(
            message,
            ResponseType::Blocked,
            format!("BLOCKED ({})", group),
        ))
    }

    fn configuration(&self) -> Vec<String> {
        let mut lines = vec!["client_groups_block".to_string()];
        let mut clients: Vec<String> = self
            .client_groups
            .by_name
            .iter()
            .map(|(client, groups)| format!("  {} = {:?}", client, groups))
            .chain(
                self.client_groups
                    .by_ip
                    .iter()
                    .map(|(ip, groups)| format!("  {} = {:?}", ip, groups)),
            )
            .chain(
                self.client_groups
                    .by_cidr
                    .iter()
                    .map(|(network, groups)| format!("  {} = {:?}", network, groups)),
            )
            .collect();
        clients.sort();
        lines.extend(clients);
        if !self.client_groups.default.is_empty() {
            lines.push(format!(
                "  {} = {:?}",
                DEFAULT_CLIENT_GROUP, self.client_groups.default
            ));
        }

        lines.push("blacklist:".to_string());
        for (group, count) in self.black_lists.summary() {
            lines.push(format!("  {}: {} entries", group, count));
        }
        lines.push("whitelist:".to_string());
        for (group, count) in self.white_lists.summary() {
            lines.push(format!("  {}: {} entries", group, count));
        }
        lines.push(format!("block_ttl = {}s", self.block_ttl));
        lines
    }

    fn name(&self) -> String {
        "blocking".to_string()
    }

    fn as_chained(&self) -> Option<&dyn ChainedResolver> {
        Some(self)
    }
}

impl ChainedResolver for BlockingResolver {
    fn set_next(&mut self, next: Arc<dyn Resolver>) {
        self.next.set(next);
    }

    fn next(&self) -> Option<&Arc<dyn Resolver>> {
        self.next.get()
    }
}
