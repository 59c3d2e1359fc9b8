use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::blocking::{BlockingConfig, DEFAULT_CLIENT_GROUP};
use super::caching::CachingConfig;
use super::client_lookup::ClientLookupConfig;
use super::conditional::ConditionalConfig;
use super::custom_dns::CustomDnsConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::query_log::QueryLogConfig;
use super::server::ServerConfig;
use super::upstream::UpstreamConfig;
use crate::upstream::Upstream;

/// Main configuration structure for Warden DNS
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listener configuration (port, bind address)
    #[serde(default)]
    pub server: ServerConfig,

    /// External resolvers the pipeline ends in
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub client_lookup: ClientLookupConfig,

    #[serde(default)]
    pub query_log: QueryLogConfig,

    #[serde(default)]
    pub conditional: ConditionalConfig,

    #[serde(default)]
    pub custom_dns: CustomDnsConfig,

    #[serde(default)]
    pub blocking: BlockingConfig,

    #[serde(default)]
    pub caching: CachingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. warden-dns.toml in current directory
    /// 3. /etc/warden-dns/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("warden-dns.toml").exists() {
            Self::from_file("warden-dns.toml")?
        } else if std::path::Path::new("/etc/warden-dns/config.toml").exists() {
            Self::from_file("/etc/warden-dns/config.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        if self.upstream.servers.is_empty() {
            return Err(ConfigError::Validation(
                "No upstream servers configured".to_string(),
            ));
        }

        if self.upstream.query_timeout_ms == 0 || self.upstream.parallel_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "Upstream timeouts must be greater than 0".to_string(),
            ));
        }

        if self.query_log.channel_capacity == 0 {
            return Err(ConfigError::Validation(
                "Query log channel capacity must be greater than 0".to_string(),
            ));
        }

        let mut endpoints: Vec<&String> = self.upstream.servers.iter().collect();
        endpoints.extend(self.conditional.mapping.values());
        endpoints.extend(self.client_lookup.upstream.iter());
        for endpoint in endpoints {
            endpoint
                .parse::<Upstream>()
                .map_err(ConfigError::Validation)?;
        }

        for (domain, addresses) in &self.custom_dns.mapping {
            for address in addresses {
                address.parse::<IpAddr>().map_err(|_| {
                    ConfigError::Validation(format!(
                        "Custom DNS entry '{}' has invalid address '{}'",
                        domain, address
                    ))
                })?;
            }
        }

        for (name, addresses) in &self.client_lookup.clients {
            for address in addresses {
                address.parse::<IpAddr>().map_err(|_| {
                    ConfigError::Validation(format!(
                        "Client '{}' has invalid address '{}'",
                        name, address
                    ))
                })?;
            }
        }

        for (client, groups) in &self.blocking.client_groups_block {
            if client.contains('/') && client.parse::<IpNetwork>().is_err() {
                return Err(ConfigError::Validation(format!(
                    "Blocking client '{}' is not a valid CIDR",
                    client
                )));
            }
            for group in groups {
                if !self.blocking.black_lists.contains_key(group) {
                    return Err(ConfigError::Validation(format!(
                        "Blocking client '{}' references unknown blacklist group '{}'",
                        client, group
                    )));
                }
            }
        }

        if self.blocking.is_enabled() && self.blocking.client_groups_block.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Blacklists are configured but no client group uses them; add a '{}' entry to client_groups_block",
                DEFAULT_CLIENT_GROUP
            )));
        }

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
}
