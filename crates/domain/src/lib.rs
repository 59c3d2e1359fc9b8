//! Warden DNS Domain Layer
pub mod config;
pub mod domain_name;
pub mod errors;
pub mod upstream;

pub use config::{
    BlockingConfig, CachingConfig, CliOverrides, ClientLookupConfig, ConditionalConfig, Config,
    ConfigError, CustomDnsConfig, LogFormat, LoggingConfig, QueryLogConfig, ServerConfig,
    UpstreamConfig,
};
pub use errors::{DomainError, UpstreamFailure};
pub use upstream::{Upstream, UpstreamAddr};
