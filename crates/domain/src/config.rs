pub mod blocking;
pub mod caching;
pub mod client_lookup;
pub mod conditional;
pub mod custom_dns;
pub mod errors;
pub mod logging;
pub mod query_log;
pub mod root;
pub mod server;
pub mod upstream;

pub use blocking::BlockingConfig;
pub use caching::CachingConfig;
pub use client_lookup::ClientLookupConfig;
pub use conditional::ConditionalConfig;
pub use custom_dns::CustomDnsConfig;
pub use errors::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use query_log::QueryLogConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;
