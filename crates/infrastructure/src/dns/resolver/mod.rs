pub mod blocking;
pub mod caching;
pub mod client_names;
pub mod conditional;
pub mod custom_dns;
pub mod parallel_best;
pub mod query_logging;
pub mod upstream;

pub use blocking::BlockingResolver;
pub use caching::CachingResolver;
pub use client_names::ClientNamesResolver;
pub use conditional::ConditionalUpstreamResolver;
pub use custom_dns::CustomDnsResolver;
pub use parallel_best::ParallelBestResolver;
pub use query_logging::QueryLoggingResolver;
pub use upstream::UpstreamResolver;
