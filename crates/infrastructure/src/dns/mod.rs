pub mod block_list;
pub mod cache;
pub mod forwarding;
pub mod resolver;
pub mod transport;

pub use cache::{AnswerCache, CacheKey};
pub use resolver::{
    BlockingResolver, CachingResolver, ClientNamesResolver, ConditionalUpstreamResolver,
    CustomDnsResolver, ParallelBestResolver, QueryLoggingResolver, UpstreamResolver,
};
