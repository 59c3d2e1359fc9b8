//! Warden DNS infrastructure: the concrete pipeline stages, upstream
//! transports, the answer cache and the query log writers.
pub mod dns;
pub mod pipeline;
pub mod query_log;

pub use pipeline::build_pipeline;
