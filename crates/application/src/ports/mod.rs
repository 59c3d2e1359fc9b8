mod query_log_writer;
mod request;
mod resolver;

pub use query_log_writer::{QueryLogEntry, QueryLogWriter};
pub use request::{question_to_string, Request, Response, ResponseType};
pub use resolver::{chain_resolvers, ChainedResolver, NextResolver, Resolver};
