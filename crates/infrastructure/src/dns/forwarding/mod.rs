pub mod message_builder;
pub mod response_parser;

pub use message_builder::MessageBuilder;
pub use response_parser::{describe_answer, min_answer_ttl, response_code_name};
