#![allow(dead_code)]

pub mod dns_server_mock;
pub mod resolvers;

pub use dns_server_mock::{MockBehavior, MockDnsServer};
pub use resolvers::{
    a_answer, answered_ips, query_message, request, request_from, Outcome, ScriptedResolver,
};
