#![allow(dead_code)]

use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, Query};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use warden_dns_application::ports::{
    ChainedResolver, NextResolver, Request, Resolver, Response, ResponseType,
};
use warden_dns_domain::DomainError;

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn query_message(name: &str, record_type: RecordType) -> Message {
    let mut message = Message::new();
    message.set_id(4242);
    message.set_recursion_desired(true);
    message.add_query(Query::query(Name::from_str(name).unwrap(), record_type));
    message
}

pub fn make_request(name: &str) -> Request {
    Request::new("192.168.1.100".parse().unwrap(), query_message(name, RecordType::A))
}

pub fn answer_for(request: &Request, ip: Ipv4Addr) -> Message {
    let mut message = request.message.clone();
    message.set_message_type(MessageType::Response);
    let name = request.question().unwrap().name().clone();
    message.add_answer(Record::from_rdata(name, 300, RData::A(A(ip))));
    message
}

/// Chained stage that records its invocation and optionally answers itself.
pub struct RecordingStage {
    label: &'static str,
    calls: CallLog,
    short_circuit: bool,
    next: NextResolver,
}

impl RecordingStage {
    pub fn passing(label: &'static str, calls: CallLog) -> Self {
        Self {
            label,
            calls,
            short_circuit: false,
            next: NextResolver::default(),
        }
    }

    pub fn answering(label: &'static str, calls: CallLog) -> Self {
        Self {
            short_circuit: true,
            ..Self::passing(label, calls)
        }
    }
}

#[async_trait]
impl Resolver for RecordingStage {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        self.calls.lock().unwrap().push(self.label.to_string());
        if self.short_circuit {
            return Ok(Response::new(
                answer_for(request, Ipv4Addr::new(10, 0, 0, 1)),
                ResponseType::CustomDns,
                self.label,
            ));
        }
        self.next.resolve(request).await
    }

    fn configuration(&self) -> Vec<String> {
        vec![format!("label = {}", self.label)]
    }

    fn name(&self) -> String {
        self.label.to_string()
    }

    fn as_chained(&self) -> Option<&dyn ChainedResolver> {
        Some(self)
    }
}

impl ChainedResolver for RecordingStage {
    fn set_next(&mut self, next: Arc<dyn Resolver>) {
        self.next.set(next);
    }

    fn next(&self) -> Option<&Arc<dyn Resolver>> {
        self.next.get()
    }
}

/// Terminal resolver with a scripted outcome and an invocation counter.
pub struct StubTerminal {
    calls: CallLog,
    invocations: AtomicUsize,
    failure: Option<DomainError>,
}

impl StubTerminal {
    pub fn answering(calls: CallLog) -> Self {
        Self {
            calls,
            invocations: AtomicUsize::new(0),
            failure: None,
        }
    }

    pub fn failing(calls: CallLog, error: DomainError) -> Self {
        Self {
            calls,
            invocations: AtomicUsize::new(0),
            failure: Some(error),
        }
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Resolver for StubTerminal {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push("terminal".to_string());
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(Response::new(
                answer_for(request, Ipv4Addr::new(93, 184, 216, 34)),
                ResponseType::Resolved,
                "RESOLVED (stub)",
            )),
        }
    }

    fn configuration(&self) -> Vec<String> {
        vec!["stub upstream".to_string()]
    }

    fn name(&self) -> String {
        "terminal".to_string()
    }
}
