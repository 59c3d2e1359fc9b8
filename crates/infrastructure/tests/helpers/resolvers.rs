use async_trait::async_trait;
use hickory_proto::op::{Message, MessageType, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use warden_dns_application::ports::{Request, Resolver, Response, ResponseType};
use warden_dns_domain::DomainError;

pub const CLIENT_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 178, 20);

pub fn query_message(name: &str, record_type: RecordType) -> Message {
    let mut message = Message::new();
    message.set_id(4711).set_recursion_desired(true);
    message.add_query(Query::query(Name::from_str(name).unwrap(), record_type));
    message
}

pub fn request(name: &str, record_type: RecordType) -> Request {
    request_from(IpAddr::V4(CLIENT_IP), name, record_type)
}

pub fn request_from(client_ip: IpAddr, name: &str, record_type: RecordType) -> Request {
    Request::new(client_ip, query_message(name, record_type))
}

pub fn a_answer(query: &Message, ip: Ipv4Addr, ttl: u32) -> Message {
    let mut message = query.clone();
    message.set_message_type(MessageType::Response);
    if let Some(question) = query.queries().first() {
        message.add_answer(Record::from_rdata(
            question.name().clone(),
            ttl,
            RData::A(A(ip)),
        ));
    }
    message
}

pub fn answered_ips(message: &Message) -> Vec<IpAddr> {
    message
        .answers()
        .iter()
        .filter_map(|record| match record.data() {
            Some(RData::A(a)) => Some(IpAddr::V4(a.0)),
            Some(RData::AAAA(aaaa)) => Some(IpAddr::V6(aaaa.0)),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Answer { ip: Ipv4Addr, ttl: u32 },
    Rcode(ResponseCode),
    Fail(DomainError),
    Hang,
}

/// Resolver with a scripted delay and outcome that counts its invocations.
pub struct ScriptedResolver {
    label: String,
    delay: Duration,
    outcome: Outcome,
    calls: AtomicUsize,
    completed: AtomicBool,
    last_request: Mutex<Option<Request>>,
}

impl ScriptedResolver {
    pub fn new(label: &str, delay: Duration, outcome: Outcome) -> Self {
        Self {
            label: label.to_string(),
            delay,
            outcome,
            calls: AtomicUsize::new(0),
            completed: AtomicBool::new(false),
            last_request: Mutex::new(None),
        }
    }

    pub fn answering(label: &str, ip: Ipv4Addr, ttl: u32) -> Self {
        Self::new(label, Duration::ZERO, Outcome::Answer { ip, ttl })
    }

    pub fn failing(label: &str, error: DomainError) -> Self {
        Self::new(label, Duration::ZERO, Outcome::Fail(error))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// True once the scripted delay elapsed; an aborted task never gets here.
    pub fn completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<Request> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl Resolver for ScriptedResolver {
    async fn resolve(&self, request: &Request) -> Result<Response, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = match &self.outcome {
            Outcome::Answer { ip, ttl } => Ok(Response::new(
                a_answer(&request.message, *ip, *ttl),
                ResponseType::Resolved,
                format!("RESOLVED ({})", self.label),
            )),
            Outcome::Rcode(code) => {
                let mut message = request.message.clone();
                message
                    .set_message_type(MessageType::Response)
                    .set_response_code(*code);
                Ok(Response::new(
                    message,
                    ResponseType::Resolved,
                    format!("RESOLVED ({})", self.label),
                ))
            }
            Outcome::Fail(error) => Err(error.clone()),
            Outcome::Hang => std::future::pending().await,
        };

        self.completed.store(true, Ordering::SeqCst);
        result
    }

    fn configuration(&self) -> Vec<String> {
        vec![format!("scripted '{}'", self.label)]
    }

    fn name(&self) -> String {
        self.label.clone()
    }
}
