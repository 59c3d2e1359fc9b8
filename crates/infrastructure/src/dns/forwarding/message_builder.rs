//! DNS message construction with `hickory-proto`: outbound upstream queries
//! and the synthetic answers produced by the policy stages.

use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{Name, RData, Record};
use std::net::IpAddr;
use warden_dns_domain::DomainError;

pub struct MessageBuilder;

impl MessageBuilder {
    /// Re-encodes the client's question for an upstream exchange.
    ///
    /// The upstream query gets a fresh random id and RD set; the id is
    /// returned alongside so the reply can be matched.
    pub fn upstream_query(request: &Message) -> Result<(u16, Vec<u8>), DomainError> {
        if request.queries().is_empty() {
            return Err(DomainError::MalformedQuery(
                "query has no question section".to_string(),
            ));
        }

        let id = fastrand::u16(..);
        let mut message = Message::new();
        message
            .set_id(id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true)
            .add_queries(request.queries().iter().cloned());

        let bytes = message
            .to_vec()
            .map_err(|e| DomainError::MalformedQuery(format!("failed to encode query: {}", e)))?;

        Ok((id, bytes))
    }

    /// Empty response header answering `request`: same id, opcode, question and RD.
    pub fn reply_to(request: &Message) -> Message {
        let mut message = Message::new();
        message
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_op_code(request.op_code())
            .set_recursion_desired(request.recursion_desired())
            .add_queries(request.queries().iter().cloned());
        message
    }

    /// Answers the first question with one A or AAAA record per address.
    pub fn address_reply(request: &Message, addresses: &[IpAddr], ttl: u32) -> Message {
        let mut message = Self::reply_to(request);
        let Some(name) = request.queries().first().map(|q| q.name().clone()) else {
            return message;
        };

        message.insert_answers(
            addresses
                .iter()
                .map(|address| address_record(name.clone(), *address, ttl))
                .collect(),
        );
        message
    }

    pub fn nxdomain_reply(request: &Message) -> Message {
        let mut message = Self::reply_to(request);
        message.set_response_code(ResponseCode::NXDomain);
        message
    }
}

fn address_record(name: Name, address: IpAddr, ttl: u32) -> Record {
    let rdata = match address {
        IpAddr::V4(ip) => RData::A(A(ip)),
        IpAddr::V6(ip) => RData::AAAA(AAAA(ip)),
    };
    Record::from_rdata(name, ttl, rdata)
}
