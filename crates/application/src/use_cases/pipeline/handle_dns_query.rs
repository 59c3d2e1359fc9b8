use crate::ports::{Request, Resolver};
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, error, Instrument};

const DNS_HEADER_LEN: usize = 12;

/// Boundary between the listeners and the resolver pipeline.
///
/// Turns a decoded query into a [`Request`], runs it through the pipeline head
/// and always produces a message to send back: the answer with RA mirroring
/// RD, or SERVFAIL when resolution fails.
pub struct HandleDnsQueryUseCase {
    resolver: Arc<dyn Resolver>,
}

impl HandleDnsQueryUseCase {
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self { resolver }
    }

    pub async fn execute(&self, client_ip: IpAddr, query: Message) -> Message {
        let request = Request::new(client_ip, query);
        let span = request.span.clone();

        async {
            debug!("new request");

            match self.resolver.resolve(&request).await {
                Ok(response) => {
                    let mut message = response.message;
                    message.set_recursion_available(request.message.recursion_desired());
                    message
                }
                Err(e) => {
                    error!(error = %e, "error on processing request");
                    failure_response(&request.message, ResponseCode::ServFail)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Decodes a raw packet, resolves it and encodes the reply.
    ///
    /// Packets too short to carry a header and packets that are themselves
    /// responses are dropped (`None`); undecodable queries get FORMERR.
    pub async fn handle_packet(&self, packet: &[u8], client_ip: IpAddr) -> Option<Vec<u8>> {
        let reply = match Message::from_vec(packet) {
            Ok(query) if query.message_type() == MessageType::Query => {
                self.execute(client_ip, query).await
            }
            Ok(_) => {
                debug!(client = %client_ip, "Ignoring packet that is not a query");
                return None;
            }
            Err(e) => {
                if packet.len() < DNS_HEADER_LEN {
                    debug!(client = %client_ip, len = packet.len(), "Dropping truncated packet");
                    return None;
                }
                debug!(client = %client_ip, error = %e, "Malformed query, answering FORMERR");
                let id = u16::from_be_bytes([packet[0], packet[1]]);
                Message::error_msg(id, OpCode::Query, ResponseCode::FormErr)
            }
        };

        match reply.to_vec() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!(client = %client_ip, error = %e, "Failed to encode response");
                None
            }
        }
    }
}

/// Standard failure reply: same id and question, the given response code.
pub(crate) fn failure_response(query: &Message, code: ResponseCode) -> Message {
    let mut message = Message::error_msg(query.id(), query.op_code(), code);
    message.add_queries(query.queries().iter().cloned());
    message.set_recursion_desired(query.recursion_desired());
    message.set_recursion_available(query.recursion_desired());
    message
}
