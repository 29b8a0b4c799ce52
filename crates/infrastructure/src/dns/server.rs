use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use std::sync::Arc;
use steer_dns_application::use_cases::{HandleDnsQueryUseCase, RelayResponse};
use tracing::{debug, error, warn};

/// Fixed DNS header length; anything shorter cannot be answered at all.
pub const DNS_HEADER_LEN: usize = 12;

/// Largest UDP reply a client that sent no EDNS OPT record accepts.
pub const MAX_UDP_RESPONSE_SIZE_NO_EDNS: usize = 512;

/// Listener a request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingress {
    Udp,
    Tcp,
}

/// Turns one raw client datagram (or TCP frame) into the raw reply.
///
/// Shared by the UDP and TCP listeners so both ingress paths behave the same.
pub struct DnsServerHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>) -> Self {
        Self { use_case }
    }

    /// Returns `None` when nothing should be sent back.
    ///
    /// UDP replies larger than the client's payload limit are replaced by an
    /// empty TC reply so the client retries over TCP.
    pub async fn handle_raw(&self, request: &[u8], ingress: Ingress) -> Option<Vec<u8>> {
        let query = match Message::from_vec(request) {
            Ok(query) => query,
            Err(e) => return format_error_response(request, &e.to_string()),
        };

        if query.message_type() != MessageType::Query {
            debug!(id = query.id(), "Ignoring DNS response sent to the listener");
            return None;
        }

        if let Some(q) = query.queries().first() {
            debug!(id = query.id(), domain = %q.name(), record_type = %q.query_type(), "DNS query received");
        }

        let reply = match self.use_case.execute(&query).await {
            Ok(RelayResponse::Passthrough { bytes, .. }) => Some(bytes),
            Ok(RelayResponse::Rewritten { outcome, .. }) => match outcome.message.to_vec() {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    error!(id = query.id(), error = %e, "Failed to encode rewritten response");
                    encode(&error_response(&query, ResponseCode::ServFail))
                }
            },
            Err(e) => {
                warn!(id = query.id(), error = %e, "Query resolution failed");
                encode(&error_response(&query, ResponseCode::ServFail))
            }
        };

        if ingress == Ingress::Udp {
            let limit = udp_payload_limit(&query);
            if let Some(size) = reply.as_ref().map(Vec::len).filter(|size| *size > limit) {
                debug!(id = query.id(), size, limit, "Reply exceeds client UDP limit, sending TC");
                return encode(&truncated_response(&query));
            }
        }

        reply
    }
}

/// Client's advertised EDNS payload size, never below the plain DNS limit.
pub fn udp_payload_limit(query: &Message) -> usize {
    query
        .extensions()
        .as_ref()
        .map(|edns| usize::from(edns.max_payload()))
        .unwrap_or(MAX_UDP_RESPONSE_SIZE_NO_EDNS)
        .max(MAX_UDP_RESPONSE_SIZE_NO_EDNS)
}

/// Header and question only, with TC set.
pub fn truncated_response(query: &Message) -> Message {
    let mut response = Message::new();
    response
        .set_id(query.id())
        .set_message_type(MessageType::Response)
        .set_op_code(query.op_code())
        .set_response_code(ResponseCode::NoError)
        .set_truncated(true)
        .set_recursion_desired(query.recursion_desired())
        .set_recursion_available(true);
    response.add_queries(query.queries().iter().cloned());
    response
}

/// Error reply echoing the query's id, opcode, question and RD flag.
pub fn error_response(query: &Message, code: ResponseCode) -> Message {
    let mut response = Message::error_msg(query.id(), query.op_code(), code);
    response
        .set_recursion_desired(query.recursion_desired())
        .set_recursion_available(true);
    response.add_queries(query.queries().iter().cloned());
    response
}

fn format_error_response(request: &[u8], reason: &str) -> Option<Vec<u8>> {
    if request.len() < DNS_HEADER_LEN {
        warn!(len = request.len(), error = reason, "Dropping undecodable DNS message");
        return None;
    }

    let id = u16::from_be_bytes([request[0], request[1]]);
    warn!(id, error = reason, "Malformed DNS query, replying FORMERR");
    encode(&Message::error_msg(id, OpCode::Query, ResponseCode::FormErr))
}

fn encode(message: &Message) -> Option<Vec<u8>> {
    match message.to_vec() {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            error!(id = message.id(), error = %e, "Failed to encode error response");
            None
        }
    }
}
