use crate::dns::transport::{self, TransportResponse};
use async_trait::async_trait;
use hickory_proto::op::Message;
use std::time::{Duration, Instant};
use steer_dns_application::ports::{UpstreamForwarder, UpstreamResponse};
use steer_dns_domain::{DomainError, Upstream, UpstreamTransport};
use tracing::debug;

/// Sends client queries to upstream servers over the network.
///
/// A UDP answer with the TC bit set is retried over TCP against the same
/// server within whatever remains of the attempt's deadline.
#[derive(Debug, Default, Clone, Copy)]
pub struct NetworkForwarder;

impl NetworkForwarder {
    pub fn new() -> Self {
        Self
    }

    async fn exchange(
        &self,
        query_bytes: &[u8],
        query_id: u16,
        upstream: &Upstream,
        timeout: Duration,
    ) -> Result<(Message, Vec<u8>), DomainError> {
        let dns_transport = transport::create_transport(upstream);
        let TransportResponse {
            bytes,
            protocol_used,
        } = dns_transport.send(query_bytes, timeout).await?;

        let message = decode_response(&bytes, query_id, upstream)?;
        debug!(
            server = %upstream.addr,
            protocol = protocol_used,
            answers = message.answers().len(),
            "Upstream response decoded"
        );
        Ok((message, bytes))
    }
}

#[async_trait]
impl UpstreamForwarder for NetworkForwarder {
    async fn forward(
        &self,
        query: &Message,
        upstream: &Upstream,
        timeout: Duration,
    ) -> Result<UpstreamResponse, DomainError> {
        let start = Instant::now();
        let query_bytes = query
            .to_vec()
            .map_err(|e| DomainError::MalformedMessage(format!("cannot encode query: {}", e)))?;

        let (mut message, mut bytes) = self
            .exchange(&query_bytes, query.id(), upstream, timeout)
            .await?;

        if message.truncated() && upstream.transport == UpstreamTransport::Udp {
            debug!(server = %upstream.addr, "Response truncated (TC bit), retrying via TCP");

            let remaining = timeout
                .checked_sub(start.elapsed())
                .ok_or_else(|| DomainError::timeout(upstream.addr))?;
            let tcp_upstream = upstream.with_transport(UpstreamTransport::Tcp);
            (message, bytes) = self
                .exchange(&query_bytes, query.id(), &tcp_upstream, remaining)
                .await?;
        }

        Ok(UpstreamResponse {
            message,
            bytes,
            upstream: *upstream,
        })
    }
}

fn decode_response(bytes: &[u8], query_id: u16, upstream: &Upstream) -> Result<Message, DomainError> {
    let message = Message::from_vec(bytes).map_err(|e| {
        DomainError::MalformedMessage(format!("response from {}: {}", upstream.addr, e))
    })?;

    if message.id() != query_id {
        return Err(DomainError::transport(
            upstream.addr,
            format!("response id {} does not match query id {}", message.id(), query_id),
        ));
    }

    Ok(message)
}
