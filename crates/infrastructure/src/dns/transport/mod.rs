pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use std::time::Duration;
use steer_dns_domain::{DomainError, Upstream, UpstreamTransport};

#[derive(Debug)]
pub struct TransportResponse {
    pub bytes: Vec<u8>,

    pub protocol_used: &'static str,
}

#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Sends one encoded message and waits for one reply, all within `timeout`.
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError>;

    fn protocol_name(&self) -> &'static str;
}

pub enum Transport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
}

impl Transport {
    pub async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::send(t, message_bytes, timeout).await,
            Self::Tcp(t) => DnsTransport::send(t, message_bytes, timeout).await,
        }
    }
}

pub fn create_transport(upstream: &Upstream) -> Transport {
    match upstream.transport {
        UpstreamTransport::Udp => Transport::Udp(udp::UdpTransport::new(upstream.addr)),
        UpstreamTransport::Tcp => Transport::Tcp(tcp::TcpTransport::new(upstream.addr)),
    }
}
