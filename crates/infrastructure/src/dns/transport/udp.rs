//! UDP transport for upstream queries (RFC 1035 §4.2.1)
//!
//! One ephemeral socket per attempt, connected to the upstream so the kernel
//! discards datagrams from anyone else. Exactly one datagram is read.

use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use steer_dns_domain::DomainError;
use tokio::net::UdpSocket;
use tracing::debug;

/// Maximum UDP DNS response size with EDNS(0)
pub const MAX_UDP_RESPONSE_SIZE: usize = 4096;

pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn bind_addr(&self) -> SocketAddr {
        if self.server_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        }
    }

    async fn exchange(&self, message_bytes: &[u8]) -> Result<Vec<u8>, DomainError> {
        let socket = UdpSocket::bind(self.bind_addr())
            .await
            .map_err(|e| DomainError::transport(self.server_addr, format!("bind failed: {}", e)))?;

        socket
            .connect(self.server_addr)
            .await
            .map_err(|e| DomainError::transport(self.server_addr, e))?;

        let bytes_sent = socket
            .send(message_bytes)
            .await
            .map_err(|e| DomainError::transport(self.server_addr, e))?;

        debug!(server = %self.server_addr, bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let bytes_received = socket
            .recv(&mut recv_buf)
            .await
            .map_err(|e| DomainError::transport(self.server_addr, e))?;

        recv_buf.truncate(bytes_received);

        debug!(server = %self.server_addr, bytes_received, "UDP response received");

        Ok(recv_buf)
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        // The socket lives inside `exchange`, so it is dropped on every path,
        // including when the deadline cancels the future.
        let bytes = tokio::time::timeout(timeout, self.exchange(message_bytes))
            .await
            .map_err(|_| DomainError::timeout(self.server_addr))??;

        Ok(TransportResponse {
            bytes,
            protocol_used: self.protocol_name(),
        })
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}
