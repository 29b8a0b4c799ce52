//! TCP transport for upstream queries (RFC 1035 §4.2.2)
//!
//! A fresh connection per attempt; every message carries a two-byte
//! big-endian length prefix.

use super::{DnsTransport, TransportResponse};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use steer_dns_domain::DomainError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    async fn exchange(&self, message_bytes: &[u8]) -> Result<Vec<u8>, DomainError> {
        let mut stream = TcpStream::connect(self.server_addr)
            .await
            .map_err(|e| DomainError::transport(self.server_addr, format!("connect failed: {}", e)))?;

        stream
            .set_nodelay(true)
            .map_err(|e| DomainError::transport(self.server_addr, e))?;

        send_with_length_prefix(&mut stream, message_bytes)
            .await
            .map_err(|e| DomainError::transport(self.server_addr, e))?;

        debug!(server = %self.server_addr, message_len = message_bytes.len(), "TCP query sent");

        let response = read_with_length_prefix(&mut stream)
            .await
            .map_err(|e| DomainError::transport(self.server_addr, e))?
            .ok_or_else(|| {
                DomainError::transport(self.server_addr, "connection closed before response")
            })?;

        debug!(server = %self.server_addr, response_len = response.len(), "TCP response received");

        Ok(response)
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        timeout: Duration,
    ) -> Result<TransportResponse, DomainError> {
        let bytes = tokio::time::timeout(timeout, self.exchange(message_bytes))
            .await
            .map_err(|_| DomainError::timeout(self.server_addr))??;

        Ok(TransportResponse {
            bytes,
            protocol_used: self.protocol_name(),
        })
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}

/// Writes one length-prefixed DNS message.
pub async fn send_with_length_prefix<S>(stream: &mut S, message_bytes: &[u8]) -> std::io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("message too large: {} bytes", message_bytes.len()),
        )
    })?;

    let mut framed = Vec::with_capacity(2 + message_bytes.len());
    framed.extend_from_slice(&length.to_be_bytes());
    framed.extend_from_slice(message_bytes);

    stream.write_all(&framed).await?;
    stream.flush().await
}

/// Reads one length-prefixed DNS message.
///
/// `Ok(None)` means the peer closed the connection cleanly between messages.
pub async fn read_with_length_prefix<S>(stream: &mut S) -> std::io::Result<Option<Vec<u8>>>
where
    S: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 2];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let message_len = u16::from_be_bytes(len_buf) as usize;
    let mut message = vec![0u8; message_len];
    stream.read_exact(&mut message).await?;

    Ok(Some(message))
}
