use async_trait::async_trait;
use hickory_proto::op::Message;
use std::time::Duration;
use steer_dns_domain::{DomainError, Upstream};

/// A decoded upstream answer together with the exact bytes it arrived as.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub message: Message,
    pub bytes: Vec<u8>,
    pub upstream: Upstream,
}

#[async_trait]
pub trait UpstreamForwarder: Send + Sync {
    /// One attempt against one upstream. Either a response or a failure, never both;
    /// the attempt owns its socket and releases it on every path.
    async fn forward(
        &self,
        query: &Message,
        upstream: &Upstream,
        timeout: Duration,
    ) -> Result<UpstreamResponse, DomainError>;
}
