use super::failover::ResolveUpstreamUseCase;
use super::rewrite::{RewriteAnswersUseCase, RewriteDecision, RewriteOutcome};
use crate::ports::UpstreamResponse;
use hickory_proto::op::Message;
use std::sync::Arc;
use std::time::Instant;
use steer_dns_domain::{DomainError, Upstream};
use tracing::debug;

/// What goes back to the client.
#[derive(Debug, Clone)]
pub enum RelayResponse {
    /// Upstream bytes, relayed unmodified.
    Passthrough { bytes: Vec<u8>, upstream: Upstream },
    /// Answers were substituted; the message must be re-encoded.
    Rewritten {
        outcome: RewriteOutcome,
        upstream: Upstream,
    },
}

impl RelayResponse {
    pub fn upstream(&self) -> &Upstream {
        match self {
            RelayResponse::Passthrough { upstream, .. } => upstream,
            RelayResponse::Rewritten { upstream, .. } => upstream,
        }
    }
}

/// Failover resolution followed by answer rewriting, shared by both listeners.
pub struct HandleDnsQueryUseCase {
    resolver: Arc<ResolveUpstreamUseCase>,
    rewriter: Arc<RewriteAnswersUseCase>,
}

impl HandleDnsQueryUseCase {
    pub fn new(resolver: Arc<ResolveUpstreamUseCase>, rewriter: Arc<RewriteAnswersUseCase>) -> Self {
        Self { resolver, rewriter }
    }

    pub async fn execute(&self, query: &Message) -> Result<RelayResponse, DomainError> {
        let start = Instant::now();

        let UpstreamResponse {
            message,
            bytes,
            upstream,
        } = self.resolver.execute(query).await?;

        let outcome = self.rewriter.execute(message).await;

        debug!(
            id = query.id(),
            upstream = %upstream,
            decision = ?outcome.decision,
            elapsed_us = start.elapsed().as_micros() as u64,
            "Query relayed"
        );

        if outcome.decision == RewriteDecision::Untouched {
            return Ok(RelayResponse::Passthrough { bytes, upstream });
        }
        Ok(RelayResponse::Rewritten { outcome, upstream })
    }
}
