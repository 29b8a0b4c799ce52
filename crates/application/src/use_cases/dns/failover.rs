use crate::ports::{UpstreamForwarder, UpstreamResponse};
use hickory_proto::op::Message;
use std::sync::Arc;
use std::time::Duration;
use steer_dns_domain::{DomainError, Upstream};
use tracing::{debug, warn};

/// Walks the upstream list in priority order, retrying each upstream before
/// moving on. The first response wins.
pub struct ResolveUpstreamUseCase {
    forwarder: Arc<dyn UpstreamForwarder>,
    upstreams: Arc<[Upstream]>,
    retry_count: u32,
    timeout: Duration,
}

impl ResolveUpstreamUseCase {
    pub fn new(
        forwarder: Arc<dyn UpstreamForwarder>,
        upstreams: Vec<Upstream>,
        retry_count: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            forwarder,
            upstreams: upstreams.into(),
            retry_count,
            timeout,
        }
    }

    pub async fn execute(&self, query: &Message) -> Result<UpstreamResponse, DomainError> {
        let mut attempts = 0usize;
        let mut last_error: Option<DomainError> = None;

        for (position, upstream) in self.upstreams.iter().enumerate() {
            for attempt in 0..=self.retry_count {
                if attempt > 0 {
                    debug!(upstream = %upstream, retry = attempt, of = self.retry_count, "Retrying upstream");
                }
                attempts += 1;

                match self.forwarder.forward(query, upstream, self.timeout).await {
                    Ok(response) => {
                        debug!(upstream = %upstream, position, attempt, "Upstream responded");
                        return Ok(response);
                    }
                    Err(e) => {
                        warn!(upstream = %upstream, position, attempt, error = %e, "Upstream attempt failed");
                        last_error = Some(e);
                    }
                }
            }
        }

        Err(DomainError::AllUpstreamsExhausted {
            attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no upstream servers configured".to_string()),
        })
    }
}
