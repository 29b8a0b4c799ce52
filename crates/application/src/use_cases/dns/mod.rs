mod failover;
mod handle_dns_query;
mod rewrite;

pub use failover::ResolveUpstreamUseCase;
pub use handle_dns_query::{HandleDnsQueryUseCase, RelayResponse};
pub use rewrite::{
    normalize_domain, RewriteAnswersUseCase, RewriteDecision, RewriteOutcome, RewriteRules,
};
