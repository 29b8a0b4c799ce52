pub mod dns;

pub use dns::{
    HandleDnsQueryUseCase, RelayResponse, ResolveUpstreamUseCase, RewriteAnswersUseCase,
    RewriteDecision, RewriteOutcome, RewriteRules,
};
