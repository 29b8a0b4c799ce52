use std::path::Path;
use std::sync::Arc;
use steer_dns_application::use_cases::{
    HandleDnsQueryUseCase, ResolveUpstreamUseCase, RewriteAnswersUseCase, RewriteRules,
};
use steer_dns_domain::{AddressFamily, Config};
use steer_dns_infrastructure::dns::NetworkForwarder;
use steer_dns_infrastructure::lists::{load_candidate_pool, load_range_set, load_upstreams};
use steer_dns_infrastructure::repositories::JsonReplacementCache;
use tracing::info;

pub struct DnsServices {
    pub handler_use_case: Arc<HandleDnsQueryUseCase>,
}

impl DnsServices {
    /// Loads every list file and the replacement cache. Any failure is fatal.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        info!("Initializing DNS services");

        let upstreams = load_upstreams(
            Path::new(&config.upstream.servers_file),
            config.upstream.transport,
            config.upstream.port,
        )?;
        info!(
            upstreams = ?upstreams.iter().map(ToString::to_string).collect::<Vec<_>>(),
            retry_count = config.upstream.retry_count,
            timeout_ms = config.upstream.query_timeout_ms,
            "Upstream failover order"
        );

        let rules = Arc::new(Self::build_rewrite_rules(config)?);
        let replacement_cache = Arc::new(JsonReplacementCache::open(&config.cache.path)?);

        let resolver = Arc::new(ResolveUpstreamUseCase::new(
            Arc::new(NetworkForwarder::new()),
            upstreams,
            config.upstream.retry_count,
            config.upstream.query_timeout(),
        ));
        let rewriter = Arc::new(RewriteAnswersUseCase::new(rules, replacement_cache));

        Ok(Self {
            handler_use_case: Arc::new(HandleDnsQueryUseCase::new(resolver, rewriter)),
        })
    }

    fn build_rewrite_rules(config: &Config) -> anyhow::Result<RewriteRules> {
        let lists = &config.lists;
        let rules = RewriteRules::new(
            load_range_set(Path::new(&lists.cdn_ipv4), AddressFamily::V4)?,
            load_range_set(Path::new(&lists.cdn_ipv6), AddressFamily::V6)?,
            load_candidate_pool(Path::new(&lists.candidates_ipv4), AddressFamily::V4)?,
            load_candidate_pool(Path::new(&lists.candidates_ipv6), AddressFamily::V6)?,
        )
        .with_replacement_count(config.rewrite.replacement_count)
        .with_replacement_ttl(config.rewrite.replacement_ttl);

        info!(
            cdn_ipv4 = rules.cdn_ipv4.len(),
            cdn_ipv6 = rules.cdn_ipv6.len(),
            candidates_ipv4 = rules.candidates_ipv4.len(),
            candidates_ipv6 = rules.candidates_ipv6.len(),
            replacement_count = rules.replacement_count,
            "Rewrite rules loaded"
        );

        Ok(rules)
    }
}
