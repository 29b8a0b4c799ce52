use crate::ports::ReplacementStore;
use hickory_proto::op::Message;
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{Name, RData, Record};
use std::net::IpAddr;
use std::sync::Arc;
use steer_dns_domain::{
    CandidatePool, IpRangeSet, RecordType, ReplacementAnswer, DEFAULT_REPLACEMENT_COUNT,
    REPLACEMENT_TTL,
};
use tracing::{debug, error, info};

/// CDN ranges and candidate pools, loaded once at startup.
#[derive(Debug, Clone)]
pub struct RewriteRules {
    pub cdn_ipv4: IpRangeSet,
    pub cdn_ipv6: IpRangeSet,
    pub candidates_ipv4: CandidatePool,
    pub candidates_ipv6: CandidatePool,
    pub replacement_count: usize,
    pub replacement_ttl: u32,
}

impl RewriteRules {
    pub fn new(
        cdn_ipv4: IpRangeSet,
        cdn_ipv6: IpRangeSet,
        candidates_ipv4: CandidatePool,
        candidates_ipv6: CandidatePool,
    ) -> Self {
        Self {
            cdn_ipv4,
            cdn_ipv6,
            candidates_ipv4,
            candidates_ipv6,
            replacement_count: DEFAULT_REPLACEMENT_COUNT,
            replacement_ttl: REPLACEMENT_TTL,
        }
    }

    pub fn with_replacement_count(mut self, count: usize) -> Self {
        self.replacement_count = count;
        self
    }

    pub fn with_replacement_ttl(mut self, ttl: u32) -> Self {
        self.replacement_ttl = ttl;
        self
    }

    fn ranges(&self, record_type: RecordType) -> &IpRangeSet {
        match record_type {
            RecordType::AAAA => &self.cdn_ipv6,
            _ => &self.cdn_ipv4,
        }
    }

    fn candidates(&self, record_type: RecordType) -> &CandidatePool {
        match record_type {
            RecordType::AAAA => &self.candidates_ipv6,
            _ => &self.candidates_ipv4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteDecision {
    /// Nothing matched; the upstream response goes out as received.
    Untouched,
    /// Answers came from the replacement cache.
    CacheHit,
    /// Fresh replacements were selected from the candidate pool.
    Replaced,
}

#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub decision: RewriteDecision,
    pub message: Message,
    /// What the upstream answered before substitution. Empty when untouched.
    pub original_answers: Vec<Record>,
}

impl RewriteOutcome {
    fn untouched(message: Message) -> Self {
        Self {
            decision: RewriteDecision::Untouched,
            message,
            original_answers: Vec::new(),
        }
    }

    pub fn is_rewritten(&self) -> bool {
        self.decision != RewriteDecision::Untouched
    }
}

pub struct RewriteAnswersUseCase {
    rules: Arc<RewriteRules>,
    store: Arc<dyn ReplacementStore>,
}

impl RewriteAnswersUseCase {
    pub fn new(rules: Arc<RewriteRules>, store: Arc<dyn ReplacementStore>) -> Self {
        Self { rules, store }
    }

    /// Only the first A/AAAA answer is considered. A cache entry for its type
    /// and the queried name short-circuits classification entirely.
    pub async fn execute(&self, mut response: Message) -> RewriteOutcome {
        let Some(owner) = response.queries().first().map(|q| q.name().clone()) else {
            return RewriteOutcome::untouched(response);
        };
        let Some((record_type, address)) = first_address_answer(response.answers()) else {
            return RewriteOutcome::untouched(response);
        };

        let domain = normalize_domain(&owner);

        let (decision, answers) = match self.store.lookup(record_type, &domain).await {
            Some(cached) => (RewriteDecision::CacheHit, cached),
            None => {
                if !self.rules.ranges(record_type).contains(address) {
                    debug!(domain = %domain, address = %address, "Answer outside CDN ranges");
                    return RewriteOutcome::untouched(response);
                }

                let picked = self
                    .rules
                    .candidates(record_type)
                    .select(self.rules.replacement_count, &mut fastrand::Rng::new());
                if picked.is_empty() {
                    return RewriteOutcome::untouched(response);
                }

                let display_name = owner.to_ascii();
                let fresh = ReplacementAnswer::from_addresses(
                    display_name.trim_end_matches('.'),
                    record_type,
                    &picked,
                    self.rules.replacement_ttl,
                );

                match self
                    .store
                    .store_if_absent(record_type, &domain, fresh.clone())
                    .await
                {
                    Ok(None) => (RewriteDecision::Replaced, fresh),
                    Ok(Some(existing)) => (RewriteDecision::CacheHit, existing),
                    Err(e) => {
                        error!(domain = %domain, error = %e, "Replacement not persisted, serving it anyway");
                        (RewriteDecision::Replaced, fresh)
                    }
                }
            }
        };

        let records: Vec<Record> = answers.iter().map(|a| to_record(&owner, a)).collect();
        let replaced: Vec<String> = answers.iter().map(|a| a.data.to_string()).collect();

        match decision {
            RewriteDecision::Replaced => {
                info!(domain = %domain, record_type = %record_type, upstream = %address, replaced = ?replaced, "Saving replacement")
            }
            _ => {
                info!(domain = %domain, record_type = %record_type, replaced = ?replaced, "Replacement cache hit")
            }
        }

        let original_answers = response.take_answers();
        response.insert_answers(records);

        RewriteOutcome {
            decision,
            message: response,
            original_answers,
        }
    }
}

/// Cache key for a queried name: lowercase, without the trailing root dot.
pub fn normalize_domain(name: &Name) -> String {
    name.to_ascii().trim_end_matches('.').to_ascii_lowercase()
}

fn first_address_answer(answers: &[Record]) -> Option<(RecordType, IpAddr)> {
    answers.iter().find_map(|record| {
        let record_type =
            RecordType::from_u16(u16::from(record.record_type())).filter(RecordType::is_rewritable)?;
        match record.data() {
            RData::A(a) => Some((record_type, IpAddr::V4(a.0))),
            RData::AAAA(aaaa) => Some((record_type, IpAddr::V6(aaaa.0))),
            _ => None,
        }
    })
}

fn to_record(owner: &Name, answer: &ReplacementAnswer) -> Record {
    let rdata = match answer.data {
        IpAddr::V4(v4) => RData::A(A(v4)),
        IpAddr::V6(v6) => RData::AAAA(AAAA(v6)),
    };
    Record::from_rdata(owner.clone(), answer.ttl, rdata)
}
