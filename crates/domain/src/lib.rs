//! Steer DNS Domain Layer
pub mod candidate_pool;
pub mod config;
pub mod dns_record;
pub mod errors;
pub mod ip_range;
pub mod replacement;
pub mod upstream;

pub use candidate_pool::{CandidatePool, DEFAULT_REPLACEMENT_COUNT};
pub use config::{CliOverrides, Config};
pub use dns_record::RecordType;
pub use errors::DomainError;
pub use ip_range::{AddressFamily, IpRangeEntry, IpRangeSet};
pub use replacement::{
    CacheEntry, DnsClass, ReplacementAnswer, ReplacementDocument, REPLACEMENT_TTL,
};
pub use upstream::{Upstream, UpstreamTransport, DEFAULT_DNS_PORT};
