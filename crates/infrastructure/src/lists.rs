//! Line-oriented list files: upstream servers, CDN ranges and candidate pools.
//!
//! Blank lines and `#` comments are skipped. Bad entries are logged and
//! dropped; a list that ends up empty is an error.

use std::fmt::Display;
use std::path::Path;
use steer_dns_domain::candidate_pool::parse_candidate;
use steer_dns_domain::{
    AddressFamily, CandidatePool, DomainError, IpRangeEntry, IpRangeSet, Upstream,
    UpstreamTransport,
};
use tracing::{info, warn};

/// Reads the non-comment, non-blank lines of `path`, trimmed.
pub fn read_list_file(path: &Path) -> Result<Vec<String>, DomainError> {
    let contents = std::fs::read_to_string(path).map_err(|e| DomainError::ListFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(list_entries(&contents))
}

pub fn list_entries(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn parse_entries<T, E, F>(path: &Path, kind: &str, parse: F) -> Result<Vec<T>, DomainError>
where
    F: Fn(&str) -> Result<T, E>,
    E: Display,
{
    let mut parsed = Vec::new();
    for entry in read_list_file(path)? {
        match parse(&entry) {
            Ok(value) => parsed.push(value),
            Err(e) => warn!(path = %path.display(), entry = %entry, error = %e, "Skipping invalid {} entry", kind),
        }
    }

    if parsed.is_empty() {
        return Err(DomainError::ListFile {
            path: path.display().to_string(),
            reason: format!("no valid {} entries", kind),
        });
    }

    info!(path = %path.display(), count = parsed.len(), "Loaded {} list", kind);
    Ok(parsed)
}

/// Upstream servers in failover order.
pub fn load_upstreams(
    path: &Path,
    default_transport: UpstreamTransport,
    default_port: u16,
) -> Result<Vec<Upstream>, DomainError> {
    parse_entries(path, "upstream", |entry| {
        Upstream::parse_with_defaults(entry, default_transport, default_port)
    })
}

pub fn load_range_set(path: &Path, family: AddressFamily) -> Result<IpRangeSet, DomainError> {
    let entries = parse_entries(path, "CDN range", |entry| IpRangeEntry::parse(entry, family))?;
    Ok(IpRangeSet::new(family, entries))
}

pub fn load_candidate_pool(
    path: &Path,
    family: AddressFamily,
) -> Result<CandidatePool, DomainError> {
    let addresses = parse_entries(path, "candidate", |entry| parse_candidate(entry, family))?;
    CandidatePool::new(family, addresses)
}
