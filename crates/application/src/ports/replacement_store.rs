use async_trait::async_trait;
use steer_dns_domain::{DomainError, RecordType, ReplacementAnswer};

/// Durable (record type, queried name) → replacement answers mapping.
///
/// Entries never expire. Implementations serialize writers so the persisted
/// document is never interleaved.
#[async_trait]
pub trait ReplacementStore: Send + Sync {
    async fn lookup(&self, record_type: RecordType, name: &str) -> Option<Vec<ReplacementAnswer>>;

    /// Inserts or overwrites the entry and persists before returning.
    ///
    /// On `CacheStoreFailure` the in-memory entry is still updated.
    async fn store(
        &self,
        record_type: RecordType,
        name: &str,
        answers: Vec<ReplacementAnswer>,
    ) -> Result<(), DomainError>;

    /// Inserts only when no entry exists yet.
    ///
    /// Returns `Ok(None)` when `answers` won, `Ok(Some(existing))` when another
    /// writer got there first.
    async fn store_if_absent(
        &self,
        record_type: RecordType,
        name: &str,
        answers: Vec<ReplacementAnswer>,
    ) -> Result<Option<Vec<ReplacementAnswer>>, DomainError>;
}
