use async_trait::async_trait;
use hickory_proto::op::Message;
use hickory_proto::rr::Record;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use steer_dns_application::ports::{ReplacementStore, UpstreamForwarder, UpstreamResponse};
use steer_dns_domain::{DomainError, RecordType, ReplacementAnswer, Upstream};

use super::build_response;

#[derive(Clone)]
pub enum UpstreamBehavior {
    AlwaysFail,
    AlwaysTimeout,
    /// Fails this many times, then answers.
    FailThenAnswer(usize, Vec<Record>),
    Answer(Vec<Record>),
}

/// Scripted forwarder keyed by upstream address. Unknown upstreams fail.
pub struct MockForwarder {
    behaviors: Mutex<HashMap<SocketAddr, UpstreamBehavior>>,
    failures_so_far: Mutex<HashMap<SocketAddr, usize>>,
    calls: Mutex<Vec<Upstream>>,
}

impl MockForwarder {
    pub fn new() -> Self {
        Self {
            behaviors: Mutex::new(HashMap::new()),
            failures_so_far: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(self, upstream: &Upstream, behavior: UpstreamBehavior) -> Self {
        self.behaviors
            .lock()
            .unwrap()
            .insert(upstream.addr, behavior);
        self
    }

    pub fn calls(&self) -> Vec<Upstream> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl UpstreamForwarder for MockForwarder {
    async fn forward(
        &self,
        query: &Message,
        upstream: &Upstream,
        _timeout: Duration,
    ) -> Result<UpstreamResponse, DomainError> {
        self.calls.lock().unwrap().push(*upstream);

        let behavior = self.behaviors.lock().unwrap().get(&upstream.addr).cloned();
        let answers = match behavior {
            Some(UpstreamBehavior::Answer(answers)) => answers,
            Some(UpstreamBehavior::FailThenAnswer(n, answers)) => {
                let mut failures = self.failures_so_far.lock().unwrap();
                let seen = failures.entry(upstream.addr).or_insert(0);
                if *seen < n {
                    *seen += 1;
                    return Err(DomainError::transport(upstream.addr, "connection refused"));
                }
                answers
            }
            Some(UpstreamBehavior::AlwaysTimeout) => {
                return Err(DomainError::timeout(upstream.addr));
            }
            Some(UpstreamBehavior::AlwaysFail) | None => {
                return Err(DomainError::transport(upstream.addr, "connection refused"));
            }
        };

        let message = build_response(query, answers);
        let bytes = message.to_vec().unwrap();
        Ok(UpstreamResponse {
            message,
            bytes,
            upstream: *upstream,
        })
    }
}

/// In-memory replacement store with switchable persistence failure.
pub struct MockReplacementStore {
    entries: Mutex<HashMap<(RecordType, String), Vec<ReplacementAnswer>>>,
    fail_persist: bool,
    lookups: AtomicUsize,
    writes: AtomicUsize,
}

impl MockReplacementStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            fail_persist: false,
            lookups: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_persist: true,
            ..Self::new()
        }
    }

    pub fn get(&self, record_type: RecordType, name: &str) -> Option<Vec<ReplacementAnswer>> {
        self.entries
            .lock()
            .unwrap()
            .get(&(record_type, name.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn persist(&self) -> Result<(), DomainError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_persist {
            return Err(DomainError::CacheStoreFailure("disk full".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReplacementStore for MockReplacementStore {
    async fn lookup(&self, record_type: RecordType, name: &str) -> Option<Vec<ReplacementAnswer>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.get(record_type, name)
    }

    async fn store(
        &self,
        record_type: RecordType,
        name: &str,
        answers: Vec<ReplacementAnswer>,
    ) -> Result<(), DomainError> {
        self.entries
            .lock()
            .unwrap()
            .insert((record_type, name.to_string()), answers);
        self.persist()
    }

    async fn store_if_absent(
        &self,
        record_type: RecordType,
        name: &str,
        answers: Vec<ReplacementAnswer>,
    ) -> Result<Option<Vec<ReplacementAnswer>>, DomainError> {
        {
            let mut entries = self.entries.lock().unwrap();
            let key = (record_type, name.to_string());
            if let Some(existing) = entries.get(&key) {
                return Ok(Some(existing.clone()));
            }
            entries.insert(key, answers);
        }
        self.persist().map(|_| None)
    }
}
