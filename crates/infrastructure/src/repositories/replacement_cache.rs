use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use steer_dns_application::ports::ReplacementStore;
use steer_dns_domain::{CacheEntry, DomainError, RecordType, ReplacementAnswer, ReplacementDocument};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Replacement cache backed by a single pretty-printed JSON document.
///
/// Reads are served from memory. Every write rewrites the whole file through a
/// temporary sibling and a rename, one writer at a time.
pub struct JsonReplacementCache {
    path: PathBuf,
    document: RwLock<ReplacementDocument>,
    write_gate: Mutex<()>,
}

impl JsonReplacementCache {
    /// Loads `path`, treating a missing or empty file as an empty cache.
    ///
    /// A file that exists but does not parse is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        let document = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => ReplacementDocument::default(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                DomainError::CacheStoreFailure(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ReplacementDocument::default(),
            Err(e) => {
                return Err(DomainError::CacheStoreFailure(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        };

        info!(
            path = %path.display(),
            a = document.a.len(),
            aaaa = document.aaaa.len(),
            "Replacement cache loaded"
        );

        Ok(Self {
            path,
            document: RwLock::new(document),
            write_gate: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.document.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.document.read().await.is_empty()
    }

    /// Caller must hold `write_gate`.
    async fn insert_and_persist(
        &self,
        record_type: RecordType,
        name: &str,
        answers: Vec<ReplacementAnswer>,
    ) -> Result<(), DomainError> {
        let snapshot = {
            let mut document = self.document.write().await;
            let bucket = document.bucket_mut(record_type).ok_or_else(|| {
                DomainError::CacheStoreFailure(format!("{} answers are not cached", record_type))
            })?;
            bucket.insert(
                name.to_string(),
                CacheEntry {
                    answers,
                    timestamp: chrono::Utc::now().timestamp(),
                },
            );
            document.clone()
        };

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_document(&path, &snapshot))
            .await
            .map_err(|e| DomainError::CacheStoreFailure(e.to_string()))??;

        debug!(path = %self.path.display(), domain = name, record_type = %record_type, "Replacement cache persisted");
        Ok(())
    }
}

#[async_trait]
impl ReplacementStore for JsonReplacementCache {
    async fn lookup(&self, record_type: RecordType, name: &str) -> Option<Vec<ReplacementAnswer>> {
        self.document
            .read()
            .await
            .get(record_type, name)
            .map(|entry| entry.answers.clone())
    }

    async fn store(
        &self,
        record_type: RecordType,
        name: &str,
        answers: Vec<ReplacementAnswer>,
    ) -> Result<(), DomainError> {
        let _gate = self.write_gate.lock().await;
        self.insert_and_persist(record_type, name, answers).await
    }

    async fn store_if_absent(
        &self,
        record_type: RecordType,
        name: &str,
        answers: Vec<ReplacementAnswer>,
    ) -> Result<Option<Vec<ReplacementAnswer>>, DomainError> {
        let _gate = self.write_gate.lock().await;
        if let Some(existing) = self.lookup(record_type, name).await {
            return Ok(Some(existing));
        }
        self.insert_and_persist(record_type, name, answers).await?;
        Ok(None)
    }
}

fn write_document(path: &Path, document: &ReplacementDocument) -> Result<(), DomainError> {
    let failure =
        |e: &dyn std::fmt::Display| DomainError::CacheStoreFailure(format!("{}: {}", path.display(), e));

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| failure(&e))?;

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| failure(&e))?;
    serde_json::to_writer_pretty(&mut file, document).map_err(|e| failure(&e))?;
    file.write_all(b"\n").map_err(|e| failure(&e))?;
    file.flush().map_err(|e| failure(&e))?;
    file.as_file().sync_all().map_err(|e| failure(&e))?;
    file.persist(path).map_err(|e| failure(&e.error))?;
    sync_dir(dir).map_err(|e| failure(&e))?;

    Ok(())
}

/// Makes the rename itself durable.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
